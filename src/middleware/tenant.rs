use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{header::HOST, request::Parts},
};

use crate::state::AppState;

/// Tenant key taken from the `Host` header: lower-cased, port stripped.
#[derive(Debug, Clone, PartialEq)]
pub struct Tenant(pub String);

impl Tenant {
    pub fn from_host(host: Option<&str>, default_tenant: &str) -> Self {
        let name = host
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .map(|h| match h.rsplit_once(':') {
                Some((name, port)) if port.chars().all(|c| c.is_ascii_digit()) => name,
                _ => h,
            })
            .unwrap_or(default_tenant);
        Tenant(name.to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for Tenant {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let host = parts.headers.get(HOST).and_then(|h| h.to_str().ok());
        Ok(Tenant::from_host(host, &state.config.channel.default_tenant))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_normalisation() {
        assert_eq!(Tenant::from_host(Some("Sites.Example.COM:8080"), "localhost").as_str(), "sites.example.com");
        assert_eq!(Tenant::from_host(Some("example.com"), "localhost").as_str(), "example.com");
        assert_eq!(Tenant::from_host(None, "localhost").as_str(), "localhost");
    }
}
