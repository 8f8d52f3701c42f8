use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::config::IpCheckConfig;

#[derive(Debug, Error)]
pub enum GeoError {
    #[error("Geo lookup failed: {0}")]
    Request(String),

    #[error("Geo lookup rejected with status {0}")]
    Rejected(u16),
}

#[async_trait]
pub trait GeoLocator: Send + Sync {
    /// English country name for `ip`; `ip` may be `me` for the caller's address.
    async fn country(&self, ip: &str) -> Result<Option<String>, GeoError>;
}

/// MaxMind GeoIP2 Precision web service (country endpoint)
pub struct MaxMindLocator {
    client: reqwest::Client,
    url: String,
    username: String,
    password: String,
}

impl MaxMindLocator {
    pub fn new(config: &IpCheckConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: config.url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
        }
    }
}

#[async_trait]
impl GeoLocator for MaxMindLocator {
    async fn country(&self, ip: &str) -> Result<Option<String>, GeoError> {
        let response = self
            .client
            .get(format!("{}/{}", self.url, ip))
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await
            .map_err(|e| GeoError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GeoError::Rejected(response.status().as_u16()));
        }

        let body: Value = response.json().await.map_err(|e| GeoError::Request(e.to_string()))?;
        Ok(body.pointer("/country/names/en").and_then(Value::as_str).map(str::to_string))
    }
}
