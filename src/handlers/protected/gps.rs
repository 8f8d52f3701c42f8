// handlers/protected/gps.rs - GET /api/gps

use axum::{
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::state::AppState;

/// Resolves the caller's country. The body is always empty; the English
/// country name, when known, travels in the `x-country` header.
pub async fn gps(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let ip = client_ip(&headers);
    let mut response = StatusCode::OK.into_response();

    match state.geo.country(&ip).await {
        Ok(Some(country)) => match HeaderValue::from_str(&country) {
            Ok(value) => {
                response.headers_mut().insert("x-country", value);
            }
            Err(_) => warn!("Country name {:?} is not a valid header value", country),
        },
        Ok(None) => warn!("No country known for {}", ip),
        Err(e) => warn!("Geo lookup for {} failed: {}", ip, e),
    }
    response
}

fn client_ip(headers: &HeaderMap) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };
    header("x-forwarded-for")
        .and_then(|list| list.split(',').next().map(|ip| ip.trim().to_string()))
        .filter(|ip| !ip.is_empty())
        .or_else(|| header("x-real-ip"))
        .unwrap_or_else(|| "me".to_string())
}
