use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::config::CaptchaConfig;

#[derive(Debug, Error)]
pub enum CaptchaError {
    #[error("{}", .0.join(", "))]
    Rejected(Vec<String>),

    #[error("{0}")]
    Request(String),
}

#[async_trait]
pub trait CaptchaVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<(), CaptchaError>;
}

#[derive(Debug, Deserialize)]
struct SiteVerifyResponse {
    success: bool,
    #[serde(rename = "error-codes", default)]
    error_codes: Vec<String>,
}

/// Google reCAPTCHA `siteverify` client
pub struct RecaptchaVerifier {
    client: reqwest::Client,
    verify_url: String,
    secret: String,
}

impl RecaptchaVerifier {
    pub fn new(config: &CaptchaConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            verify_url: config.verify_url.clone(),
            secret: config.secret.clone(),
        }
    }
}

#[async_trait]
impl CaptchaVerifier for RecaptchaVerifier {
    async fn verify(&self, token: &str) -> Result<(), CaptchaError> {
        let response = self
            .client
            .post(&self.verify_url)
            .form(&[("secret", self.secret.as_str()), ("response", token)])
            .send()
            .await
            .map_err(|e| CaptchaError::Request(e.to_string()))?
            .json::<SiteVerifyResponse>()
            .await
            .map_err(|e| CaptchaError::Request(e.to_string()))?;

        if response.success {
            Ok(())
        } else if response.error_codes.is_empty() {
            Err(CaptchaError::Rejected(vec!["invalid-input-response".to_string()]))
        } else {
            Err(CaptchaError::Rejected(response.error_codes))
        }
    }
}
