use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::config::FileServiceConfig;

#[derive(Debug, Error)]
pub enum FileStorageError {
    #[error("{0}")]
    Request(String),

    #[error("file service responded {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Removes stored objects behind `file` rows.
#[async_trait]
pub trait FileStorage: Send + Sync {
    async fn delete(&self, file_id: i64) -> Result<(), FileStorageError>;
}

pub struct HttpFileStorage {
    client: reqwest::Client,
    url: String,
}

impl HttpFileStorage {
    pub fn new(config: &FileServiceConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: config.url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl FileStorage for HttpFileStorage {
    async fn delete(&self, file_id: i64) -> Result<(), FileStorageError> {
        let response = self
            .client
            .delete(format!("{}/{}", self.url, file_id))
            .send()
            .await
            .map_err(|e| FileStorageError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FileStorageError::Rejected { status: status.as_u16(), body });
        }
        info!("Deleted file #{} from file service", file_id);
        Ok(())
    }
}
