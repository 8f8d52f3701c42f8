use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use crate::airtable::{AirtableClient, HttpAirtableClient};
use crate::config::AppConfig;
use crate::database::{DatabaseManager, PgRecordStore, RecordStore};
use crate::services::{
    CaptchaVerifier, FileStorage, GeoLocator, HttpFileStorage, LogMailer, Mailer, MaxMindLocator, RecaptchaVerifier,
    SmtpMailer,
};

/// Shared handler state. Every collaborator sits behind a trait object so the
/// router can run against fakes.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn RecordStore>,
    pub airtable: Arc<dyn AirtableClient>,
    pub mailer: Arc<dyn Mailer>,
    pub captcha: Arc<dyn CaptchaVerifier>,
    pub geo: Arc<dyn GeoLocator>,
    pub files: Arc<dyn FileStorage>,
}

impl AppState {
    /// Production wiring: Postgres pool plus HTTP collaborators from config.
    pub async fn connect(config: AppConfig) -> anyhow::Result<Self> {
        let pool = DatabaseManager::connect(&config.database)
            .await
            .context("connecting to database")?;
        Self::with_store(config, Arc::new(PgRecordStore::new(pool)))
    }

    /// HTTP collaborators from config over the given store.
    pub fn with_store(config: AppConfig, store: Arc<dyn RecordStore>) -> anyhow::Result<Self> {
        let airtable = HttpAirtableClient::new(&config.airtable).context("configuring Airtable client")?;

        let mailer: Arc<dyn Mailer> = if config.smtp.host.is_some() {
            Arc::new(SmtpMailer::from_config(&config.smtp).context("configuring SMTP")?)
        } else {
            warn!("SMTP_HOST not set, outgoing email will only be logged");
            Arc::new(LogMailer)
        };

        info!("Collaborators configured for {:?}", config.environment);
        Ok(Self {
            airtable: Arc::new(airtable),
            mailer,
            captcha: Arc::new(RecaptchaVerifier::new(&config.captcha)),
            geo: Arc::new(MaxMindLocator::new(&config.ipcheck)),
            files: Arc::new(HttpFileStorage::new(&config.files)),
            store,
            config: Arc::new(config),
        })
    }
}
