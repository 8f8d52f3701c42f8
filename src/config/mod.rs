use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub channel: ChannelConfig,
    pub airtable: AirtableConfig,
    pub captcha: CaptchaConfig,
    pub ipcheck: IpCheckConfig,
    pub files: FileServiceConfig,
    pub smtp: SmtpConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub cors_origins: Vec<String>,
}

/// Defaults applied when onboarding channel users.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub admin_role_id: i64,
    pub user_role_id: i64,
    pub email_confirm_url: String,
    pub default_tenant: String,
    pub default_language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AirtableConfig {
    pub endpoint_url: String,
    pub api_key: String,
    pub base_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptchaConfig {
    pub verify_url: String,
    pub secret: String,
    /// Honour `passCaptcha` in registration bodies.
    pub allow_bypass: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpCheckConfig {
    pub url: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileServiceConfig {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub host: Option<String>,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server
        if let Ok(v) = env::var("HOST") {
            self.server.host = v;
        }
        if let Some(port) = env::var("FULCRUM_API_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.server.port = port;
        }

        // Database
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = v;
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Security
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }

        // Channel onboarding
        if let Ok(v) = env::var("DEFAULT_CHANNEL_ADMIN_ROLE") {
            self.channel.admin_role_id = v.parse().unwrap_or(self.channel.admin_role_id);
        }
        if let Ok(v) = env::var("DEFAULT_CHANNEL_USER_ROLE") {
            self.channel.user_role_id = v.parse().unwrap_or(self.channel.user_role_id);
        }
        if let Ok(v) = env::var("EMAIL_CONFIRM_URL_FRONTEND") {
            self.channel.email_confirm_url = v;
        }
        if let Ok(v) = env::var("DEFAULT_TENANT") {
            self.channel.default_tenant = v;
        }
        if let Ok(v) = env::var("DEFAULT_LANGUAGE") {
            self.channel.default_language = v;
        }

        // Airtable
        if let Ok(v) = env::var("AIRTABLE_ENDPOINT_URL") {
            self.airtable.endpoint_url = v;
        }
        if let Ok(v) = env::var("AIRTABLE_API_KEY") {
            self.airtable.api_key = v;
        }
        if let Ok(v) = env::var("AIRTABLE_DB_FINANCEADMIN") {
            self.airtable.base_id = v;
        }

        // Captcha
        if let Ok(v) = env::var("RECAPTCHA_VERIFY_URL") {
            self.captcha.verify_url = v;
        }
        if let Ok(v) = env::var("RECAPTCHA_SECRET") {
            self.captcha.secret = v;
        }
        if let Ok(v) = env::var("CAPTCHA_ALLOW_BYPASS") {
            self.captcha.allow_bypass = v.parse().unwrap_or(self.captcha.allow_bypass);
        }

        // IP check
        if let Ok(v) = env::var("IPCHECK_URL") {
            self.ipcheck.url = v;
        }
        if let Ok(v) = env::var("IPCHECK_USERNAME") {
            self.ipcheck.username = v;
        }
        if let Ok(v) = env::var("IPCHECK_PASSWORD") {
            self.ipcheck.password = v;
        }

        // File service
        if let Ok(v) = env::var("FILE_SERVICE_URL") {
            self.files.url = v;
        }

        // SMTP
        if let Ok(v) = env::var("SMTP_HOST") {
            self.smtp.host = Some(v);
        }
        if let Ok(v) = env::var("SMTP_PORT") {
            self.smtp.port = v.parse().unwrap_or(self.smtp.port);
        }
        if let Ok(v) = env::var("SMTP_USERNAME") {
            self.smtp.username = Some(v);
        }
        if let Ok(v) = env::var("SMTP_PASSWORD") {
            self.smtp.password = Some(v);
        }
        if let Ok(v) = env::var("SMTP_FROM") {
            self.smtp.from = v;
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig { host: "0.0.0.0".to_string(), port: 3000 },
            database: DatabaseConfig {
                url: "postgres://localhost:5432/fulcrum".to_string(),
                max_connections: 10,
                connection_timeout: 30,
            },
            security: SecurityConfig {
                jwt_secret: "development-secret".to_string(),
                jwt_expiry_hours: 24 * 7, // 1 week
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
            },
            channel: ChannelConfig::default(),
            airtable: AirtableConfig::default(),
            captcha: CaptchaConfig { allow_bypass: true, ..CaptchaConfig::default() },
            ipcheck: IpCheckConfig::default(),
            files: FileServiceConfig { url: "http://localhost:4000/files".to_string() },
            smtp: SmtpConfig::default(),
        }
    }

    pub fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                max_connections: 20,
                connection_timeout: 10,
                ..Self::development().database
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
            captcha: CaptchaConfig::default(),
            ..Self::development()
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                max_connections: 50,
                connection_timeout: 5,
                ..Self::development().database
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                cors_origins: vec!["https://app.example.com".to_string()],
            },
            captcha: CaptchaConfig::default(),
            ..Self::development()
        }
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            admin_role_id: 1,
            user_role_id: 2,
            email_confirm_url: "http://localhost:5173/confirm".to_string(),
            default_tenant: "localhost".to_string(),
            default_language: "en".to_string(),
        }
    }
}

impl Default for AirtableConfig {
    fn default() -> Self {
        Self {
            endpoint_url: "https://api.airtable.com".to_string(),
            api_key: String::new(),
            base_id: String::new(),
        }
    }
}

impl Default for CaptchaConfig {
    fn default() -> Self {
        Self {
            verify_url: "https://www.google.com/recaptcha/api/siteverify".to_string(),
            secret: String::new(),
            allow_bypass: false,
        }
    }
}

impl Default for IpCheckConfig {
    fn default() -> Self {
        Self {
            url: "https://geoip.maxmind.com/geoip/v2.1/country".to_string(),
            username: String::new(),
            password: String::new(),
        }
    }
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: 587,
            username: None,
            password: None,
            from: "Fulcrum <no-reply@localhost>".to_string(),
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
