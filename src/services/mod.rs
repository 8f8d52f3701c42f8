pub mod captcha;
pub mod file_storage;
pub mod geoip;
pub mod mailer;
pub mod templates;

pub use captcha::{CaptchaError, CaptchaVerifier, RecaptchaVerifier};
pub use file_storage::{FileStorage, FileStorageError, HttpFileStorage};
pub use geoip::{GeoError, GeoLocator, MaxMindLocator};
pub use mailer::{EmailMessage, LogMailer, Mailer, MailerError, SmtpMailer};
