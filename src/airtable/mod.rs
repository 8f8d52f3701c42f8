//! Bridge to the Airtable bases holding channel and project metadata.
//!
//! Lists come back as the raw JSON `records` value so callers decide what a
//! malformed answer means for their endpoint.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub mod http;

pub use http::HttpAirtableClient;

pub const CHANNEL_REPRESENTATIVE: &str = "Channel Representative";
pub const CHANNEL_LIST: &str = "Channel List";
pub const CHANNEL_AGREEMENTS: &str = "Channel Agreement - Projects";
pub const PROJECTS_SYNCED_VIEW: &str = "Projects Synced View";
pub const SALES_STATUS: &str = "Sales Status";
pub const LOCAL_PROJECTS: &str = "🌍 Local Projects";

#[derive(Debug, Error)]
pub enum AirtableError {
    #[error("{0}")]
    Request(String),

    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("{0}")]
    Decode(String),

    #[error("Airtable is not configured: {0}")]
    NotConfigured(&'static str),
}

impl From<reqwest::Error> for AirtableError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AirtableError::Decode(err.to_string())
        } else {
            AirtableError::Request(err.to_string())
        }
    }
}

/// Options for list calls, mapped onto Airtable's query parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AirtableQuery {
    pub filter_by_formula: Option<String>,
    pub view: Option<String>,
    pub fields: Vec<String>,
    pub page_size: Option<u32>,
    pub max_records: Option<u32>,
}

impl AirtableQuery {
    pub fn formula(formula: impl Into<String>) -> Self {
        Self { filter_by_formula: Some(formula.into()), ..Self::default() }
    }
}

#[async_trait]
pub trait AirtableClient: Send + Sync {
    /// First page of matching records.
    async fn first_page(&self, table: &str, query: &AirtableQuery) -> Result<Value, AirtableError>;

    /// Every matching record, following pagination.
    async fn all(&self, table: &str, query: &AirtableQuery) -> Result<Value, AirtableError>;

    /// One record by id.
    async fn find(&self, table: &str, record_id: &str) -> Result<Value, AirtableError>;
}

/// `{Field} = 'value'` with the value quoted for Airtable formulas.
pub fn formula_eq(field: &str, value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
    format!("{{{}}} = '{}'", field, escaped)
}

/// The `fields` object of an Airtable record, or null.
pub fn fields(record: &Value) -> &Value {
    record.get("fields").unwrap_or(&Value::Null)
}

/// First entry of a linked-record field such as `Channels`.
pub fn first_link(record: &Value, field: &str) -> Option<String> {
    fields(record)
        .get(field)
        .and_then(Value::as_array)
        .and_then(|links| links.first())
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn formula_quotes_values() {
        assert_eq!(formula_eq("Email", "a@b.c"), "{Email} = 'a@b.c'");
        assert_eq!(formula_eq("Channel", "O'Neil"), "{Channel} = 'O\\'Neil'");
    }

    #[test]
    fn first_link_reads_linked_records() {
        let rep = json!({"id": "rec1", "fields": {"Name": "Rep", "Channels": ["recA", "recB"]}});
        assert_eq!(first_link(&rep, "Channels").as_deref(), Some("recA"));
        assert_eq!(first_link(&rep, "Missing"), None);
        assert_eq!(first_link(&json!({"fields": {"Channels": []}}), "Channels"), None);
    }
}
