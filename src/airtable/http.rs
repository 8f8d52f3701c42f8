use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, error};
use url::Url;

use super::{AirtableClient, AirtableError, AirtableQuery};
use crate::config::AirtableConfig;

/// REST client for `https://api.airtable.com/v0/{base}/{table}`.
pub struct HttpAirtableClient {
    client: reqwest::Client,
    endpoint: Url,
    api_key: String,
    base_id: String,
}

impl HttpAirtableClient {
    pub fn new(config: &AirtableConfig) -> Result<Self, AirtableError> {
        let endpoint = Url::parse(&config.endpoint_url)
            .map_err(|_| AirtableError::NotConfigured("AIRTABLE_ENDPOINT_URL"))?;
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint,
            api_key: config.api_key.clone(),
            base_id: config.base_id.clone(),
        })
    }

    fn table_url(&self, table: &str, record_id: Option<&str>) -> Result<Url, AirtableError> {
        if self.base_id.is_empty() {
            return Err(AirtableError::NotConfigured("AIRTABLE_DB_FINANCEADMIN"));
        }
        let mut url = self.endpoint.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| AirtableError::NotConfigured("AIRTABLE_ENDPOINT_URL"))?;
            segments.pop_if_empty().push("v0").push(&self.base_id).push(table);
            if let Some(id) = record_id {
                segments.push(id);
            }
        }
        Ok(url)
    }

    async fn get_json(&self, request: reqwest::RequestBuilder) -> Result<Value, AirtableError> {
        let response = request.bearer_auth(&self.api_key).send().await?;
        let status = response.status();
        let body: Value = response.json().await?;

        if !status.is_success() {
            let message = body
                .pointer("/error/message")
                .or_else(|| body.get("error"))
                .and_then(Value::as_str)
                .unwrap_or("Airtable request failed")
                .to_string();
            error!("Airtable responded {}: {}", status, message);
            return Err(AirtableError::Api { status: status.as_u16(), message });
        }
        Ok(body)
    }

    async fn list_page(&self, table: &str, query: &AirtableQuery, offset: Option<&str>) -> Result<Value, AirtableError> {
        let mut request = self.client.get(self.table_url(table, None)?);
        if let Some(formula) = &query.filter_by_formula {
            request = request.query(&[("filterByFormula", formula)]);
        }
        if let Some(view) = &query.view {
            request = request.query(&[("view", view)]);
        }
        for field in &query.fields {
            request = request.query(&[("fields[]", field)]);
        }
        if let Some(size) = query.page_size {
            request = request.query(&[("pageSize", size)]);
        }
        if let Some(max) = query.max_records {
            request = request.query(&[("maxRecords", max)]);
        }
        if let Some(offset) = offset {
            request = request.query(&[("offset", offset)]);
        }

        debug!("Airtable list {} {:?} offset={:?}", table, query, offset);
        self.get_json(request).await
    }
}

#[async_trait]
impl AirtableClient for HttpAirtableClient {
    async fn first_page(&self, table: &str, query: &AirtableQuery) -> Result<Value, AirtableError> {
        let page = self.list_page(table, query, None).await?;
        Ok(page.get("records").cloned().unwrap_or(Value::Null))
    }

    async fn all(&self, table: &str, query: &AirtableQuery) -> Result<Value, AirtableError> {
        let mut records = Vec::new();
        let mut offset: Option<String> = None;
        loop {
            let page = self.list_page(table, query, offset.as_deref()).await?;
            match page.get("records") {
                Some(Value::Array(batch)) => records.extend(batch.iter().cloned()),
                // hand malformed pages back untouched
                other => return Ok(other.cloned().unwrap_or(Value::Null)),
            }
            offset = page.get("offset").and_then(Value::as_str).map(str::to_string);
            if offset.is_none() {
                break;
            }
        }
        Ok(Value::Array(records))
    }

    async fn find(&self, table: &str, record_id: &str) -> Result<Value, AirtableError> {
        let request = self.client.get(self.table_url(table, Some(record_id))?);
        self.get_json(request).await
    }
}
