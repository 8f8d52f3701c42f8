// handlers/protected/channel/representative.rs - Airtable lookups shared by
// the profile, agreement and sales views

use std::collections::{BTreeSet, HashMap};

use futures::future::try_join_all;
use serde_json::Value;
use tracing::error;

use crate::airtable::{self, AirtableError, AirtableQuery};
use crate::database::{RecordExt, Table};
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pages {
    First,
    All,
}

fn profile_not_found() -> ApiError {
    ApiError::bad_request("Profile not found")
}

/// Email of the caller's channel owner, or the caller's own email when the
/// channel has no owner.
pub async fn profile_email(state: &AppState, caller: &AuthUser) -> Result<String, ApiError> {
    let channel_id = caller.channel_id.ok_or_else(profile_not_found)?;
    let owner_email = match state.store.select_by_id(Table::Channel, channel_id).await? {
        Some(channel) => match channel.i64_field("userId") {
            Some(owner) => state
                .store
                .select_by_id(Table::AuthUser, owner)
                .await?
                .and_then(|u| u.str_field("email").map(str::to_string)),
            None => None,
        },
        None => None,
    };
    Ok(owner_email.unwrap_or_else(|| caller.email.clone()))
}

/// The `Channel Representative` record for `email`.
pub async fn find(state: &AppState, email: &str, pages: Pages) -> Result<Value, ApiError> {
    let query = AirtableQuery::formula(airtable::formula_eq("Email", email));
    let result = match pages {
        Pages::First => state.airtable.first_page(airtable::CHANNEL_REPRESENTATIVE, &query).await,
        Pages::All => state.airtable.all(airtable::CHANNEL_REPRESENTATIVE, &query).await,
    };

    match result {
        Ok(Value::Array(mut list)) if !list.is_empty() => Ok(list.swap_remove(0)),
        Ok(Value::Array(_)) => Err(profile_not_found()),
        Ok(_) => Err(ApiError::internal_server_error("Database query error")),
        Err(e) => {
            error!("Representative lookup for {} failed: {}", email, e);
            Err(ApiError::internal_server_error("Database query error"))
        }
    }
}

/// The `Channel List` record linked from the representative.
pub async fn channel_record(state: &AppState, representative: &Value) -> Result<Value, AirtableError> {
    let link = airtable::first_link(representative, "Channels").ok_or_else(|| AirtableError::Api {
        status: 404,
        message: "Representative has no linked channel".to_string(),
    })?;
    state.airtable.find(airtable::CHANNEL_LIST, &link).await
}

pub fn trading_name(channel: &Value) -> String {
    airtable::fields(channel)
        .get("Trading Name 常用稱呼")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Records of `table` whose `{Channel}` is the trading name.
pub async fn for_channel(state: &AppState, table: &str, trading_name: &str) -> Result<Vec<Value>, AirtableError> {
    let query = AirtableQuery::formula(airtable::formula_eq("Channel", trading_name));
    match state.airtable.all(table, &query).await? {
        Value::Array(records) => Ok(records),
        _ => Err(AirtableError::Decode(format!("{} did not return a list", table))),
    }
}

/// Linked record ids found in `field` across `records`.
pub fn linked_ids(records: &[Value], field: &str) -> BTreeSet<String> {
    records
        .iter()
        .filter_map(|r| airtable::fields(r).get(field).and_then(Value::as_array))
        .flatten()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect()
}

/// `Project Name` for each project id, fetched concurrently.
pub async fn project_names(state: &AppState, ids: BTreeSet<String>) -> Result<HashMap<String, Value>, AirtableError> {
    let lookups = ids.into_iter().map(|id| async move {
        let record = state.airtable.find(airtable::PROJECTS_SYNCED_VIEW, &id).await?;
        let name = airtable::fields(&record).get("Project Name").cloned().unwrap_or(Value::Null);
        Ok::<_, AirtableError>((id, name))
    });
    Ok(try_join_all(lookups).await?.into_iter().collect())
}

/// Map the linked ids stored in `field` through `names`.
pub fn names_for(record: &Value, field: &str, names: &HashMap<String, Value>) -> Value {
    let ids = airtable::fields(record).get(field).and_then(Value::as_array).cloned().unwrap_or_default();
    Value::Array(
        ids.iter()
            .filter_map(Value::as_str)
            .map(|id| names.get(id).cloned().unwrap_or(Value::Null))
            .collect(),
    )
}
