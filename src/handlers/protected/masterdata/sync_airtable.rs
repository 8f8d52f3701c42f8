// handlers/protected/masterdata/sync_airtable.rs - POST /api/masterdata/project/syncAirtable

use std::collections::HashMap;

use axum::extract::State;
use serde_json::{json, Value};
use tracing::{error, info};

use crate::airtable::{self, AirtableQuery, LOCAL_PROJECTS};
use crate::database::{Record, RecordExt, Table};
use crate::error::ApiError;
use crate::handlers::JsonBody;
use crate::middleware::{ok, ApiResult};
use crate::state::AppState;
use crate::validation::int_field;

/// Pull project master data from the `🌍 Local Projects` Airtable table.
///
/// `syncNew` inserts records no project points at yet, `syncExisting` refreshes
/// every linked project and `syncOne` refreshes a single project by id.
pub async fn sync_airtable(State(state): State<AppState>, JsonBody(body): JsonBody) -> ApiResult {
    let flag = |key: &str| body.get(key).map_or(false, |v| !v.is_null() && v != &Value::Bool(false));
    let (sync_new, sync_existing) = (flag("syncNew"), flag("syncExisting"));
    let sync_one = match body.get("syncOne").filter(|v| !v.is_null()) {
        None => None,
        Some(_) => Some(int_field(&body, "syncOne").ok_or_else(|| ApiError::bad_request("syncOne should be a number"))?),
    };
    if sync_one.is_none() && !sync_new && !sync_existing {
        return Err(ApiError::bad_request("Please provide required parameter for syncAirtable"));
    }

    let one = match sync_one {
        Some(id) => Some(
            state
                .store
                .select_by_id(Table::Project, id)
                .await?
                .ok_or_else(|| ApiError::bad_request("Provided syncOne / project id is not available"))?,
        ),
        None => None,
    };

    let records = match state.airtable.all(LOCAL_PROJECTS, &AirtableQuery::default()).await {
        Ok(Value::Array(records)) => records,
        Ok(other) => {
            error!("{} returned a non-list: {}", LOCAL_PROJECTS, other);
            return Err(ApiError::internal_server_error("Airtable query error"));
        }
        Err(e) => {
            error!("{} query failed: {}", LOCAL_PROJECTS, e);
            return Err(ApiError::internal_server_error("Airtable query error"));
        }
    };

    let regions: HashMap<String, i64> = state
        .store
        .select_where(Table::Region, json!({}))
        .await?
        .iter()
        .filter_map(|r| Some((r.str_field("name")?.to_string(), r.id()?)))
        .collect();
    let projects = state.store.select_where(Table::Project, json!({})).await?;
    let by_airtable_id: HashMap<String, i64> = projects
        .iter()
        .filter_map(|p| Some((p.str_field("airtableId")?.to_string(), p.id()?)))
        .collect();

    if let Some(project) = one {
        let project_id = project.id().unwrap_or_default();
        let record = project
            .str_field("airtableId")
            .and_then(|aid| records.iter().find(|r| r.get("id").and_then(Value::as_str) == Some(aid)))
            .ok_or_else(|| ApiError::bad_request("Provided syncOne's airtable record not available"))?;
        state
            .store
            .update(Table::Project, json!({ "id": project_id }), project_columns(record, &regions))
            .await?;
        info!("Synced project #{} from Airtable", project_id);
    }

    let mut inserted = 0;
    let mut updated = 0;
    for record in &records {
        let Some(airtable_id) = record.get("id").and_then(Value::as_str) else { continue };
        match by_airtable_id.get(airtable_id) {
            Some(project_id) if sync_existing => {
                state
                    .store
                    .update(Table::Project, json!({ "id": project_id }), project_columns(record, &regions))
                    .await?;
                updated += 1;
            }
            None if sync_new => {
                state.store.insert(Table::Project, project_columns(record, &regions)).await?;
                inserted += 1;
            }
            _ => {}
        }
    }

    info!("Airtable sync finished: {} inserted, {} updated", inserted, updated);
    ok()
}

/// Project columns for one Airtable record. `region` is left out when no
/// region carries the record's region name.
fn project_columns(record: &Value, regions: &HashMap<String, i64>) -> Record {
    let fields = airtable::fields(record);
    let field = |key: &str| fields.get(key).cloned().unwrap_or(Value::Null);

    let mut row = Record::new();
    row.insert("name".into(), field("Project Name"));
    row.insert("isActive".into(), Value::Bool(truthy(&field("Active"))));
    row.insert("code".into(), field("Project Code"));
    if let Some(region_id) = region_name(&field("Region")).and_then(|name| regions.get(&name)) {
        row.insert("region".into(), json!(region_id));
    }
    row.insert("isCompleted".into(), Value::Bool(truthy(&field("Completed"))));
    row.insert("airtableId".into(), record.get("id").cloned().unwrap_or(Value::Null));
    row
}

// Lookup fields arrive as single-element arrays.
fn region_name(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => items.first().and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => matches!(s.to_ascii_lowercase().as_str(), "true" | "yes" | "1"),
        Value::Number(n) => n.as_f64().map_or(false, |n| n != 0.0),
        _ => false,
    }
}
