// handlers/protected/sites/mod.rs - /api/sites/cmp/* (admin)
//
// Site compositions are JSON documents kept as text in `template.v` under
// well-known keys.

pub mod inventory;
pub mod project;
pub mod projects;
pub mod region;

pub use inventory::save_inventory_unit_pages;
pub use project::{get_cmp_project, save_cmp_project};
pub use projects::{get_cmp_projects, save_cmp_projects};
pub use region::{get_cmp_region, save_cmp_region};

use serde_json::{json, Map, Value};
use tracing::{error, info};

use crate::database::{into_record, RecordExt, Table};
use crate::error::ApiError;
use crate::middleware::Tenant;
use crate::state::AppState;

pub const PROJECTS_KEY: &str = "sites_cmp_projects";

pub fn region_key(country: &str) -> String {
    format!("sites_cmp_project_region_{}", country)
}

pub fn project_key(id: &str) -> String {
    format!("sites_cmp_project_{}", id)
}

/// A stored site document and the template row holding it.
pub struct SiteDocument {
    pub row_id: i64,
    pub value: Map<String, Value>,
}

pub async fn load(state: &AppState, key: &str) -> Result<Option<SiteDocument>, ApiError> {
    let Some(row) = state.store.select_one(Table::Template, json!({ "k": key })).await? else {
        return Ok(None);
    };
    let row_id = row.id().ok_or_else(|| ApiError::internal_server_error("Template row has no id"))?;
    let value = match row.str_field("v").map(serde_json::from_str::<Value>) {
        Some(Ok(Value::Object(map))) => map,
        other => {
            error!("Site document {} is not a JSON object: {:?}", key, other.map(|r| r.is_ok()));
            Map::new()
        }
    };
    Ok(Some(SiteDocument { row_id, value }))
}

/// Write `value` back to its row, or create the key for the request tenant.
pub async fn save(
    state: &AppState,
    key: &str,
    existing: Option<i64>,
    value: Map<String, Value>,
    tenant: &Tenant,
) -> Result<(), ApiError> {
    let text = serde_json::to_string(&Value::Object(value))
        .map_err(|e| ApiError::internal_server_error(format!("Could not encode site document: {}", e)))?;
    match existing {
        Some(id) => {
            state.store.update(Table::Template, json!({ "id": id }), into_record(json!({ "v": text }))).await?;
        }
        None => {
            state
                .store
                .insert(
                    Table::Template,
                    into_record(json!({
                        "k": key,
                        "v": text,
                        "tenant": tenant.as_str(),
                        "lang": state.config.channel.default_language,
                    })),
                )
                .await?;
        }
    }
    info!("Saved site document {}", key);
    Ok(())
}
