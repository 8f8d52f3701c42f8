// handlers/protected/sites/inventory.rs - POST /api/sites/cmp/projectInventory

use axum::extract::State;
use serde_json::{json, Value};
use tracing::info;

use crate::database::{as_i64, into_record, Table};
use crate::error::ApiError;
use crate::handlers::JsonBody;
use crate::middleware::{ok, ApiResult};
use crate::state::AppState;

/// Set `marketing_cmp_unitpage` on a batch of inventory units.
pub async fn save_inventory_unit_pages(State(state): State<AppState>, JsonBody(body): JsonBody) -> ApiResult {
    let raw_ids = body
        .get("ids")
        .and_then(Value::as_array)
        .ok_or_else(|| ApiError::bad_request(r#""ids" is required and is an array"#))?;
    if raw_ids.is_empty() {
        return Err(ApiError::bad_request("No project inventory id to be updated"));
    }
    let mut ids = Vec::with_capacity(raw_ids.len());
    for raw in raw_ids {
        let id = as_i64(raw).ok_or_else(|| {
            let shown = match raw {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            ApiError::bad_request(format!("Inventory id #{} is not a number", shown))
        })?;
        ids.push(id);
    }
    let page = body
        .get("marketing_cmp_unitpage")
        .filter(|v| !v.is_null())
        .ok_or_else(|| ApiError::bad_request(r#""marketing_cmp_unitpage" is required"#))?;

    let changed = state
        .store
        .update(
            Table::ProjectInventory,
            json!({ "id": { "$in": ids } }),
            into_record(json!({ "marketing_cmp_unitpage": page })),
        )
        .await?;
    info!("Updated unit pages on {} inventory rows", changed);
    ok()
}
