// handlers/protected/masterdata/region.rs - GET /api/masterdata/region

use axum::extract::State;
use serde_json::{json, Value};

use crate::database::Table;
use crate::middleware::{ApiResponse, ApiResult};
use crate::projection::columns;
use crate::state::AppState;

pub async fn get_regions(State(state): State<AppState>) -> ApiResult {
    let regions = state.store.select_where(Table::Region, json!({})).await?;
    Ok(ApiResponse::success(Value::Array(
        regions.iter().map(|r| Value::Object(columns(r, &["id", "name", "currency"]))).collect(),
    )))
}
