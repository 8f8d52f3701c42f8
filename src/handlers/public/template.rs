// handlers/public/template.rs - GET /api/masterdata/getTemplate/:code

use axum::extract::{Path, Query, State};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::database::Table;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, Tenant};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LangQuery {
    pub lang: Option<String>,
}

pub async fn get_template_by_code(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(code): Path<String>,
    Query(query): Query<LangQuery>,
) -> ApiResult {
    let lang = query
        .lang
        .filter(|l| !l.is_empty())
        .unwrap_or_else(|| state.config.channel.default_language.clone());

    let rows = state
        .store
        .select_where(Table::Template, json!({ "k": code, "tenant": tenant.as_str(), "lang": lang }))
        .await?;
    if rows.is_empty() {
        return Err(ApiError::bad_request("No such code/key available"));
    }
    Ok(ApiResponse::success(Value::Array(rows.into_iter().map(Value::Object).collect())))
}
