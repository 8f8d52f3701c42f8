// handlers/protected/masterdata/templates.rs - template management (admin)

use axum::extract::{Query, State};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::info;

use crate::database::{RecordExt, Table};
use crate::error::ApiError;
use crate::filter::FilterData;
use crate::handlers::JsonBody;
use crate::middleware::{ok, ok_with_id, ApiResponse, ApiResult};
use crate::state::AppState;
use crate::validation::{int_field, is_empty_body, must_be_string, required_property};

const PROPS: [&str; 4] = ["k", "v", "tenant", "lang"];

#[derive(Debug, Deserialize)]
pub struct TemplateFilter {
    pub tenant: Option<String>,
    pub lang: Option<String>,
}

/// GET /api/masterdata/getTemplate
pub async fn list_templates(State(state): State<AppState>, Query(filter): Query<TemplateFilter>) -> ApiResult {
    let mut conditions = Map::new();
    if let Some(tenant) = filter.tenant.filter(|t| !t.is_empty()) {
        conditions.insert("tenant".into(), json!(tenant));
    }
    if let Some(lang) = filter.lang.filter(|l| !l.is_empty()) {
        conditions.insert("lang".into(), json!(lang));
    }
    let rows = state
        .store
        .select(Table::Template, FilterData::matching(Value::Object(conditions)).order_by("id asc"))
        .await?;
    Ok(ApiResponse::success(Value::Array(rows.into_iter().map(Value::Object).collect())))
}

fn check_props(body: &Value) -> Result<(), ApiError> {
    required_property(body, &PROPS)?;
    for prop in PROPS {
        must_be_string(&body[prop])?;
    }
    Ok(())
}

fn template_row(body: &Value) -> crate::database::Record {
    PROPS.iter().map(|p| (p.to_string(), body[*p].clone())).collect()
}

async fn key_taken(state: &AppState, body: &Value, except: Option<i64>) -> Result<bool, ApiError> {
    let existing = state
        .store
        .select_one(Table::Template, json!({ "k": body["k"], "tenant": body["tenant"], "lang": body["lang"] }))
        .await?;
    Ok(existing.map_or(false, |row| except.map_or(true, |id| row.id() != Some(id))))
}

/// POST /api/masterdata/addTemplate
pub async fn add_template(State(state): State<AppState>, JsonBody(body): JsonBody) -> ApiResult {
    if is_empty_body(&body) {
        return Err(ApiError::bad_request("Please provide template details"));
    }
    check_props(&body)?;
    if key_taken(&state, &body, None).await? {
        return Err(ApiError::bad_request("Provided template details are already available"));
    }

    let created = state.store.insert(Table::Template, template_row(&body)).await?;
    let id = created
        .id()
        .ok_or_else(|| ApiError::internal_server_error("Template was not created"))?;
    info!("Added template #{} ({})", id, body["k"]);
    ok_with_id(id)
}

/// POST /api/masterdata/editTemplate
pub async fn edit_template(State(state): State<AppState>, JsonBody(body): JsonBody) -> ApiResult {
    if is_empty_body(&body) {
        return Err(ApiError::bad_request("Please provide template details"));
    }
    let id = int_field(&body, "id").ok_or_else(|| ApiError::bad_request("Please provide id to update template details"))?;
    check_props(&body)?;
    if !state.store.exists(Table::Template, id).await? {
        return Err(ApiError::bad_request("Provided template id is not available for update"));
    }
    if key_taken(&state, &body, Some(id)).await? {
        return Err(ApiError::bad_request("Provided template details are already available"));
    }

    state.store.update(Table::Template, json!({ "id": id }), template_row(&body)).await?;
    info!("Edited template #{}", id);
    ok()
}

/// POST /api/masterdata/deleteTemplate
pub async fn delete_template(State(state): State<AppState>, JsonBody(body): JsonBody) -> ApiResult {
    if is_empty_body(&body) {
        return Err(ApiError::bad_request("Please provide template details"));
    }
    let id = int_field(&body, "id").ok_or_else(|| ApiError::bad_request("Please provide id to delete from template"))?;
    if state.store.delete(Table::Template, json!({ "id": id })).await? == 0 {
        return Err(ApiError::bad_request("Provided template id is not available for delete"));
    }
    info!("Deleted template #{}", id);
    ok()
}
