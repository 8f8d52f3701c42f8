// handlers/protected/sites/region.rs - GET/POST /api/sites/cmp/region/:country

use axum::extract::{Path, State};
use serde_json::{json, Value};

use super::projects::{all_known, site_projects};
use super::{load, region_key, save};
use crate::database::{RecordExt, Table};
use crate::error::ApiError;
use crate::filter::FilterData;
use crate::handlers::JsonBody;
use crate::middleware::{ok, ApiResponse, ApiResult, Tenant};
use crate::state::AppState;
use crate::validation::id_list;

pub async fn get_cmp_region(State(state): State<AppState>, Path(country): Path<String>) -> ApiResult {
    let doc = load(&state, &region_key(&country))
        .await?
        .ok_or_else(|| ApiError::not_found("Country's template not found"))?;
    let store = state.store.as_ref();

    let region_ids: Vec<i64> = store
        .select_where(Table::Region, json!({ "name": country }))
        .await?
        .iter()
        .filter_map(|r| r.id())
        .collect();
    let project_ids: Vec<i64> = if region_ids.is_empty() {
        Vec::new()
    } else {
        store
            .select(Table::Project, FilterData::matching(json!({ "region": { "$in": region_ids } })).order_by("id asc"))
            .await?
            .iter()
            .filter_map(|p| p.id())
            .collect()
    };

    let hero_ids = doc.value.get("heroProjects").and_then(id_list).unwrap_or_default();
    Ok(ApiResponse::success(json!({
        "projects": site_projects(store, &project_ids).await?,
        "heroProjects": site_projects(store, &hero_ids).await?,
        "template": doc.value.get("template").cloned().unwrap_or(Value::Null),
    })))
}

pub async fn save_cmp_region(
    State(state): State<AppState>,
    Path(country): Path<String>,
    tenant: Tenant,
    JsonBody(body): JsonBody,
) -> ApiResult {
    let field = |key: &str| body.get(key).filter(|v| !v.is_null());
    let (hero, template) = (field("heroProjects"), field("template"));

    if hero.is_none() && template.is_none() {
        return Err(ApiError::bad_request("Please provide required field to update sites cmp region"));
    }
    if hero.is_some_and(|h| !h.is_array()) {
        return Err(ApiError::bad_request("heroProjects must be an array"));
    }
    if template.is_some_and(|t| !t.is_string()) {
        return Err(ApiError::bad_request("Template must be a string"));
    }
    if let Some(hero) = hero {
        if !all_known(&state, Table::Project, id_list(hero).as_deref()).await? {
            return Err(ApiError::bad_request("Provided heroProjects are not available"));
        }
    }

    let unavailable = || ApiError::internal_server_error("The Site Region is not available");
    if !state.store.select_where(Table::Region, json!({ "name": country })).await?.iter().any(|r| r.id().is_some()) {
        return Err(unavailable());
    }
    let key = region_key(&country);
    let mut doc = load(&state, &key).await?.ok_or_else(unavailable)?;

    if let Some(hero) = hero {
        doc.value.insert("heroProjects".into(), hero.clone());
    }
    if let Some(template) = template {
        doc.value.insert("template".into(), template.clone());
    }
    save(&state, &key, Some(doc.row_id), doc.value, &tenant).await?;
    ok()
}
