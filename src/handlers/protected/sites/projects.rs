// handlers/protected/sites/projects.rs - GET/POST /api/sites/cmp/projects

use axum::extract::State;
use serde_json::{json, Map, Value};

use super::{load, save, PROJECTS_KEY};
use crate::database::{Record, RecordStore, Table};
use crate::error::ApiError;
use crate::handlers::protected::masterdata::project::{attach_marketing, PROJECT_FIELDS};
use crate::handlers::JsonBody;
use crate::middleware::{ok, ApiResponse, ApiResult, Tenant};
use crate::relations::{self, PROJECT_REGION};
use crate::state::AppState;
use crate::validation::id_list;

/// Projects for `ids` in the given order. Only region and marketing are
/// expanded; the commission scheme stays a plain id.
pub async fn site_projects(store: &dyn RecordStore, ids: &[i64]) -> Result<Vec<Value>, ApiError> {
    let mut rows: Vec<Record> = relations::expand_ids(store, Table::Project, ids, &[]).await?;
    let selection = PROJECT_FIELDS.with_opt_in(&["marketing"]);
    relations::expand(store, &mut rows, &PROJECT_REGION).await?;
    attach_marketing(store, &mut rows).await?;
    Ok(selection.project_all(&rows))
}

fn ids_of(doc: &Map<String, Value>, key: &str) -> Vec<i64> {
    doc.get(key).and_then(id_list).unwrap_or_default()
}

pub async fn get_cmp_projects(State(state): State<AppState>) -> ApiResult {
    let Some(doc) = load(&state, PROJECTS_KEY).await? else {
        return Ok(ApiResponse::success(json!({})));
    };
    let store = state.store.as_ref();

    let projects = site_projects(store, &ids_of(&doc.value, "projects")).await?;
    let countries = relations::expand_ids(store, Table::Region, &ids_of(&doc.value, "countries"), &["id", "name", "currency"])
        .await?;

    Ok(ApiResponse::success(json!({
        "projects": projects,
        "countries": countries,
        "template": doc.value.get("template").cloned().unwrap_or(Value::Null),
    })))
}

pub async fn save_cmp_projects(State(state): State<AppState>, tenant: Tenant, JsonBody(body): JsonBody) -> ApiResult {
    let field = |key: &str| body.get(key).filter(|v| !v.is_null());
    let (projects, countries, template) = (field("projects"), field("countries"), field("template"));

    if projects.is_none() && countries.is_none() && template.is_none() {
        return Err(ApiError::bad_request("Please provide required field to update cmp sites"));
    }
    let project_ids = match projects {
        Some(v) => Some(v.as_array().map(|_| id_list(v)).ok_or_else(|| ApiError::bad_request("Projects must be an array"))?),
        None => None,
    };
    let country_ids = match countries {
        Some(v) => Some(v.as_array().map(|_| id_list(v)).ok_or_else(|| ApiError::bad_request("Countries must be an array"))?),
        None => None,
    };
    if template.is_some_and(|t| !t.is_string()) {
        return Err(ApiError::bad_request("Template must be a string"));
    }

    if let Some(ids) = &project_ids {
        if !all_known(&state, Table::Project, ids.as_deref()).await? {
            return Err(ApiError::bad_request("Provided projects are not available"));
        }
    }
    if let Some(ids) = &country_ids {
        if !all_known(&state, Table::Region, ids.as_deref()).await? {
            return Err(ApiError::bad_request("Provided countries are not available"));
        }
    }

    let existing = load(&state, PROJECTS_KEY).await?;
    let (row_id, mut doc) = match existing {
        Some(d) => (Some(d.row_id), d.value),
        None => {
            let mut fresh = Map::new();
            fresh.insert("projects".into(), json!([]));
            fresh.insert("countries".into(), json!([]));
            fresh.insert("template".into(), json!(""));
            (None, fresh)
        }
    };
    for (key, value) in [("projects", projects), ("countries", countries), ("template", template)] {
        if let Some(value) = value {
            doc.insert(key.to_string(), value.clone());
        }
    }

    save(&state, PROJECTS_KEY, row_id, doc, &tenant).await?;
    ok()
}

/// `None` ids means a non-numeric entry, which can never be known.
pub(super) async fn all_known(state: &AppState, table: Table, ids: Option<&[i64]>) -> Result<bool, ApiError> {
    match ids {
        Some(ids) => Ok(state.store.all_exist(table, ids).await?),
        None => Ok(false),
    }
}
