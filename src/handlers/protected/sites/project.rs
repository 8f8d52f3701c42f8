// handlers/protected/sites/project.rs - GET/POST /api/sites/cmp/project/:id

use axum::extract::{Path, State};
use serde_json::{json, Map, Value};

use super::{load, project_key, save};
use crate::database::{as_i64, RecordStore};
use crate::error::ApiError;
use crate::handlers::JsonBody;
use crate::middleware::{ok, ApiResponse, ApiResult, Tenant};
use crate::relations::media_with_files;
use crate::state::AppState;
use crate::validation::is_empty_body;

/// Sections mapping a name to a list of media ids.
const SECTIONS: [&str; 4] = ["gallery", "floorplan", "unitplan", "map"];
/// Stored key order.
const KEY_ORDER: [&str; 6] = ["template", "pamphlet", "gallery", "floorplan", "unitplan", "map"];

async fn media(store: &dyn RecordStore, ids: &Value) -> Result<Value, ApiError> {
    let ids: Vec<i64> = ids.as_array().map(|a| a.iter().filter_map(as_i64).collect()).unwrap_or_default();
    let rows = media_with_files(store, &ids).await?;
    Ok(Value::Array(rows.into_iter().map(Value::Object).collect()))
}

pub async fn get_cmp_project(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let Some(doc) = load(&state, &project_key(&id)).await? else {
        return Ok(ApiResponse::success(json!({})));
    };
    let store = state.store.as_ref();

    let mut out = Map::new();
    for (key, value) in doc.value {
        let expanded = match key.as_str() {
            "pamphlet" => media(store, &value).await?,
            k if SECTIONS.contains(&k) => match value {
                Value::Object(groups) => {
                    let mut section = Map::new();
                    for (name, ids) in groups {
                        section.insert(name, media(store, &ids).await?);
                    }
                    Value::Object(section)
                }
                other => other,
            },
            _ => value,
        };
        out.insert(key, expanded);
    }
    Ok(ApiResponse::success(Value::Object(out)))
}

fn check_body(body: &Value) -> Result<(), ApiError> {
    if is_empty_body(body) {
        return Err(ApiError::bad_request("Please provide required field to update template"));
    }
    if body.get("template").is_some_and(|t| !t.is_string()) {
        return Err(ApiError::bad_request("template must be a string"));
    }
    if body.get("pamphlet").is_some_and(|p| !p.is_array()) {
        return Err(ApiError::bad_request("pamphlet must be an array"));
    }
    for section in SECTIONS {
        let Some(value) = body.get(section) else { continue };
        let groups = value
            .as_object()
            .ok_or_else(|| ApiError::bad_request(format!("{} must be an object", section)))?;
        for (key, ids) in groups {
            let ids = ids
                .as_array()
                .ok_or_else(|| ApiError::bad_request(format!("{}'s {} value must be an array", section, key)))?;
            if !ids.iter().all(Value::is_number) {
                return Err(ApiError::bad_request(format!("{}'s {} value must be an array of number", section, key)));
            }
        }
    }
    Ok(())
}

pub async fn save_cmp_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
    tenant: Tenant,
    JsonBody(body): JsonBody,
) -> ApiResult {
    check_body(&body)?;
    let key = project_key(&id);
    let doc = load(&state, &key)
        .await?
        .ok_or_else(|| ApiError::internal_server_error("Required key is not available in template"))?;

    let mut merged = doc.value;
    if let Value::Object(incoming) = &body {
        for (k, v) in incoming {
            merged.insert(k.clone(), v.clone());
        }
    }

    let mut ordered = Map::new();
    for k in KEY_ORDER {
        if let Some(v) = merged.get(k) {
            ordered.insert(k.to_string(), v.clone());
        }
    }
    for (k, v) in merged {
        if !ordered.contains_key(&k) {
            ordered.insert(k, v);
        }
    }

    save(&state, &key, Some(doc.row_id), ordered, &tenant).await?;
    ok()
}
