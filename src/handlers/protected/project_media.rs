// handlers/protected/project_media.rs - /api/project/media

use axum::extract::{Path, Query, State};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{error, info};

use crate::database::{Record, RecordExt, Table};
use crate::error::ApiError;
use crate::filter::FilterData;
use crate::handlers::JsonBody;
use crate::middleware::{ok, ok_with_id, ApiResponse, ApiResult};
use crate::relations::{self, MEDIA_FILE};
use crate::state::AppState;
use crate::validation::{int_field, numeric_param, required_property};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaQuery {
    pub project_id: Option<String>,
    pub file_id: Option<String>,
    #[serde(rename = "type")]
    pub media_type: Option<String>,
}

pub async fn list_media(State(state): State<AppState>, Query(query): Query<MediaQuery>) -> ApiResult {
    let project_id = numeric_param(query.project_id.as_deref())
        .map_err(|_| ApiError::bad_request("Provided projectId is not available"))?;
    let file_id =
        numeric_param(query.file_id.as_deref()).map_err(|_| ApiError::bad_request("Provided fileId is not available"))?;

    let mut conditions = Map::new();
    if let Some(project_id) = project_id {
        conditions.insert("projectId".into(), json!(project_id));
    }
    if let Some(file_id) = file_id {
        conditions.insert("fileId".into(), json!(file_id));
    }
    if let Some(media_type) = query.media_type.filter(|t| !t.is_empty()) {
        conditions.insert("type".into(), json!(media_type));
    }

    let mut rows = state
        .store
        .select(Table::ProjectMedia, FilterData::matching(Value::Object(conditions)).order_by("id asc"))
        .await?;
    relations::expand(state.store.as_ref(), &mut rows, &MEDIA_FILE).await?;
    Ok(ApiResponse::success(Value::Array(rows.into_iter().map(Value::Object).collect())))
}

fn present<'a>(body: &'a Value, key: &str) -> Option<&'a Value> {
    body.get(key).filter(|v| !v.is_null())
}

/// Create a media item, or update one when `id` is given. A media item points
/// at either an uploaded file or an external url, never both.
pub async fn save_media(State(state): State<AppState>, JsonBody(body): JsonBody) -> ApiResult {
    let (file_id, url) = (present(&body, "fileId"), present(&body, "url"));
    let id = present(&body, "id");

    if id.is_none() {
        required_property(&body, &["projectId", "type"])?;
        if file_id.is_none() && url.is_none() {
            return Err(ApiError::bad_request("Please provide fileId or url"));
        }
    } else if ["projectId", "type", "fileId", "url"].iter().all(|k| present(&body, k).is_none()) {
        return Err(ApiError::bad_request("Please provide required fields for update"));
    }
    if file_id.is_some() && url.is_some() {
        return Err(ApiError::bad_request("Please provide fileId or url not both"));
    }

    let media_id = match id {
        Some(_) => match int_field(&body, "id") {
            Some(id) if state.store.exists(Table::ProjectMedia, id).await? => Some(id),
            _ => return Err(ApiError::bad_request("Provided id is not available")),
        },
        None => None,
    };
    if present(&body, "projectId").is_some() {
        match int_field(&body, "projectId") {
            Some(pid) if state.store.exists(Table::Project, pid).await? => {}
            _ => return Err(ApiError::bad_request("Provided projectId is not available")),
        }
    }
    if file_id.is_some() {
        match int_field(&body, "fileId") {
            Some(fid) if state.store.exists(Table::File, fid).await? => {}
            _ => return Err(ApiError::bad_request("Provided fileId is not available")),
        }
    }

    let mut row = Record::new();
    for key in ["projectId", "type"] {
        if let Some(v) = present(&body, key) {
            row.insert(key.to_string(), v.clone());
        }
    }
    if let Some(fid) = file_id {
        row.insert("fileId".into(), fid.clone());
        row.insert("url".into(), Value::Null);
    }
    if let Some(url) = url {
        row.insert("url".into(), url.clone());
        row.insert("fileId".into(), Value::Null);
    }

    match media_id {
        Some(id) => {
            state.store.update(Table::ProjectMedia, json!({ "id": id }), row).await?;
            info!("Updated media #{}", id);
            ok_with_id(id)
        }
        None => {
            let created = state.store.insert(Table::ProjectMedia, row).await?;
            let id = created
                .id()
                .ok_or_else(|| ApiError::internal_server_error("Media was not created"))?;
            info!("Created media #{}", id);
            ok_with_id(id)
        }
    }
}

/// Delete a media item and, first, the stored file behind it.
pub async fn delete_media(State(state): State<AppState>, Path(raw_id): Path<String>) -> ApiResult {
    let not_found = || ApiError::not_found("Media item not found");
    let id: i64 = raw_id.trim().parse().map_err(|_| not_found())?;
    let media = state.store.select_by_id(Table::ProjectMedia, id).await?.ok_or_else(not_found)?;

    if let Some(file_id) = media.i64_field("fileId") {
        state.files.delete(file_id).await.map_err(|e| {
            error!("File service refused to delete file #{}: {}", file_id, e);
            ApiError::internal_server_error(format!("Error deleting file: {}", e))
        })?;
    }

    state.store.delete(Table::ProjectMedia, json!({ "id": id })).await?;
    info!("Deleted media #{}", id);
    ok()
}
