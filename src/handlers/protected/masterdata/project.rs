// handlers/protected/masterdata/project.rs - GET/POST /api/masterdata/project

use axum::extract::{Query, State};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::database::{into_record, DatabaseError, Record, RecordExt, RecordStore, Table};
use crate::error::ApiError;
use crate::filter::FilterData;
use crate::handlers::JsonBody;
use crate::middleware::{ok_with_id, ApiResponse, ApiResult};
use crate::projection::{FieldSet, Selection};
use crate::relations::{self, HERO_BANNER, MEDIA_FILE_TAGGED, PAYMENT_SCHEDULE, PROJECT_COMMISSION_SCHEME, PROJECT_REGION, SLOGAN};
use crate::state::AppState;
use crate::validation::{int_field, numeric_param};

pub const PROJECT_FIELDS: FieldSet = FieldSet::new(
    &[
        "id",
        "name",
        "isActive",
        "region",
        "code",
        "isCompleted",
        "commissionSchemeId",
        "airtableId",
        "paymentScheduleId",
        "marketing",
    ],
    &["marketing", "paymentScheduleId"],
);

const WRITABLE: [&str; 8] = [
    "name",
    "code",
    "region",
    "commissionSchemeId",
    "isActive",
    "isCompleted",
    "airtableId",
    "paymentScheduleId",
];

#[derive(Debug, Deserialize)]
pub struct ProjectQuery {
    pub id: Option<String>,
    pub fields: Option<String>,
}

pub async fn get_projects(State(state): State<AppState>, Query(query): Query<ProjectQuery>) -> ApiResult {
    let selection = PROJECT_FIELDS
        .parse_query(query.fields.as_deref())
        .map_err(|e| e.into_api_error())?;
    let not_found = || ApiError::not_found("Project not found");
    let id = numeric_param(query.id.as_deref()).map_err(|_| not_found())?;

    let where_clause = match id {
        Some(id) => json!({ "id": id }),
        None => json!({}),
    };
    let mut rows = state
        .store
        .select(Table::Project, FilterData::matching(where_clause).order_by("id asc"))
        .await?;
    expand_projects(state.store.as_ref(), &mut rows, &selection).await?;
    let projected = selection.project_all(&rows);

    match id {
        Some(_) => projected.into_iter().next().map(ApiResponse::success).ok_or_else(not_found),
        None => Ok(ApiResponse::success(Value::Array(projected))),
    }
}

/// Expand the selected relations of project rows in place.
async fn expand_projects(
    store: &dyn RecordStore,
    rows: &mut [Record],
    selection: &Selection,
) -> Result<(), DatabaseError> {
    if selection.contains("region") {
        relations::expand(store, rows, &PROJECT_REGION).await?;
    }
    if selection.contains("commissionSchemeId") {
        relations::expand(store, rows, &PROJECT_COMMISSION_SCHEME).await?;
    }
    if selection.contains("paymentScheduleId") {
        relations::expand(store, rows, &PAYMENT_SCHEDULE).await?;
    }
    if selection.contains("marketing") {
        attach_marketing(store, rows).await?;
    }
    Ok(())
}

/// `marketing`: the project's marketing row with its slogan translation and
/// hero banner media (file included) expanded.
pub async fn attach_marketing(store: &dyn RecordStore, rows: &mut [Record]) -> Result<(), DatabaseError> {
    relations::attach_child(store, rows, Table::ProjectMarketing, "projectId", "marketing").await?;
    let (slots, mut marketing) = relations::take_nested(rows, "marketing");
    relations::expand(store, &mut marketing, &SLOGAN).await?;
    relations::expand(store, &mut marketing, &HERO_BANNER).await?;
    relations::expand_nested(store, &mut marketing, "heroBannerId", &MEDIA_FILE_TAGGED).await?;
    relations::restore_nested(rows, "marketing", slots, marketing);
    Ok(())
}

/// Create a project, or update the given fields of an existing one.
pub async fn save_project(State(state): State<AppState>, JsonBody(body): JsonBody) -> ApiResult {
    let given = |key: &str| body.get(key).filter(|v| !v.is_null());

    if let Some(region) = given("region") {
        if !reference_exists(&state, Table::Region, region).await? {
            return Err(ApiError::bad_request("Region does not exist"));
        }
    }
    if let Some(scheme) = given("commissionSchemeId") {
        if !reference_exists(&state, Table::CommissionScheme, scheme).await? {
            return Err(ApiError::bad_request("Commission scheme does not exist"));
        }
    }

    let mut changes = Record::new();
    for key in WRITABLE {
        if let Some(value) = body.get(key) {
            changes.insert(key.to_string(), value.clone());
        }
    }

    match given("id") {
        Some(raw_id) => {
            let id = match int_field(&body, "id") {
                Some(id) if state.store.exists(Table::Project, id).await? => id,
                _ => {
                    tracing::debug!("Unknown project id {}", raw_id);
                    return Err(ApiError::bad_request("Project does not exist"));
                }
            };
            if !changes.is_empty() {
                state.store.update(Table::Project, json!({ "id": id }), changes).await?;
            }
            info!("Updated project #{}", id);
            ok_with_id(id)
        }
        None => {
            if changes.str_field("name").map_or(true, |n| n.trim().is_empty()) {
                return Err(ApiError::bad_request("Project name is required"));
            }
            if changes.str_field("code").map_or(true, |c| c.trim().is_empty()) {
                return Err(ApiError::bad_request("Project code is required"));
            }
            if changes.get("isActive").map_or(true, Value::is_null) {
                changes.insert("isActive".into(), Value::Bool(true));
            }
            if changes.get("isCompleted").map_or(true, Value::is_null) {
                changes.insert("isCompleted".into(), Value::Bool(false));
            }
            let created = state.store.insert(Table::Project, changes).await?;
            let id = created
                .id()
                .ok_or_else(|| ApiError::internal_server_error("Project was not created"))?;
            info!("Created project #{}", id);
            ok_with_id(id)
        }
    }
}

async fn reference_exists(state: &AppState, table: Table, value: &Value) -> Result<bool, ApiError> {
    match crate::database::as_i64(value) {
        Some(id) => Ok(state.store.exists(table, id).await?),
        None => Ok(false),
    }
}
