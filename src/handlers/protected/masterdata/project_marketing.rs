// handlers/protected/masterdata/project_marketing.rs - GET/POST /api/masterdata/projectMarketing

use axum::extract::{Query, State};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::database::{into_record, Record, RecordExt, Table};
use crate::error::ApiError;
use crate::handlers::JsonBody;
use crate::middleware::{ok, ApiResponse, ApiResult};
use crate::relations::{self, SLOGAN};
use crate::state::AppState;
use crate::validation::{
    int_field, must_be_boolean, must_be_number, must_be_one_of, must_be_string, numeric_param, required_property,
};

pub const PROJECT_STATUSES: [&str; 4] = ["New Project", "Promotion", "Ready to Move in", "Sold Out"];
const REQUIRED: [&str; 6] = [
    "projectId",
    "locationTagColor",
    "sloganTransId",
    "sloganTextColor",
    "heroBannerId",
    "projectStatus",
];
const LANGUAGES: [&str; 3] = ["en", "zh-CN", "zh-HK"];
const SLOGAN_PARENT: &str = "project_marketing.slogan";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketingQuery {
    pub project_id: Option<String>,
}

pub async fn get_project_marketing(State(state): State<AppState>, Query(query): Query<MarketingQuery>) -> ApiResult {
    let project_id = numeric_param(query.project_id.as_deref())
        .ok()
        .flatten()
        .ok_or_else(|| ApiError::bad_request("projectId required"))?;

    let mut rows = state
        .store
        .select_where(Table::ProjectMarketing, json!({ "projectId": project_id }))
        .await?;
    relations::expand(state.store.as_ref(), &mut rows, &SLOGAN).await?;

    let data: Vec<Value> = rows.into_iter().map(Value::Object).collect();
    Ok(ApiResponse::success(json!({ "data": data })))
}

fn check_schema(body: &Value) -> Result<(), ApiError> {
    required_property(body, &REQUIRED)?;
    must_be_one_of(&body["projectStatus"], &PROJECT_STATUSES)?;

    let slogan = &body["sloganTransId"];
    if !slogan.is_object() {
        return Err(ApiError::bad_request(format!("must have required property '{}'", LANGUAGES[0])));
    }
    required_property(slogan, &LANGUAGES)?;
    for lang in LANGUAGES {
        must_be_string(&slogan[lang])?;
    }

    for key in ["lat", "lon"] {
        if let Some(v) = body.get(key).filter(|v| !v.is_null()) {
            must_be_number(v)?;
        }
    }
    if let Some(v) = body.get("isActive").filter(|v| !v.is_null()) {
        must_be_boolean(v)?;
    }
    Ok(())
}

/// Create or update a marketing row. The slogan arrives inline as a
/// translation object and is stored in `translation`.
pub async fn save_project_marketing(State(state): State<AppState>, JsonBody(body): JsonBody) -> ApiResult {
    check_schema(&body)?;

    match int_field(&body, "projectId") {
        Some(id) if state.store.exists(Table::Project, id).await? => {}
        _ => return Err(ApiError::bad_request("Provided projectId does not exist")),
    }
    match int_field(&body, "heroBannerId") {
        Some(id) if state.store.exists(Table::ProjectMedia, id).await? => {}
        _ => return Err(ApiError::bad_request("Provided heroBannerId does not exist")),
    }
    let marketing_id = match body.get("id").filter(|v| !v.is_null()) {
        None => None,
        Some(_) => match int_field(&body, "id") {
            Some(id) if state.store.exists(Table::ProjectMarketing, id).await? => Some(id),
            _ => return Err(ApiError::bad_request("Provided id does not exist")),
        },
    };

    let slogan = &body["sloganTransId"];
    let translation_id = match slogan.get("id").filter(|v| !v.is_null()) {
        None => None,
        Some(_) => match int_field(slogan, "id") {
            Some(id) if state.store.exists(Table::Translation, id).await? => Some(id),
            _ => return Err(ApiError::bad_request("Provided sloganTransId does not exist")),
        },
    };
    let texts: Record = LANGUAGES.iter().map(|l| (l.to_string(), slogan[*l].clone())).collect();

    let mut row = Record::new();
    for key in ["projectId", "locationTagColor", "sloganTextColor", "heroBannerId", "projectStatus", "lat", "lon"] {
        if let Some(v) = body.get(key) {
            row.insert(key.to_string(), v.clone());
        }
    }
    if let Some(active) = body.get("isActive").and_then(Value::as_bool) {
        row.insert("isActive".into(), Value::Bool(active));
    }

    match marketing_id {
        None => {
            row.entry("isActive").or_insert(Value::Bool(true));
            let created = state.store.insert(Table::ProjectMarketing, row).await?;
            let id = created
                .id()
                .ok_or_else(|| ApiError::internal_server_error("Project marketing was not created"))?;
            let translation_id = insert_translation(&state, id, texts).await?;
            state
                .store
                .update(Table::ProjectMarketing, json!({ "id": id }), into_record(json!({ "sloganTransId": translation_id })))
                .await?;
            info!("Created project marketing #{}", id);
        }
        Some(id) => {
            match translation_id {
                Some(translation_id) => {
                    state.store.update(Table::Translation, json!({ "id": translation_id }), texts).await?;
                }
                None => {
                    let translation_id = insert_translation(&state, id, texts).await?;
                    row.insert("sloganTransId".into(), json!(translation_id));
                }
            }
            state.store.update(Table::ProjectMarketing, json!({ "id": id }), row).await?;
            info!("Updated project marketing #{}", id);
        }
    }
    ok()
}

async fn insert_translation(state: &AppState, marketing_id: i64, mut texts: Record) -> Result<i64, ApiError> {
    texts.insert("parentTable".into(), json!(SLOGAN_PARENT));
    texts.insert("parentId".into(), json!(marketing_id));
    state
        .store
        .insert(Table::Translation, texts)
        .await?
        .id()
        .ok_or_else(|| ApiError::internal_server_error("Translation was not created"))
}
