// handlers/public/confirm_email.rs - POST /api/channel/confirmEmail

use axum::extract::State;
use serde_json::{json, Value};
use tracing::info;

use crate::database::{into_record, RecordExt, Table};
use crate::error::ApiError;
use crate::handlers::JsonBody;
use crate::middleware::{ok, ApiResult};
use crate::state::AppState;

pub async fn confirm_email(State(state): State<AppState>, JsonBody(body): JsonBody) -> ApiResult {
    let key = body
        .get("key")
        .and_then(Value::as_str)
        .filter(|k| !k.is_empty())
        .ok_or_else(|| ApiError::bad_request("Please provide registration key"))?;

    let user = state
        .store
        .select_one(Table::AuthUser, json!({ "registration_key": key }))
        .await?
        .ok_or_else(|| ApiError::bad_request("Invalid registration key"))?;
    let user_id = user.id().ok_or_else(|| ApiError::bad_request("Invalid registration key"))?;

    state
        .store
        .update(Table::AuthUser, json!({ "id": user_id }), into_record(json!({ "registration_key": null })))
        .await?;

    info!("User #{} confirmed their email", user_id);
    ok()
}
