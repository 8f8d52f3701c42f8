// handlers/protected/channel/block_user.rs - POST /api/channel/blockUser

use axum::{extract::State, Extension};
use serde_json::{json, Value};
use tracing::info;

use crate::database::{into_record, RecordExt, Table};
use crate::error::ApiError;
use crate::handlers::JsonBody;
use crate::middleware::{ok, ApiResult, AuthUser};
use crate::state::AppState;
use crate::validation::int_field;

pub async fn block_user(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    JsonBody(body): JsonBody,
) -> ApiResult {
    let id = int_field(&body, "id").ok_or_else(|| ApiError::bad_request(r#"Please provide user's "id""#))?;
    let is_block = body
        .get("isBlock")
        .and_then(Value::as_bool)
        .ok_or_else(|| ApiError::bad_request(r#"Please provide "isBlock" param"#))?;
    if id == caller.id {
        return Err(ApiError::bad_request("User cannot block/unblock himself"));
    }

    let missing = || ApiError::bad_request(format!("User with #id = {} does not exist", id));
    let target = state.store.select_by_id(Table::AuthUser, id).await?.ok_or_else(missing)?;
    if !caller.is_admin() && (caller.channel_id.is_none() || target.i64_field("channelId") != caller.channel_id) {
        return Err(missing());
    }

    state
        .store
        .update(Table::AuthUser, json!({ "id": id }), into_record(json!({ "is_active": !is_block })))
        .await?;

    info!("User #{} {} user #{}", caller.id, if is_block { "blocked" } else { "unblocked" }, id);
    ok()
}
