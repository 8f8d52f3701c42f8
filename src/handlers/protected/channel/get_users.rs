// handlers/protected/channel/get_users.rs - POST /api/channel/getUsers

use std::collections::HashMap;

use axum::{extract::State, Extension};
use serde_json::{json, Map, Value};

use crate::database::{RecordExt, Table};
use crate::error::ApiError;
use crate::filter::FilterData;
use crate::handlers::JsonBody;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::middleware::auth::ROLE_OFFICE_ADMIN;
use crate::projection::FieldSet;
use crate::state::AppState;
use crate::validation::int_field;

/// Password and key columns are not part of the set, so they never leave the API.
pub const USER_FIELDS: FieldSet = FieldSet::new(
    &[
        "id",
        "first_name",
        "last_name",
        "email",
        "username",
        "country_code",
        "mobile",
        "language",
        "channelId",
        "is_active",
        "partymaster_ref",
        "registration_id",
        "role",
    ],
    &["role"],
);

pub async fn get_users(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    JsonBody(body): JsonBody,
) -> ApiResult {
    let mut conditions = Map::new();
    match body.get("id") {
        None | Some(Value::Null) => {}
        Some(_) => {
            let id = int_field(&body, "id").ok_or_else(|| ApiError::bad_request("Invalid id"))?;
            conditions.insert("id".into(), json!(id));
        }
    }
    if let Some(email) = body.get("email").and_then(Value::as_str).filter(|e| !e.is_empty()) {
        conditions.insert("email".into(), json!(email.trim().to_lowercase()));
    }
    let selection = USER_FIELDS
        .parse_value(body.get("fields"))
        .map_err(|_| ApiError::bad_request("Invalid fields"))?;

    // Office admins manage the whole directory; channel admins only their channel.
    if !caller.is_admin() && !caller.has_role(ROLE_OFFICE_ADMIN) {
        match caller.channel_id {
            Some(channel_id) => {
                conditions.insert("channelId".into(), json!(channel_id));
            }
            None => return Ok(ApiResponse::success(json!([]))),
        }
    }

    let mut users = state
        .store
        .select(Table::AuthUser, FilterData::matching(Value::Object(conditions)).order_by("id asc"))
        .await?;

    if selection.contains("role") {
        let ids: Vec<i64> = users.iter().filter_map(|u| u.id()).collect();
        let mut by_user: HashMap<i64, Vec<Value>> = HashMap::new();
        if !ids.is_empty() {
            let memberships = state
                .store
                .select(Table::AuthMembership, FilterData::matching(json!({ "user_id": { "$in": ids } })).order_by("id asc"))
                .await?;
            for m in memberships {
                if let Some(user_id) = m.i64_field("user_id") {
                    by_user.entry(user_id).or_default().push(json!({
                        "id": m.value("id"),
                        "user_id": user_id,
                        "group_id": m.value("group_id"),
                    }));
                }
            }
        }
        for user in users.iter_mut() {
            let roles = user.id().and_then(|id| by_user.remove(&id)).unwrap_or_default();
            user.insert("role".into(), Value::Array(roles));
        }
    }

    Ok(ApiResponse::success(Value::Array(selection.project_all(&users))))
}
