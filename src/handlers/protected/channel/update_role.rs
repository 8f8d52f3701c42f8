// handlers/protected/channel/update_role.rs - POST /api/channel/updateRole

use axum::extract::State;
use serde_json::{json, Value};
use tracing::info;

use crate::database::{into_record, Table};
use crate::error::ApiError;
use crate::handlers::JsonBody;
use crate::middleware::{ok, ApiResult};
use crate::state::AppState;
use crate::validation::int_field;

#[derive(Debug)]
enum RoleChange {
    Insert { user_id: i64, group_id: i64 },
    Update { id: i64, user_id: i64, group_id: i64 },
    Delete { id: i64 },
}

/// Insert, update or delete memberships. Every entry is checked before any
/// change is written.
pub async fn update_role(State(state): State<AppState>, JsonBody(body): JsonBody) -> ApiResult {
    let entries = body
        .get("entries")
        .and_then(Value::as_array)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| ApiError::bad_request(r#"Please provide the "entries" data array"#))?;

    let mut changes = Vec::with_capacity(entries.len());
    for entry in entries {
        changes.push(check_entry(&state, entry).await?);
    }

    for change in changes {
        info!("Applying membership change {:?}", change);
        match change {
            RoleChange::Insert { user_id, group_id } => {
                state
                    .store
                    .insert(Table::AuthMembership, into_record(json!({ "user_id": user_id, "group_id": group_id })))
                    .await?;
            }
            RoleChange::Update { id, user_id, group_id } => {
                state
                    .store
                    .update(
                        Table::AuthMembership,
                        json!({ "id": id }),
                        into_record(json!({ "user_id": user_id, "group_id": group_id })),
                    )
                    .await?;
            }
            RoleChange::Delete { id } => {
                state.store.delete(Table::AuthMembership, json!({ "id": id })).await?;
            }
        }
    }
    ok()
}

async fn check_entry(state: &AppState, entry: &Value) -> Result<RoleChange, ApiError> {
    let id = int_field(entry, "id");

    if entry.get("isDelete") == Some(&Value::Bool(true)) {
        return match id {
            Some(id) if state.store.exists(Table::AuthMembership, id).await? => Ok(RoleChange::Delete { id }),
            _ => Err(ApiError::bad_request("Auth membership id not found for delete")),
        };
    }

    let (Some(user_id), Some(group_id)) = (int_field(entry, "user_id"), int_field(entry, "group_id")) else {
        return Err(ApiError::bad_request("Invalid role parameters provided"));
    };
    if !state.store.exists(Table::AuthUser, user_id).await? {
        return Err(ApiError::bad_request("User not found"));
    }
    if !state.store.exists(Table::AuthGroup, group_id).await? {
        return Err(ApiError::bad_request("Group not found"));
    }

    match (entry.get("id"), id) {
        (None | Some(Value::Null), _) => Ok(RoleChange::Insert { user_id, group_id }),
        (_, Some(id)) if state.store.exists(Table::AuthMembership, id).await? => {
            Ok(RoleChange::Update { id, user_id, group_id })
        }
        _ => Err(ApiError::bad_request("Auth membership id not found for update")),
    }
}
