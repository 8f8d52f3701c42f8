// handlers/protected/channel/create_user.rs - POST /api/channel/createUser

use axum::{extract::State, Extension};
use serde_json::json;

use crate::auth;
use crate::database::RecordExt;
use crate::error::ApiError;
use crate::handlers::{onboarding, JsonBody};
use crate::middleware::{ApiResponse, ApiResult, AuthUser, Tenant};
use crate::state::AppState;
use crate::validation::validate_new_user;

/// Channel admins add plain channel users to their own channel.
pub async fn create_user(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    tenant: Tenant,
    JsonBody(body): JsonBody,
) -> ApiResult {
    let user = validate_new_user(&body)?;
    onboarding::ensure_email_available(&state, &user.email).await?;
    let channel_id = caller
        .channel_id
        .ok_or_else(|| ApiError::bad_request("Channel not found"))?;

    let created = onboarding::create_user(&state, &user, channel_id, &[state.config.channel.user_role_id]).await?;
    let user_id = created
        .id()
        .ok_or_else(|| ApiError::internal_server_error("User was not created"))?;

    onboarding::send_registration_email(&state, &tenant, &created).await;

    let jwt = auth::issue_token(&state.config.security, user_id)?;
    Ok(ApiResponse::success(json!({ "jwt": jwt })))
}
