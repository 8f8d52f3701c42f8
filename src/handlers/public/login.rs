// handlers/public/login.rs - POST /api/channel/login

use axum::extract::State;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::auth::{self, verify_password};
use crate::database::{RecordExt, Table};
use crate::error::ApiError;
use crate::handlers::JsonBody;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

pub async fn login(State(state): State<AppState>, JsonBody(body): JsonBody) -> ApiResult {
    let (Some(email), Some(password)) = (text(&body, "email"), text(&body, "password")) else {
        return Err(ApiError::bad_request("Please provide email and password"));
    };
    let email = email.trim().to_lowercase();

    let invalid = || ApiError::bad_request("Invalid email or password");
    let user = state
        .store
        .select_one(Table::AuthUser, json!({ "email": email }))
        .await?
        .ok_or_else(invalid)?;

    let hash = user.str_field("password").ok_or_else(invalid)?;
    if !verify_password(password, hash).unwrap_or(false) {
        warn!("Failed login for {}", email);
        return Err(invalid());
    }
    if user.bool_field("is_active") != Some(true) {
        return Err(ApiError::unauthorized("Unauthorized"));
    }

    let user_id = user.id().ok_or_else(invalid)?;
    info!("User #{} logged in", user_id);
    let jwt = auth::issue_token(&state.config.security, user_id)?;
    Ok(ApiResponse::success(json!({ "jwt": jwt })))
}

fn text<'a>(body: &'a Value, key: &str) -> Option<&'a str> {
    body.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}
