// handlers/protected/channel/profile.rs - GET /api/channel/getProfile

use axum::{extract::State, Extension};
use serde_json::{json, Value};

use super::representative::{self, Pages};
use crate::airtable;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

pub async fn get_profile(State(state): State<AppState>, Extension(caller): Extension<AuthUser>) -> ApiResult {
    let email = representative::profile_email(&state, &caller).await?;
    let rep = representative::find(&state, &email, Pages::First).await?;
    let channel = representative::channel_record(&state, &rep)
        .await
        .map_err(|e| ApiError::internal_server_error(e.to_string()))?;

    let rep_fields = airtable::fields(&rep);
    let channel_fields = airtable::fields(&channel);
    let field = |key: &str| channel_fields.get(key).cloned().unwrap_or(Value::Null);

    Ok(ApiResponse::success(json!({
        "email": email,
        "channelRep": rep_fields.get("Name").cloned().unwrap_or(Value::Null),
        "tradingName": field("Trading Name 常用稱呼"),
        "companyName": field("Company Name 公司註冊名稱"),
        "businessAddress": field("Business Address"),
    })))
}
