// handlers/public/register.rs - POST /api/channel/register

use axum::extract::State;
use serde_json::{json, Value};
use tracing::{error, info};

use crate::airtable::{self, AirtableQuery};
use crate::auth;
use crate::database::{into_record, RecordExt, Table};
use crate::error::ApiError;
use crate::handlers::{onboarding, JsonBody};
use crate::middleware::{ApiResponse, ApiResult, Tenant};
use crate::services::CaptchaError;
use crate::state::AppState;
use crate::validation::validate_new_user;

/// Self-service signup for channel representatives listed in Airtable.
///
/// Creates a channel owned by the new user, grants the channel admin and
/// channel user roles, sends the confirmation email and returns `{jwt}`.
pub async fn register(State(state): State<AppState>, tenant: Tenant, JsonBody(body): JsonBody) -> ApiResult {
    verify_captcha(&state, &body).await?;
    let user = validate_new_user(&body)?;
    let representative = find_representative(&state, &user.email).await?;
    onboarding::ensure_email_available(&state, &user.email).await?;

    let channel = state
        .store
        .insert(
            Table::Channel,
            into_record(json!({
                "airTableId": airtable::first_link(&representative, "Channels"),
                "userId": null,
                "created_on": onboarding::timestamp_now(),
            })),
        )
        .await?;
    let channel_id = channel
        .id()
        .ok_or_else(|| ApiError::internal_server_error("Channel was not created"))?;

    let roles = [state.config.channel.admin_role_id, state.config.channel.user_role_id];
    let created = onboarding::create_user(&state, &user, channel_id, &roles).await?;
    let user_id = created
        .id()
        .ok_or_else(|| ApiError::internal_server_error("User was not created"))?;

    state
        .store
        .update(Table::Channel, json!({ "id": channel_id }), into_record(json!({ "userId": user_id })))
        .await?;

    onboarding::send_registration_email(&state, &tenant, &created).await;

    info!("Registered channel #{} for {}", channel_id, user.email);
    let jwt = auth::issue_token(&state.config.security, user_id)?;
    Ok(ApiResponse::success(json!({ "jwt": jwt })))
}

async fn verify_captcha(state: &AppState, body: &Value) -> Result<(), ApiError> {
    if state.config.captcha.allow_bypass && body.get("passCaptcha") == Some(&Value::Bool(true)) {
        return Ok(());
    }
    let token = body
        .get("token")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::internal_server_error("bad request - no token provided in body"))?;

    state.captcha.verify(token).await.map_err(|e| {
        if let CaptchaError::Request(msg) = &e {
            error!("Captcha verification failed: {}", msg);
        }
        ApiError::internal_server_error(format!("bad request - {}", e))
    })
}

async fn find_representative(state: &AppState, email: &str) -> Result<Value, ApiError> {
    let query = AirtableQuery::formula(airtable::formula_eq("Email", email));
    let records = state
        .airtable
        .first_page(airtable::CHANNEL_REPRESENTATIVE, &query)
        .await
        .map_err(|e| {
            error!("Representative lookup for {} failed: {}", email, e);
            ApiError::internal_server_error("Airtable query error")
        })?;

    match records {
        Value::Null | Value::Bool(false) => Err(not_a_representative()),
        Value::Array(mut list) => {
            if list.is_empty() {
                Err(not_a_representative())
            } else {
                Ok(list.swap_remove(0))
            }
        }
        _ => Err(ApiError::internal_server_error("Airtable error, expecting Array but return something else")),
    }
}

fn not_a_representative() -> ApiError {
    ApiError::forbidden("User is not a valid channel representative")
}
