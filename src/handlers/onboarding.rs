// handlers/onboarding.rs - user creation shared by register and createUser

use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::hash_password;
use crate::database::{into_record, Record, RecordExt, Table};
use crate::error::ApiError;
use crate::middleware::Tenant;
use crate::services::{templates, EmailMessage};
use crate::state::AppState;
use crate::validation::NewUser;

pub fn timestamp_now() -> String {
    Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

pub async fn ensure_email_available(state: &AppState, email: &str) -> Result<(), ApiError> {
    if state.store.select_one(Table::AuthUser, json!({ "email": email })).await?.is_some() {
        return Err(ApiError::bad_request("Email is already taken"));
    }
    Ok(())
}

/// Insert the user row and one membership per group id.
pub async fn create_user(
    state: &AppState,
    user: &NewUser,
    channel_id: i64,
    group_ids: &[i64],
) -> Result<Record, ApiError> {
    let language = user.language.clone().unwrap_or_else(|| state.config.channel.default_language.clone());
    let row = into_record(json!({
        "first_name": user.first_name,
        "last_name": user.last_name,
        "email": user.email,
        "password": hash_password(&user.password)?,
        "registration_key": Uuid::new_v4().to_string(),
        "language": language,
        "channelId": channel_id,
        "is_active": true,
        "created_on": timestamp_now(),
    }));
    let created = state.store.insert(Table::AuthUser, row).await?;
    let user_id = created
        .id()
        .ok_or_else(|| ApiError::internal_server_error("User was not created"))?;

    for group_id in group_ids {
        state
            .store
            .insert(Table::AuthMembership, into_record(json!({ "user_id": user_id, "group_id": group_id })))
            .await?;
    }

    info!("Created user #{} in channel #{}", user_id, channel_id);
    Ok(created)
}

/// Send the confirmation email. Failures are logged and swallowed.
pub async fn send_registration_email(state: &AppState, tenant: &Tenant, user: &Record) {
    let text = |key: &str| user.str_field(key).unwrap_or_default().to_string();
    let (first_name, last_name, email) = (text("first_name"), text("last_name"), text("email"));
    let language = user
        .str_field("language")
        .map(str::to_string)
        .unwrap_or_else(|| state.config.channel.default_language.clone());
    let confirm_url = format!("{}?key={}", state.config.channel.email_confirm_url, text("registration_key"));

    let vars = [
        ("first_name", first_name.as_str()),
        ("last_name", last_name.as_str()),
        ("email", email.as_str()),
        ("confirm_url", confirm_url.as_str()),
    ];
    let default_language = &state.config.channel.default_language;
    let (subject, html_body) =
        match templates::registration_email(state.store.as_ref(), tenant.as_str(), &language, default_language, &vars).await {
            Ok(parts) => parts,
            Err(e) => {
                warn!("Could not load registration templates: {}", e);
                return;
            }
        };

    let message = EmailMessage { to: email, subject, html_body };
    if let Err(e) = state.mailer.send(&message).await {
        warn!("Registration email to {} failed: {}", message.to, e);
    }
}
