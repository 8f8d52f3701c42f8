// handlers/protected/channel/agreements.rs - GET /api/channel/listAgreements

use axum::{extract::State, Extension};
use serde_json::{json, Value};

use super::representative::{self, Pages};
use crate::airtable::{self, CHANNEL_AGREEMENTS};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

pub async fn list_agreements(State(state): State<AppState>, Extension(caller): Extension<AuthUser>) -> ApiResult {
    let fail = |e: crate::airtable::AirtableError| ApiError::internal_server_error(e.to_string());

    let email = representative::profile_email(&state, &caller).await?;
    let rep = representative::find(&state, &email, Pages::First).await?;
    let channel = representative::channel_record(&state, &rep).await.map_err(fail)?;
    let trading_name = representative::trading_name(&channel);

    let agreements = representative::for_channel(&state, CHANNEL_AGREEMENTS, &trading_name)
        .await
        .map_err(fail)?;
    let names = representative::project_names(&state, representative::linked_ids(&agreements, "Project"))
        .await
        .map_err(fail)?;

    let data: Vec<Value> = agreements
        .iter()
        .map(|agreement| {
            let mut fields = airtable::fields(agreement).clone();
            if let Value::Object(map) = &mut fields {
                if map.contains_key("Project") {
                    map.insert("Project".into(), representative::names_for(agreement, "Project", &names));
                }
            }
            fields
        })
        .collect();

    Ok(ApiResponse::success(json!({ "data": data })))
}
