// handlers/protected/channel/sales.rs - GET /api/channel/listAllSales

use std::collections::HashMap;

use axum::{extract::State, Extension};
use serde_json::{json, Value};

use super::representative::{self, Pages};
use crate::airtable::{self, AirtableError, CHANNEL_AGREEMENTS, SALES_STATUS};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

/// Every sales order of the caller's channel with project names and the
/// contract ids of the agreements it was sold under.
pub async fn list_all_sales(State(state): State<AppState>, Extension(caller): Extension<AuthUser>) -> ApiResult {
    if caller.channel_id.is_none() {
        return Err(ApiError::bad_request("Profile not found"));
    }
    let fail = |e: AirtableError| ApiError::internal_server_error(format!("Database query error: {}", e));

    let email = representative::profile_email(&state, &caller).await?;
    let rep = representative::find(&state, &email, Pages::All).await?;
    let channel = representative::channel_record(&state, &rep).await.map_err(fail)?;
    let trading_name = representative::trading_name(&channel);

    let agreements = representative::for_channel(&state, CHANNEL_AGREEMENTS, &trading_name)
        .await
        .map_err(fail)?;
    let contract_ids: HashMap<String, Value> = agreements
        .iter()
        .filter_map(|a| {
            let id = a.get("id")?.as_str()?.to_string();
            Some((id, airtable::fields(a).get("Contract ID").cloned().unwrap_or(Value::Null)))
        })
        .collect();

    let sales = representative::for_channel(&state, SALES_STATUS, &trading_name)
        .await
        .map_err(fail)?;
    let names = representative::project_names(&state, representative::linked_ids(&sales, "Link Project"))
        .await
        .map_err(fail)?;

    let rows: Vec<Value> = sales
        .iter()
        .map(|sale| {
            let fields = airtable::fields(sale);
            let field = |key: &str| fields.get(key).cloned().unwrap_or(Value::Null);
            let applied = fields
                .get("Applied Project Agreement")
                .and_then(Value::as_array)
                .map(|links| {
                    links
                        .iter()
                        .filter_map(Value::as_str)
                        .filter_map(|id| contract_ids.get(id))
                        .map(|c| match c {
                            Value::String(s) => s.clone(),
                            other => other.to_string(),
                        })
                        .collect::<Vec<_>>()
                        .join(", ")
                })
                .unwrap_or_default();

            json!({
                "Sales Order": field("Order ID"),
                "Project": representative::names_for(sale, "Link Project", &names),
                "Channel": trading_name,
                "Commission Status": field("Agency Eligibility"),
                "Reserve Date": field("Reserve Date"),
                "Transacted Price": field("Transacted Price"),
                "Paid Percentage": field("Paid Percentage"),
                "SPA post date": field("SPA post date"),
                "Applied Project Agreement": applied,
            })
        })
        .collect();

    Ok(ApiResponse::success(Value::Array(rows)))
}
