// handlers/protected/masterdata/commission_scheme.rs - GET/POST /api/masterdata/commissionScheme

use std::collections::HashMap;

use axum::extract::State;
use serde_json::{json, Value};
use tracing::info;

use crate::database::{as_i64, into_record, Record, RecordExt, Table};
use crate::error::ApiError;
use crate::filter::FilterData;
use crate::handlers::JsonBody;
use crate::middleware::{ok, ApiResponse, ApiResult};
use crate::projection::columns;
use crate::state::AppState;
use crate::validation::{int_field, must_be_number, required_property};

const DETAIL_PROPS: [&str; 3] = ["paymentPercent", "commissionPercent", "paymentDueDay"];
const DETAIL_COLUMNS: [&str; 4] = ["id", "paymentPercent", "commissionPercent", "paymentDueDay"];

pub async fn get_commission_schemes(State(state): State<AppState>) -> ApiResult {
    let schemes = state.store.select_where(Table::CommissionScheme, json!({})).await?;
    let ids: Vec<i64> = schemes.iter().filter_map(|s| s.id()).collect();

    let mut details: HashMap<i64, Vec<Value>> = HashMap::new();
    if !ids.is_empty() {
        let rows = state
            .store
            .select(
                Table::CommissionSchemeDetail,
                FilterData::matching(json!({ "commissionSchemeId": { "$in": ids } })).order_by("id asc"),
            )
            .await?;
        for row in rows {
            if let Some(scheme_id) = row.i64_field("commissionSchemeId") {
                details.entry(scheme_id).or_default().push(Value::Object(columns(&row, &DETAIL_COLUMNS)));
            }
        }
    }

    let out: Vec<Value> = schemes
        .iter()
        .map(|s| {
            let scheme_details = s.id().and_then(|id| details.remove(&id)).unwrap_or_default();
            json!({ "id": s.value("id"), "name": s.value("name"), "scheme_details": scheme_details })
        })
        .collect();
    Ok(ApiResponse::success(Value::Array(out)))
}

struct SchemeInput<'a> {
    id: Option<i64>,
    name: &'a str,
    details: Vec<Record>,
}

fn check_scheme(entry: &Value) -> Result<SchemeInput<'_>, ApiError> {
    let name = entry.get("name").and_then(Value::as_str).filter(|n| !n.trim().is_empty());
    let raw_details = entry.get("scheme_details").and_then(Value::as_array);
    let (Some(name), Some(raw_details)) = (name, raw_details) else {
        return Err(ApiError::bad_request("Please provide name or scheme_details properly"));
    };

    let mut details = Vec::with_capacity(raw_details.len());
    for detail in raw_details {
        required_property(detail, &DETAIL_PROPS)?;
        let mut row = Record::new();
        for prop in DETAIL_PROPS {
            must_be_number(&detail[prop])?;
            if prop == "paymentDueDay" && as_i64(&detail[prop]).is_none() {
                return Err(ApiError::bad_request("must be integer"));
            }
            row.insert(prop.to_string(), detail[prop].clone());
        }
        details.push(row);
    }
    Ok(SchemeInput { id: int_field(entry, "id"), name, details })
}

/// Create or replace commission schemes together with their detail tiers.
pub async fn save_commission_schemes(State(state): State<AppState>, JsonBody(body): JsonBody) -> ApiResult {
    let list = body
        .get("list")
        .and_then(Value::as_array)
        .ok_or_else(|| ApiError::bad_request(r#"Please provide the "list" data array"#))?;

    let schemes = list.iter().map(check_scheme).collect::<Result<Vec<_>, _>>()?;
    for scheme in &schemes {
        if let Some(id) = scheme.id {
            if !state.store.exists(Table::CommissionScheme, id).await? {
                return Err(ApiError::bad_request("Commission scheme does not exist"));
            }
        }
    }

    for scheme in schemes {
        let scheme_id = match scheme.id {
            Some(id) => {
                state
                    .store
                    .update(Table::CommissionScheme, json!({ "id": id }), into_record(json!({ "name": scheme.name })))
                    .await?;
                state.store.delete(Table::CommissionSchemeDetail, json!({ "commissionSchemeId": id })).await?;
                id
            }
            None => state
                .store
                .insert(Table::CommissionScheme, into_record(json!({ "name": scheme.name })))
                .await?
                .id()
                .ok_or_else(|| ApiError::internal_server_error("Commission scheme was not created"))?,
        };

        for mut detail in scheme.details {
            detail.insert("commissionSchemeId".into(), json!(scheme_id));
            state.store.insert(Table::CommissionSchemeDetail, detail).await?;
        }
        info!("Saved commission scheme #{}", scheme_id);
    }
    ok()
}
