// handlers/protected/masterdata/project_inventory.rs - GET /api/masterdata/projectInventory

use axum::extract::{Query, State};
use rust_decimal::{prelude::FromPrimitive, Decimal, RoundingStrategy};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::database::{as_i64, DatabaseError, Record, RecordStore, Table};
use crate::error::ApiError;
use crate::filter::FilterData;
use crate::middleware::{ApiResponse, ApiResult};
use crate::projection::FieldSet;
use crate::relations::{self, PAYMENT_SCHEDULE};
use crate::state::AppState;
use crate::validation::numeric_param;

pub const INVENTORY_FIELDS: FieldSet = FieldSet::new(
    &[
        "id",
        "unit_no",
        "version",
        "projectId",
        "floor",
        "unit_type",
        "beds",
        "carpark",
        "title_deed_area_sqm",
        "interior_work_area_sqm",
        "overseas_price",
        "local_price",
        "unit_status",
        "paymentScheduleId",
        "total_area_sqm",
        "marketing_cmp_unitpage",
    ],
    &["total_area_sqm", "marketing_cmp_unitpage"],
);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryQuery {
    pub id: Option<String>,
    pub project_id: Option<String>,
    pub fields: Option<String>,
}

pub async fn get_project_inventory(State(state): State<AppState>, Query(query): Query<InventoryQuery>) -> ApiResult {
    let missing = || ApiError::bad_request("please provide id or projectId");
    let id = numeric_param(query.id.as_deref()).map_err(|_| missing())?;
    let project_id = numeric_param(query.project_id.as_deref()).map_err(|_| missing())?;
    if id.is_none() && project_id.is_none() {
        return Err(missing());
    }
    let selection = INVENTORY_FIELDS
        .parse_query(query.fields.as_deref())
        .map_err(|e| e.into_api_error())?;

    let where_clause = match (id, project_id) {
        (Some(id), _) => json!({ "id": id }),
        (None, Some(project_id)) => json!({ "projectId": project_id }),
        (None, None) => return Err(missing()),
    };
    let mut rows = state
        .store
        .select(Table::ProjectInventory, FilterData::matching(where_clause).order_by("id asc"))
        .await?;

    if selection.contains("paymentScheduleId") {
        relations::expand(state.store.as_ref(), &mut rows, &PAYMENT_SCHEDULE).await?;
    }
    if selection.contains("total_area_sqm") {
        for row in rows.iter_mut() {
            let total = total_area(row);
            row.insert("total_area_sqm".into(), total);
        }
    }
    if selection.contains("marketing_cmp_unitpage") {
        for row in rows.iter_mut() {
            let expanded = expand_unit_page(state.store.as_ref(), row.get("marketing_cmp_unitpage")).await?;
            row.insert("marketing_cmp_unitpage".into(), expanded);
        }
    }

    let projected = selection.project_all(&rows);
    match id {
        Some(_) => projected
            .into_iter()
            .next()
            .map(ApiResponse::success)
            .ok_or_else(|| ApiError::not_found("Project inventory not found")),
        None => Ok(ApiResponse::success(Value::Array(projected))),
    }
}

/// Title deed plus interior work area, rounded to two decimals.
pub fn total_area(row: &Record) -> Value {
    let area = |key: &str| {
        row.get(key)
            .and_then(|v| match v {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.parse().ok(),
                _ => None,
            })
            .and_then(Decimal::from_f64)
            .unwrap_or_default()
    };
    let total = (area("title_deed_area_sqm") + area("interior_work_area_sqm"))
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    total.to_string().parse::<f64>().map(Value::from).unwrap_or(Value::Null)
}

/// Each section of a unit page maps to media ids; replace them with media rows.
async fn expand_unit_page(store: &dyn RecordStore, page: Option<&Value>) -> Result<Value, DatabaseError> {
    let Some(Value::Object(sections)) = page else {
        return Ok(page.cloned().unwrap_or(Value::Null));
    };
    let mut out = Map::new();
    for (section, ids) in sections {
        let expanded = match ids {
            Value::Array(items) => {
                let ids: Vec<i64> = items.iter().filter_map(as_i64).collect();
                let media = relations::media_with_files(store, &ids).await?;
                Value::Array(media.into_iter().map(Value::Object).collect())
            }
            other => other.clone(),
        };
        out.insert(section.clone(), expanded);
    }
    Ok(Value::Object(out))
}
