// handlers/protected/log.rs - GET /api/log/projectInventorySyncAudit

use std::collections::HashSet;

use axum::extract::{Query, State};
use chrono::{DateTime, NaiveDateTime};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::database::{Record, Table};
use crate::error::ApiError;
use crate::filter::FilterData;
use crate::middleware::{ApiResponse, ApiResult};
use crate::projection::FieldSet;
use crate::relations::{self, AUDIT_USER};
use crate::state::AppState;
use crate::validation::numeric_param;

pub const AUDIT_FIELDS: FieldSet =
    FieldSet::new(&["id", "time", "userId", "projectId", "status", "message"], &[]);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditQuery {
    pub project_id: Option<String>,
    pub fields: Option<String>,
    pub only_last_per_project: Option<String>,
}

pub async fn project_inventory_sync_audit(State(state): State<AppState>, Query(query): Query<AuditQuery>) -> ApiResult {
    let selection = AUDIT_FIELDS
        .parse_query(query.fields.as_deref())
        .map_err(|e| e.into_api_error())?;
    let project_id = numeric_param(query.project_id.as_deref())
        .map_err(|_| ApiError::bad_request("projectId should be a number"))?;
    let only_last = query.only_last_per_project.as_deref() == Some("true");

    let mut conditions = Map::new();
    if let Some(project_id) = project_id {
        conditions.insert("projectId".into(), json!(project_id));
    }
    let order = if only_last { "time desc" } else { "id asc" };
    let mut rows = state
        .store
        .select(Table::InventorySyncAudit, FilterData::matching(Value::Object(conditions)).order_by(order))
        .await?;

    if only_last {
        rows = latest_per_project(rows);
    }

    relations::expand(state.store.as_ref(), &mut rows, &AUDIT_USER).await?;
    for row in rows.iter_mut() {
        if let Some(time) = row.get("time").and_then(Value::as_str).map(format_time) {
            row.insert("time".into(), Value::String(time));
        }
    }

    Ok(ApiResponse::success(Value::Array(selection.project_all(&rows))))
}

/// Keep the first row seen for each project; input is ordered newest first.
fn latest_per_project(rows: Vec<Record>) -> Vec<Record> {
    let mut seen = HashSet::new();
    rows.into_iter()
        .filter(|r| seen.insert(r.get("projectId").map(Value::to_string).unwrap_or_default()))
        .collect()
}

/// `YYYY-MM-DD HH:MM:SS` from the timestamp shapes Postgres and fixtures produce.
pub fn format_time(raw: &str) -> String {
    const OUT: &str = "%Y-%m-%d %H:%M:%S";
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.naive_utc().format(OUT).to_string();
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, pattern) {
            return dt.format(OUT).to_string();
        }
    }
    raw.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::into_record;

    #[test]
    fn time_formats() {
        assert_eq!(format_time("2024-03-01T08:15:30.123456"), "2024-03-01 08:15:30");
        assert_eq!(format_time("2024-03-01T08:15:30Z"), "2024-03-01 08:15:30");
        assert_eq!(format_time("2024-03-01 08:15:30"), "2024-03-01 08:15:30");
        assert_eq!(format_time("yesterday"), "yesterday");
    }

    #[test]
    fn latest_row_wins_per_project() {
        let rows = vec![
            into_record(json!({"id": 3, "projectId": 1})),
            into_record(json!({"id": 2, "projectId": 2})),
            into_record(json!({"id": 1, "projectId": 1})),
        ];
        let ids: Vec<_> = latest_per_project(rows).iter().map(|r| r["id"].clone()).collect();
        assert_eq!(ids, vec![json!(3), json!(2)]);
    }
}
