use async_trait::async_trait;
use serde_json::{json, Value};

use super::manager::DatabaseError;
use super::record::{Record, Table};
use crate::filter::FilterData;

/// Row storage used by every handler.
///
/// `where_clause` arguments use the filter language (`{"id": 3}`,
/// `{"id": {"$in": [..]}}`). Updates and deletes refuse an empty predicate.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn select(&self, table: Table, filter: FilterData) -> Result<Vec<Record>, DatabaseError>;

    /// Insert a row and return it as stored, including the generated id.
    async fn insert(&self, table: Table, record: Record) -> Result<Record, DatabaseError>;

    async fn update(&self, table: Table, where_clause: Value, changes: Record) -> Result<u64, DatabaseError>;

    async fn delete(&self, table: Table, where_clause: Value) -> Result<u64, DatabaseError>;

    async fn health_check(&self) -> Result<(), DatabaseError>;

    async fn select_where(&self, table: Table, where_clause: Value) -> Result<Vec<Record>, DatabaseError> {
        self.select(table, FilterData::matching(where_clause).order_by("id asc")).await
    }

    async fn select_one(&self, table: Table, where_clause: Value) -> Result<Option<Record>, DatabaseError> {
        let rows = self
            .select(table, FilterData::matching(where_clause).order_by("id asc").with_limit(1))
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn select_by_id(&self, table: Table, id: i64) -> Result<Option<Record>, DatabaseError> {
        self.select_one(table, json!({ "id": id })).await
    }

    async fn exists(&self, table: Table, id: i64) -> Result<bool, DatabaseError> {
        Ok(self.select_by_id(table, id).await?.is_some())
    }

    /// True when every id in `ids` names an existing row.
    async fn all_exist(&self, table: Table, ids: &[i64]) -> Result<bool, DatabaseError> {
        let mut unique = ids.to_vec();
        unique.sort_unstable();
        unique.dedup();
        if unique.is_empty() {
            return Ok(true);
        }
        let rows = self
            .select(table, FilterData::matching(json!({ "id": { "$in": unique } })).with_select(&["id"]))
            .await?;
        Ok(rows.len() == unique.len())
    }
}

pub(crate) fn require_predicate(where_clause: &Value) -> Result<(), DatabaseError> {
    match where_clause {
        Value::Object(obj) if !obj.is_empty() => Ok(()),
        _ => Err(DatabaseError::QueryError("refusing to modify rows without a predicate".to_string())),
    }
}
