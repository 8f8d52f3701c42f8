//! In-process [`RecordStore`] used by the test-suite and `fulcrum serve --memory`.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::manager::DatabaseError;
use super::record::{into_record, Record, RecordExt, Table};
use super::store::{require_predicate, RecordStore};
use crate::filter::{matcher, FilterData};

#[derive(Default)]
pub struct MemoryRecordStore {
    tables: RwLock<HashMap<Table, Vec<Record>>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the contents of `table`. Rows keep the ids they are given.
    pub async fn seed(&self, table: Table, rows: Vec<Value>) {
        let mut tables = self.tables.write().await;
        tables.insert(table, rows.into_iter().map(into_record).collect());
    }

    /// Snapshot of a table ordered by id.
    pub async fn rows(&self, table: Table) -> Vec<Record> {
        let tables = self.tables.read().await;
        let mut rows = tables.get(&table).cloned().unwrap_or_default();
        rows.sort_by_key(|r| r.id().unwrap_or(i64::MAX));
        rows
    }

    fn next_id(rows: &[Record]) -> i64 {
        rows.iter().filter_map(|r| r.id()).max().unwrap_or(0) + 1
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn select(&self, table: Table, filter: FilterData) -> Result<Vec<Record>, DatabaseError> {
        let rows = {
            let tables = self.tables.read().await;
            tables.get(&table).cloned().unwrap_or_default()
        };
        Ok(matcher::apply(rows, &filter)?)
    }

    async fn insert(&self, table: Table, mut record: Record) -> Result<Record, DatabaseError> {
        let mut tables = self.tables.write().await;
        let rows = tables.entry(table).or_default();
        match record.id() {
            Some(id) if rows.iter().any(|r| r.id() == Some(id)) => {
                return Err(DatabaseError::QueryError(format!("duplicate key {} in {}", id, table)));
            }
            Some(_) => {}
            None => {
                record.insert("id".to_string(), Value::from(Self::next_id(rows)));
            }
        }
        rows.push(record.clone());
        Ok(record)
    }

    async fn update(&self, table: Table, where_clause: Value, changes: Record) -> Result<u64, DatabaseError> {
        require_predicate(&where_clause)?;
        let mut tables = self.tables.write().await;
        let mut count = 0;
        if let Some(rows) = tables.get_mut(&table) {
            for row in rows.iter_mut() {
                if matcher::matches(row, &where_clause)? {
                    for (k, v) in &changes {
                        row.insert(k.clone(), v.clone());
                    }
                    count += 1;
                }
            }
        }
        Ok(count)
    }

    async fn delete(&self, table: Table, where_clause: Value) -> Result<u64, DatabaseError> {
        require_predicate(&where_clause)?;
        let mut tables = self.tables.write().await;
        let Some(rows) = tables.get_mut(&table) else { return Ok(0) };
        let before = rows.len();
        let mut kept = Vec::with_capacity(before);
        for row in rows.drain(..) {
            if !matcher::matches(&row, &where_clause)? {
                kept.push(row);
            }
        }
        *rows = kept;
        Ok((before - rows.len()) as u64)
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}
