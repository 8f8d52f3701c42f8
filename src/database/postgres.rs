//! Postgres implementation of [`RecordStore`].
//!
//! Reads wrap the generated SELECT in `to_jsonb` so rows arrive as JSON maps.
//! Writes pass the whole record as one jsonb parameter and let
//! `jsonb_populate_record` coerce each value to its column type.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{postgres::PgArguments, PgPool, Postgres, Row};
use tracing::debug;

use super::manager::{DatabaseError, DatabaseManager};
use super::record::{Record, Table};
use super::store::{require_predicate, RecordStore};
use crate::filter::{quote_identifier, validate_identifier, Filter, FilterData, SqlResult};

pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn where_sql(table: Table, where_clause: Value, starting_param_index: usize) -> Result<SqlResult, DatabaseError> {
        require_predicate(&where_clause)?;
        let mut filter = Filter::new(table.name())?;
        filter.where_clause(where_clause)?;
        Ok(filter.to_where_sql(starting_param_index)?)
    }

    fn quoted_columns(record: &Record) -> Result<Vec<String>, DatabaseError> {
        record
            .keys()
            .map(|k| validate_identifier(k).map(|_| quote_identifier(k)).map_err(DatabaseError::from))
            .collect()
    }

    async fn fetch_records(&self, sql: &str, params: &[Value]) -> Result<Vec<Record>, DatabaseError> {
        debug!("{} {:?}", sql, params);
        let mut q = sqlx::query(sql);
        for p in params {
            q = bind_param(q, p);
        }
        let rows = q.fetch_all(&self.pool).await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            match row.try_get::<Value, _>(0)? {
                Value::Object(map) => out.push(map),
                other => return Err(DatabaseError::QueryError(format!("expected a JSON row, got {}", other))),
            }
        }
        Ok(out)
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn select(&self, table: Table, filter_data: FilterData) -> Result<Vec<Record>, DatabaseError> {
        let mut filter = Filter::new(table.name())?;
        filter.assign(filter_data)?;
        let sql = filter.to_sql()?;
        let query = format!("SELECT to_jsonb(t) FROM ({}) t", sql.query);
        self.fetch_records(&query, &sql.params).await
    }

    async fn insert(&self, table: Table, record: Record) -> Result<Record, DatabaseError> {
        let relation = quote_identifier(table.name());
        let query = if record.is_empty() {
            format!(
                "WITH inserted AS (INSERT INTO {relation} DEFAULT VALUES RETURNING *) SELECT to_jsonb(inserted) FROM inserted"
            )
        } else {
            let columns = Self::quoted_columns(&record)?.join(", ");
            format!(
                "WITH inserted AS (INSERT INTO {relation} ({columns}) SELECT {columns} FROM jsonb_populate_record(NULL::{relation}, $1) RETURNING *) SELECT to_jsonb(inserted) FROM inserted"
            )
        };
        let params = if record.is_empty() { vec![] } else { vec![Value::Object(record)] };

        self.fetch_records(&query, &params)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DatabaseError::QueryError(format!("insert into {} returned no row", table)))
    }

    async fn update(&self, table: Table, where_clause: Value, changes: Record) -> Result<u64, DatabaseError> {
        if changes.is_empty() {
            return Ok(0);
        }
        let relation = quote_identifier(table.name());
        let assignments = Self::quoted_columns(&changes)?
            .into_iter()
            .map(|c| format!("{c} = (SELECT {c} FROM jsonb_populate_record(NULL::{relation}, $1))"))
            .collect::<Vec<_>>()
            .join(", ");
        let where_result = Self::where_sql(table, where_clause, 1)?;
        let query = format!("UPDATE {relation} SET {assignments} WHERE {}", where_result.query);

        debug!("{} {:?}", query, where_result.params);
        let changes = Value::Object(changes);
        let mut q = sqlx::query(&query).bind(&changes);
        for p in &where_result.params {
            q = bind_param(q, p);
        }
        Ok(q.execute(&self.pool).await?.rows_affected())
    }

    async fn delete(&self, table: Table, where_clause: Value) -> Result<u64, DatabaseError> {
        let where_result = Self::where_sql(table, where_clause, 0)?;
        let query = format!("DELETE FROM {} WHERE {}", quote_identifier(table.name()), where_result.query);

        debug!("{} {:?}", query, where_result.params);
        let mut q = sqlx::query(&query);
        for p in &where_result.params {
            q = bind_param(q, p);
        }
        Ok(q.execute(&self.pool).await?.rows_affected())
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }
}

fn bind_param<'q>(
    q: sqlx::query::Query<'q, Postgres, PgArguments>,
    v: &'q Value,
) -> sqlx::query::Query<'q, Postgres, PgArguments> {
    match v {
        Value::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => q.bind(s.as_str()),
        Value::Array(_) | Value::Object(_) => q.bind(v),
    }
}
