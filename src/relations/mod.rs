//! Foreign-key expansion. Each call issues one `$in` query for the whole batch
//! of records, so a listing costs one query per relation level.

use std::collections::HashMap;

use serde_json::{json, Value};
use tracing::debug;

use crate::database::{as_i64, DatabaseError, Record, RecordExt, RecordStore, Table};
use crate::filter::FilterData;
use crate::projection::columns;

/// A foreign key column and the shape it expands to.
#[derive(Debug, Clone, Copy)]
pub struct Relation {
    pub key: &'static str,
    pub table: Table,
    /// Columns kept from the target row; empty keeps the whole row.
    pub columns: &'static [&'static str],
}

pub const PROJECT_REGION: Relation = Relation { key: "region", table: Table::Region, columns: &["id", "name", "currency"] };
pub const PROJECT_COMMISSION_SCHEME: Relation =
    Relation { key: "commissionSchemeId", table: Table::CommissionScheme, columns: &["id", "name"] };
pub const PAYMENT_SCHEDULE: Relation = Relation { key: "paymentScheduleId", table: Table::PaymentSchedule, columns: &[] };
pub const AUDIT_USER: Relation =
    Relation { key: "userId", table: Table::AuthUser, columns: &["id", "first_name", "last_name", "email"] };
pub const SLOGAN: Relation =
    Relation { key: "sloganTransId", table: Table::Translation, columns: &["id", "en", "zh-CN", "zh-HK"] };
pub const HERO_BANNER: Relation = Relation { key: "heroBannerId", table: Table::ProjectMedia, columns: &[] };
pub const MEDIA_FILE: Relation = Relation { key: "fileId", table: Table::File, columns: &["id", "filename", "type", "bucket"] };
pub const MEDIA_FILE_TAGGED: Relation =
    Relation { key: "fileId", table: Table::File, columns: &["id", "filename", "type", "bucket", "tag"] };

fn distinct_ids<'a>(values: impl Iterator<Item = &'a Value>) -> Vec<i64> {
    let mut ids: Vec<i64> = values.filter_map(as_i64).collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

async fn rows_by_id(store: &dyn RecordStore, table: Table, ids: &[i64]) -> Result<HashMap<i64, Record>, DatabaseError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = store.select(table, FilterData::matching(json!({ "id": { "$in": ids } }))).await?;
    Ok(rows.into_iter().filter_map(|r| r.id().map(|id| (id, r))).collect())
}

/// Replace `relation.key` on every record with the referenced row, or null.
pub async fn expand(store: &dyn RecordStore, records: &mut [Record], relation: &Relation) -> Result<(), DatabaseError> {
    let ids = distinct_ids(records.iter().filter_map(|r| r.get(relation.key)));
    debug!("Expanding {} -> {} ({} ids)", relation.key, relation.table, ids.len());
    let targets = rows_by_id(store, relation.table, &ids).await?;

    for record in records.iter_mut() {
        let Some(current) = record.get(relation.key) else { continue };
        let expanded = as_i64(current)
            .and_then(|id| targets.get(&id))
            .map(|row| Value::Object(columns(row, relation.columns)))
            .unwrap_or(Value::Null);
        record.insert(relation.key.to_string(), expanded);
    }
    Ok(())
}

/// Rows of `table` for `ids`, in the order given. Unknown ids are dropped.
pub async fn expand_ids(
    store: &dyn RecordStore,
    table: Table,
    ids: &[i64],
    keep: &[&str],
) -> Result<Vec<Record>, DatabaseError> {
    let mut unique = ids.to_vec();
    unique.sort_unstable();
    unique.dedup();
    let targets = rows_by_id(store, table, &unique).await?;
    Ok(ids.iter().filter_map(|id| targets.get(id)).map(|row| columns(row, keep)).collect())
}

/// Attach the first `child_table` row whose `foreign_key` points at each
/// parent, under `as_key`. Parents without a child get null.
pub async fn attach_child(
    store: &dyn RecordStore,
    parents: &mut [Record],
    child_table: Table,
    foreign_key: &str,
    as_key: &str,
) -> Result<(), DatabaseError> {
    let parent_ids = distinct_ids(parents.iter().filter_map(|p| p.get("id")));
    let mut by_parent: HashMap<i64, Record> = HashMap::new();
    if !parent_ids.is_empty() {
        let children = store
            .select(child_table, FilterData::matching(json!({ foreign_key: { "$in": parent_ids } })).order_by("id asc"))
            .await?;
        for child in children {
            if let Some(parent) = child.i64_field(foreign_key) {
                by_parent.entry(parent).or_insert(child);
            }
        }
    }

    for parent in parents.iter_mut() {
        let child = parent.id().and_then(|id| by_parent.remove(&id)).map(Value::Object).unwrap_or(Value::Null);
        parent.insert(as_key.to_string(), child);
    }
    Ok(())
}

/// Media rows for `ids` (order kept, unknown dropped) with `fileId` expanded
/// including the file tag.
pub async fn media_with_files(store: &dyn RecordStore, ids: &[i64]) -> Result<Vec<Record>, DatabaseError> {
    let mut media = expand_ids(store, Table::ProjectMedia, ids, &[]).await?;
    expand(store, &mut media, &MEDIA_FILE_TAGGED).await?;
    Ok(media)
}

/// Move the objects stored under `key` out of `records`, remembering where
/// each came from. Pair with [`restore_nested`].
pub fn take_nested(records: &mut [Record], key: &str) -> (Vec<usize>, Vec<Record>) {
    let mut slots = Vec::new();
    let mut inner = Vec::new();
    for (i, record) in records.iter_mut().enumerate() {
        if let Some(Value::Object(obj)) = record.get_mut(key) {
            slots.push(i);
            inner.push(std::mem::take(obj));
        }
    }
    (slots, inner)
}

pub fn restore_nested(records: &mut [Record], key: &str, slots: Vec<usize>, inner: Vec<Record>) {
    for (i, obj) in slots.into_iter().zip(inner) {
        records[i].insert(key.to_string(), Value::Object(obj));
    }
}

/// Expand `relation` inside the objects stored under `key`, such as the
/// `marketing` row attached to each project.
pub async fn expand_nested(
    store: &dyn RecordStore,
    records: &mut [Record],
    key: &str,
    relation: &Relation,
) -> Result<(), DatabaseError> {
    let (slots, mut inner) = take_nested(records, key);
    expand(store, &mut inner, relation).await?;
    restore_nested(records, key, slots, inner);
    Ok(())
}
