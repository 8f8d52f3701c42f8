//! In-process evaluation of filter data against JSON records.
//!
//! Mirrors the SQL generated by [`super::filter_where::FilterWhere`] closely enough
//! for the memory store: NULL never compares equal to a value, `$in` on an empty
//! list matches nothing, `$like` understands `%` and `_`.

use std::cmp::Ordering;

use regex::RegexBuilder;
use serde_json::{Map, Value};

use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{FilterData, FilterOp, SortDirection};

pub fn matches(record: &Map<String, Value>, where_data: &Value) -> Result<bool, FilterError> {
    let Value::Object(obj) = where_data else {
        return match where_data {
            Value::Null => Ok(true),
            _ => Err(FilterError::InvalidWhereClause("WHERE must be an object".to_string())),
        };
    };

    for (key, value) in obj {
        let passed = match key.as_str() {
            "$and" => all_of(record, value)?,
            "$or" => any_of(record, value)?,
            "$not" => !matches(record, value)?,
            k if k.starts_with('$') => return Err(FilterError::UnsupportedOperator(k.to_string())),
            _ => true,
        };
        if !passed { return Ok(false); }
    }

    for condition in FilterWhere::parse_conditions(where_data)? {
        let field = record.get(&condition.column).unwrap_or(&Value::Null);
        if !test(field, &condition.operator, &condition.data)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Apply where, order, offset, limit and select to a set of records.
pub fn apply(records: Vec<Map<String, Value>>, data: &FilterData) -> Result<Vec<Map<String, Value>>, FilterError> {
    let where_data = data.where_clause.clone().unwrap_or(Value::Null);
    let mut out = Vec::new();
    for record in records {
        if matches(&record, &where_data)? {
            out.push(record);
        }
    }

    if let Some(order) = &data.order {
        let infos = FilterOrder::validate_and_parse(order)?;
        out.sort_by(|a, b| {
            for info in &infos {
                let left = a.get(&info.column).unwrap_or(&Value::Null);
                let right = b.get(&info.column).unwrap_or(&Value::Null);
                let ord = compare_for_sort(left, right);
                let ord = if info.sort == SortDirection::Desc { ord.reverse() } else { ord };
                if ord != Ordering::Equal { return ord; }
            }
            Ordering::Equal
        });
    }

    let offset = data.offset.unwrap_or(0).max(0) as usize;
    let limit = data.limit.map(|l| l.max(0) as usize).unwrap_or(usize::MAX);
    let mut out: Vec<_> = out.into_iter().skip(offset).take(limit).collect();

    if let Some(select) = &data.select {
        if !select.iter().any(|c| c == "*") {
            for record in out.iter_mut() {
                record.retain(|k, _| select.contains(k));
            }
        }
    }
    Ok(out)
}

fn all_of(record: &Map<String, Value>, value: &Value) -> Result<bool, FilterError> {
    let arr = value.as_array().ok_or_else(|| FilterError::InvalidOperatorData("$and requires array".to_string()))?;
    for v in arr {
        if !matches(record, v)? { return Ok(false); }
    }
    Ok(true)
}

fn any_of(record: &Map<String, Value>, value: &Value) -> Result<bool, FilterError> {
    let arr = value.as_array().ok_or_else(|| FilterError::InvalidOperatorData("$or requires array".to_string()))?;
    for v in arr {
        if matches(record, v)? { return Ok(true); }
    }
    Ok(false)
}

fn test(field: &Value, op: &FilterOp, data: &Value) -> Result<bool, FilterError> {
    Ok(match op {
        FilterOp::Eq if data.is_null() => field.is_null(),
        FilterOp::Ne if data.is_null() => !field.is_null(),
        FilterOp::Eq => compare(field, data) == Some(Ordering::Equal),
        FilterOp::Ne => matches!(compare(field, data), Some(o) if o != Ordering::Equal),
        FilterOp::Gt => compare(field, data) == Some(Ordering::Greater),
        FilterOp::Gte => matches!(compare(field, data), Some(Ordering::Greater | Ordering::Equal)),
        FilterOp::Lt => compare(field, data) == Some(Ordering::Less),
        FilterOp::Lte => matches!(compare(field, data), Some(Ordering::Less | Ordering::Equal)),
        FilterOp::Like | FilterOp::ILike => {
            let (Some(text), Some(pattern)) = (field.as_str(), data.as_str()) else { return Ok(false) };
            like(text, pattern, *op == FilterOp::ILike)?
        }
        FilterOp::In | FilterOp::NIn => {
            let found = match data {
                Value::Array(values) => values.iter().any(|v| compare(field, v) == Some(Ordering::Equal)),
                other => compare(field, other) == Some(Ordering::Equal),
            };
            if *op == FilterOp::In { found } else { !field.is_null() && !found }
        }
        FilterOp::Between => match data {
            Value::Array(values) if values.len() == 2 => {
                matches!(compare(field, &values[0]), Some(Ordering::Greater | Ordering::Equal))
                    && matches!(compare(field, &values[1]), Some(Ordering::Less | Ordering::Equal))
            }
            _ => return Err(FilterError::InvalidOperatorData("$between requires array with 2 values".to_string())),
        },
    })
}

/// SQL-style comparison: `None` when either side is NULL or the types differ.
pub fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Array(_), Value::Array(_)) | (Value::Object(_), Value::Object(_)) => {
            if left == right { Some(Ordering::Equal) } else { None }
        }
        _ => None,
    }
}

// Postgres sorts NULLs last in ascending order.
fn compare_for_sort(left: &Value, right: &Value) -> Ordering {
    match (left.is_null(), right.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        _ => compare(left, right).unwrap_or(Ordering::Equal),
    }
}

fn like(text: &str, pattern: &str, case_insensitive: bool) -> Result<bool, FilterError> {
    let mut expr = String::from("^");
    for c in pattern.chars() {
        match c {
            '%' => expr.push_str(".*"),
            '_' => expr.push('.'),
            other => expr.push_str(&regex::escape(&other.to_string())),
        }
    }
    expr.push('$');
    let re = RegexBuilder::new(&expr)
        .case_insensitive(case_insensitive)
        .dot_matches_new_line(true)
        .build()
        .map_err(|e| FilterError::InvalidOperatorData(e.to_string()))?;
    Ok(re.is_match(text))
}
