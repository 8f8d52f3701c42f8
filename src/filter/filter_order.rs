use serde_json::Value;

use super::error::FilterError;
use super::filter::quote_identifier;
use super::types::{FilterOrderInfo, SortDirection};

pub struct FilterOrder;

impl FilterOrder {
    pub fn validate_and_parse(order: &Value) -> Result<Vec<FilterOrderInfo>, FilterError> {
        match order {
            Value::String(s) => Ok(Self::parse_order_string(s)),
            // ["time desc", "id asc"]
            Value::Array(arr) => Ok(arr
                .iter()
                .filter_map(Value::as_str)
                .flat_map(Self::parse_order_string)
                .collect()),
            // { "time": "desc", "id": "asc" }
            Value::Object(obj) => Ok(obj
                .iter()
                .map(|(k, v)| FilterOrderInfo {
                    column: k.clone(),
                    sort: Self::direction(v.as_str().unwrap_or("asc")),
                })
                .collect()),
            Value::Null => Ok(vec![]),
            _ => Err(FilterError::InvalidOperatorData("order must be a string, array or object".to_string())),
        }
    }

    fn parse_order_string(s: &str) -> Vec<FilterOrderInfo> {
        s.split(',')
            .filter_map(|part| {
                let mut it = part.split_whitespace();
                let column = it.next()?;
                Some(FilterOrderInfo { column: column.to_string(), sort: Self::direction(it.next().unwrap_or("asc")) })
            })
            .collect()
    }

    fn direction(dir: &str) -> SortDirection {
        if dir.eq_ignore_ascii_case("desc") { SortDirection::Desc } else { SortDirection::Asc }
    }

    pub fn generate(infos: &[FilterOrderInfo]) -> Result<String, FilterError> {
        if infos.is_empty() { return Ok(String::new()); }
        let parts: Vec<String> = infos
            .iter()
            .map(|i| format!("{} {}", quote_identifier(&i.column), i.sort.to_sql()))
            .collect();
        Ok(format!("ORDER BY {}", parts.join(", ")))
    }
}
