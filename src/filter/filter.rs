use serde_json::Value;

use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{FilterData, FilterOrderInfo, SqlResult};

pub struct Filter {
    table_name: String,
    select_columns: Vec<String>,
    where_data: Option<Value>,
    order_data: Vec<FilterOrderInfo>,
    limit: Option<i32>,
    offset: Option<i32>,
}

impl Filter {
    pub fn new(table_name: impl Into<String>) -> Result<Self, FilterError> {
        let table_name = table_name.into();
        validate_identifier(&table_name).map_err(|_| FilterError::InvalidTableName(table_name.clone()))?;
        Ok(Self {
            table_name,
            select_columns: vec![],
            where_data: None,
            order_data: vec![],
            limit: None,
            offset: None,
        })
    }

    pub fn assign(&mut self, data: FilterData) -> Result<&mut Self, FilterError> {
        if let Some(select) = data.select { self.select(select)?; }
        if let Some(where_clause) = data.where_clause { self.where_clause(where_clause)?; }
        if let Some(order) = data.order { self.order(order)?; }
        if let Some(limit) = data.limit { self.limit(limit, data.offset)?; }
        Ok(self)
    }

    pub fn select(&mut self, columns: Vec<String>) -> Result<&mut Self, FilterError> {
        for column in &columns {
            if column != "*" { validate_identifier(column)?; }
        }
        self.select_columns = columns;
        Ok(self)
    }

    pub fn where_clause(&mut self, conditions: Value) -> Result<&mut Self, FilterError> {
        FilterWhere::validate(&conditions)?;
        self.where_data = Some(conditions);
        Ok(self)
    }

    pub fn order(&mut self, order_spec: Value) -> Result<&mut Self, FilterError> {
        let order_info = FilterOrder::validate_and_parse(&order_spec)?;
        for info in &order_info { validate_identifier(&info.column)?; }
        self.order_data = order_info;
        Ok(self)
    }

    pub fn limit(&mut self, limit: i32, offset: Option<i32>) -> Result<&mut Self, FilterError> {
        if limit < 0 { return Err(FilterError::InvalidLimit("Limit must be non-negative".to_string())); }
        if let Some(off) = offset { if off < 0 { return Err(FilterError::InvalidOffset("Offset must be non-negative".to_string())); } }
        self.limit = Some(limit);
        self.offset = offset;
        Ok(self)
    }

    pub fn to_sql(&self) -> Result<SqlResult, FilterError> {
        let select_clause = self.build_select_clause();
        let where_result = self.to_where_sql(0)?;
        let order_clause = FilterOrder::generate(&self.order_data)?;
        let limit_clause = self.build_limit_clause();

        let query = [
            format!("SELECT {}", select_clause),
            format!("FROM {}", quote_identifier(&self.table_name)),
            if where_result.query.is_empty() { String::new() } else { format!("WHERE {}", where_result.query) },
            order_clause,
            limit_clause,
        ].into_iter().filter(|s| !s.is_empty()).collect::<Vec<_>>().join(" ");

        Ok(SqlResult { query, params: where_result.params })
    }

    /// WHERE predicate alone, numbering placeholders after `starting_param_index`.
    pub fn to_where_sql(&self, starting_param_index: usize) -> Result<SqlResult, FilterError> {
        let (query, params) = match self.where_data {
            Some(ref where_data) => FilterWhere::generate(where_data, starting_param_index)?,
            None => (String::new(), vec![]),
        };
        Ok(SqlResult { query, params })
    }

    fn build_select_clause(&self) -> String {
        if self.select_columns.is_empty() || self.select_columns.iter().any(|c| c == "*") {
            "*".to_string()
        } else {
            self.select_columns.iter().map(|c| quote_identifier(c)).collect::<Vec<_>>().join(", ")
        }
    }

    fn build_limit_clause(&self) -> String {
        match (self.limit, self.offset) {
            (Some(l), Some(o)) => format!("LIMIT {} OFFSET {}", l, o),
            (Some(l), None) => format!("LIMIT {}", l),
            (None, Some(o)) => format!("OFFSET {}", o),
            _ => String::new(),
        }
    }
}

/// Column and table names may hold letters, digits, `_` and `-` (e.g. `zh-CN`).
pub fn validate_identifier(name: &str) -> Result<(), FilterError> {
    let mut chars = name.chars();
    let valid_start = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
    if !valid_start || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
        return Err(FilterError::InvalidColumn(format!("Invalid column name format: {}", name)));
    }
    Ok(())
}

pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn select_with_where_order_and_limit() {
        let mut filter = Filter::new("project_inventory").unwrap();
        filter
            .assign(
                FilterData::matching(json!({"projectId": 1, "unit_status": {"$ne": "Sold"}}))
                    .with_select(&["id", "unit_no"])
                    .order_by("id desc")
                    .with_limit(10),
            )
            .unwrap();

        let sql = filter.to_sql().unwrap();
        assert_eq!(
            sql.query,
            "SELECT \"id\", \"unit_no\" FROM \"project_inventory\" WHERE \"projectId\" = $1 AND \"unit_status\" <> $2 ORDER BY \"id\" DESC LIMIT 10"
        );
        assert_eq!(sql.params, vec![json!(1), json!("Sold")]);
    }

    #[test]
    fn where_placeholders_continue_from_offset() {
        let mut filter = Filter::new("template").unwrap();
        filter.where_clause(json!({"k": "a", "lang": "en"})).unwrap();
        let sql = filter.to_where_sql(1).unwrap();
        assert_eq!(sql.query, "\"k\" = $2 AND \"lang\" = $3");
    }

    #[test]
    fn in_with_empty_list_matches_nothing() {
        let mut filter = Filter::new("region").unwrap();
        filter.where_clause(json!({"id": {"$in": []}})).unwrap();
        assert_eq!(filter.to_sql().unwrap().query, "SELECT * FROM \"region\" WHERE 1=0");
    }

    #[test]
    fn logical_operators_nest() {
        let mut filter = Filter::new("auth_user").unwrap();
        filter
            .where_clause(json!({"$or": [{"id": 1}, {"email": "a@b.c"}], "is_active": true}))
            .unwrap();
        let sql = filter.to_sql().unwrap();
        assert_eq!(
            sql.query,
            "SELECT * FROM \"auth_user\" WHERE ((\"id\" = $1) OR (\"email\" = $2)) AND \"is_active\" = $3"
        );
        assert_eq!(sql.params.len(), 3);
    }

    #[test]
    fn rejects_unsafe_identifiers() {
        assert!(Filter::new("users; drop table x").is_err());
        assert!(validate_identifier("zh-CN").is_ok());
        assert!(validate_identifier("1abc").is_err());
    }
}
