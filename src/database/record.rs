use serde_json::{Map, Value};

/// A database row as returned to handlers: column name to JSON value.
pub type Record = Map<String, Value>;

/// Tables known to the API. Column names are used verbatim (quoted in SQL).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    AuthUser,
    AuthGroup,
    AuthMembership,
    Channel,
    Region,
    CommissionScheme,
    CommissionSchemeDetail,
    Project,
    PaymentSchedule,
    ProjectInventory,
    ProjectMarketing,
    ProjectMedia,
    File,
    Translation,
    Template,
    InventorySyncAudit,
}

impl Table {
    pub fn name(self) -> &'static str {
        match self {
            Table::AuthUser => "auth_user",
            Table::AuthGroup => "auth_group",
            Table::AuthMembership => "auth_membership",
            Table::Channel => "channel",
            Table::Region => "region",
            Table::CommissionScheme => "commission_scheme",
            Table::CommissionSchemeDetail => "commission_scheme_detail",
            Table::Project => "project",
            Table::PaymentSchedule => "payment_schedule",
            Table::ProjectInventory => "project_inventory",
            Table::ProjectMarketing => "project_marketing",
            Table::ProjectMedia => "project_media",
            Table::File => "file",
            Table::Translation => "translation",
            Table::Template => "template",
            Table::InventorySyncAudit => "project_inventory_sync_audit",
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Typed accessors over JSON rows
pub trait RecordExt {
    fn id(&self) -> Option<i64>;
    fn i64_field(&self, key: &str) -> Option<i64>;
    fn str_field(&self, key: &str) -> Option<&str>;
    fn bool_field(&self, key: &str) -> Option<bool>;
    fn value(&self, key: &str) -> Value;
}

impl RecordExt for Record {
    fn id(&self) -> Option<i64> {
        self.i64_field("id")
    }

    fn i64_field(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(as_i64)
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    fn bool_field(&self, key: &str) -> Option<bool> {
        match self.get(key)? {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => n.as_i64().map(|n| n != 0),
            _ => None,
        }
    }

    fn value(&self, key: &str) -> Value {
        self.get(key).cloned().unwrap_or(Value::Null)
    }
}

/// Integer view of a JSON number, accepting whole floats such as `3.0`.
pub fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64().filter(|f| f.fract() == 0.0 && f.is_finite()).map(|f| f as i64)
        }),
        _ => None,
    }
}

/// Convert a `json!({...})` literal into a record; non-objects become empty.
pub fn into_record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
