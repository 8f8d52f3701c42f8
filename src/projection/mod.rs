//! Field allow-lists. A `fields` parameter names the columns (real or virtual)
//! a caller wants back; `id` is always returned.

use serde_json::Value;

use crate::database::Record;
use crate::error::ApiError;

/// The fields an entity exposes and the ones left out unless asked for.
#[derive(Debug, Clone, Copy)]
pub struct FieldSet {
    pub all: &'static [&'static str],
    pub opt_in: &'static [&'static str],
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldsError {
    /// Not a JSON array of strings.
    Malformed,
    /// Names a field outside the set.
    Unknown(String),
}

impl FieldsError {
    /// Messages used by the master-data listings.
    pub fn into_api_error(self) -> ApiError {
        match self {
            FieldsError::Malformed => ApiError::bad_request("Fields param should be array of string"),
            FieldsError::Unknown(_) => ApiError::bad_request("Fields param array of strings are not valid"),
        }
    }
}

/// Resolved, ordered list of fields to return.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection(Vec<&'static str>);

impl FieldSet {
    pub const fn new(all: &'static [&'static str], opt_in: &'static [&'static str]) -> Self {
        Self { all, opt_in }
    }

    pub fn defaults(&self) -> Selection {
        Selection::with_id(self.all.iter().copied().filter(|f| !self.opt_in.contains(f)).collect())
    }

    /// Defaults plus some opt-in fields.
    pub fn with_opt_in(&self, extra: &[&str]) -> Selection {
        Selection::with_id(
            self.all
                .iter()
                .copied()
                .filter(|f| !self.opt_in.contains(f) || extra.contains(f))
                .collect(),
        )
    }

    pub fn resolve(&self, names: &[String]) -> Result<Selection, FieldsError> {
        if names.is_empty() {
            return Ok(self.defaults());
        }
        let mut fields = Vec::with_capacity(names.len());
        for name in names {
            let field = self
                .all
                .iter()
                .copied()
                .find(|f| *f == name)
                .ok_or_else(|| FieldsError::Unknown(name.clone()))?;
            if !fields.contains(&field) {
                fields.push(field);
            }
        }
        Ok(Selection::with_id(fields))
    }

    /// `fields` given as a JSON-encoded query parameter.
    pub fn parse_query(&self, raw: Option<&str>) -> Result<Selection, FieldsError> {
        match raw.map(str::trim).filter(|s| !s.is_empty()) {
            None => Ok(self.defaults()),
            Some(raw) => {
                let value: Value = serde_json::from_str(raw).map_err(|_| FieldsError::Malformed)?;
                self.parse_value(Some(&value))
            }
        }
    }

    /// `fields` given inside a JSON body.
    pub fn parse_value(&self, value: Option<&Value>) -> Result<Selection, FieldsError> {
        match value {
            None | Some(Value::Null) => Ok(self.defaults()),
            Some(Value::Array(items)) => {
                let names = items
                    .iter()
                    .map(|v| v.as_str().map(str::to_string))
                    .collect::<Option<Vec<_>>>()
                    .ok_or(FieldsError::Malformed)?;
                self.resolve(&names)
            }
            Some(_) => Err(FieldsError::Malformed),
        }
    }
}

impl Selection {
    fn with_id(mut fields: Vec<&'static str>) -> Self {
        if !fields.contains(&"id") {
            fields.insert(0, "id");
        }
        Selection(fields)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.iter().any(|f| *f == field)
    }

    pub fn fields(&self) -> &[&'static str] {
        &self.0
    }

    /// Copy the selected keys out of `record`; absent keys become null.
    pub fn project(&self, record: &Record) -> Record {
        self.0
            .iter()
            .map(|f| (f.to_string(), record.get(*f).cloned().unwrap_or(Value::Null)))
            .collect()
    }

    pub fn project_all(&self, records: &[Record]) -> Vec<Value> {
        records.iter().map(|r| Value::Object(self.project(r))).collect()
    }
}

/// Keep only `columns` of `record`, in that order. An empty list keeps everything.
pub fn columns(record: &Record, columns: &[&str]) -> Record {
    if columns.is_empty() {
        return record.clone();
    }
    columns
        .iter()
        .map(|c| (c.to_string(), record.get(*c).cloned().unwrap_or(Value::Null)))
        .collect()
}
