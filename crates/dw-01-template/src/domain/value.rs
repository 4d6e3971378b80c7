//! # Template Values
//!
//! The data model a template is rendered against. Records and lists nest;
//! every leaf renders to text.

use chrono::{DateTime, Local, TimeZone, Utc};
use std::collections::BTreeMap;

/// A record of named values. Keys are visited in sorted order.
pub type Record = BTreeMap<String, Value>;

/// A value that can be substituted into a template.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Renders as the empty string.
    Null,
    /// `true` / `false`.
    Bool(bool),
    /// Integer or float, rendered the way JSON prints it.
    Number(serde_json::Number),
    /// Text, substituted verbatim.
    Text(String),
    /// Point in time, rendered in the local timezone.
    Date(DateTime<Utc>),
    /// Sequence; elements are addressed as `path[index]`.
    List(Vec<Value>),
    /// Nested record; fields are addressed as `path.key`.
    Record(Record),
}

impl Value {
    /// A date value from unix seconds. Out-of-range input yields `Null`.
    pub fn date_from_timestamp(secs: i64) -> Self {
        match Utc.timestamp_opt(secs, 0).single() {
            Some(dt) => Value::Date(dt),
            None => Value::Null,
        }
    }

    /// Text form of a leaf value; `None` for lists and records.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Value::Null => Some(String::new()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Number(n) => Some(n.to_string()),
            Value::Text(s) => Some(s.clone()),
            Value::Date(dt) => Some(format_date(dt)),
            Value::List(_) | Value::Record(_) => None,
        }
    }
}

/// Local-time textual form of a date.
pub fn format_date(dt: &DateTime<Utc>) -> String {
    dt.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Local-time textual form of unix seconds, if representable.
pub fn format_timestamp(secs: i64) -> Option<String> {
    Utc.timestamp_opt(secs, 0).single().map(|dt| format_date(&dt))
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n),
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Record(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n.into())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}
