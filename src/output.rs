//! JSON text rendering of query results.
//!
//! Values go through [`value_to_json`] and are written by `serde_json`, so
//! every JSON surface formats numbers the same way. Both compact and
//! pretty-printed formats are supported. Objects keep
//! their insertion order, so projected and aggregated records print their
//! fields in the order the operators produced them.
//!
//! Values without a JSON counterpart are rendered as:
//!
//! - **Dates** - ISO-8601 strings with millisecond precision
//! - **Regular expressions** - their source text as a string
//! - **Non-finite floats** - `null`
//!
//! # Examples
//!
//! ```
//! use rql::Value;
//! use rql::output::{to_json, to_json_pretty};
//!
//! let value = Value::from(vec![1, 2]);
//!
//! assert_eq!(to_json(&value), "[1,2]");
//! assert_eq!(to_json_pretty(&value), "[\n  1,\n  2\n]");
//! ```

use crate::value::{Value, iso_text};

/// Convert a query Value to serde_json::Value; dates become ISO strings and
/// regular expressions their source
pub fn value_to_json(v: &Value) -> serde_json::Value {
    match v {
        Value::Null => serde_json::Value::Null,
        Value::Boolean(b) => serde_json::Value::Bool(*b),
        Value::Integer(i) => serde_json::Value::Number((*i).into()),
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Date(d) => serde_json::Value::String(iso_text(d)),
        Value::Regex(p) => serde_json::Value::String(p.source().to_string()),
        Value::Array(arr) => serde_json::Value::Array(arr.iter().map(value_to_json).collect()),
        Value::Object(obj) => serde_json::Value::Object(
            obj.iter().map(|(k, v)| (k.clone(), value_to_json(v))).collect(),
        ),
    }
}

/// Compact JSON text, no whitespace.
///
/// # Examples
///
/// ```
/// use rql::Value;
/// use rql::output::to_json;
/// use indexmap::IndexMap;
///
/// let mut obj = IndexMap::new();
/// obj.insert("name".to_string(), Value::from("ten"));
/// obj.insert("price".to_string(), Value::Integer(10));
///
/// assert_eq!(to_json(&Value::Object(obj)), r#"{"name":"ten","price":10}"#);
/// ```
pub fn to_json(value: &Value) -> String {
    value_to_json(value).to_string()
}

/// Pretty-printed JSON text with 2-space indentation
pub fn to_json_pretty(value: &Value) -> String {
    format!("{:#}", value_to_json(value))
}
