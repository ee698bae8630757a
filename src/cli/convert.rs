//! JSON <-> query Value conversion utilities

use serde_json::json;

use crate::ast::{Arg, Cache, Query};
use crate::value::Value;

pub use crate::output::value_to_json;

/// Convert serde_json::Value to a query Value
pub fn json_to_value(v: serde_json::Value) -> Value {
    match v {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Boolean(b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Integer(i),
            None => n.as_f64().map_or(Value::Null, Value::Float),
        },
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(arr) => Value::Array(arr.into_iter().map(json_to_value).collect()),
        serde_json::Value::Object(obj) => {
            Value::Object(obj.into_iter().map(|(k, v)| (k, json_to_value(v))).collect())
        }
    }
}

/// Tree shape as `{"name": ..., "args": [...]}`; tuples are arrays and
/// unbound parameters are `"$N"` strings
pub fn query_to_json(query: &Query) -> serde_json::Value {
    json!({
        "name": query.name,
        "args": args_to_json(&query.args),
    })
}

pub fn args_to_json(args: &[Arg]) -> serde_json::Value {
    serde_json::Value::Array(args.iter().map(arg_to_json).collect())
}

fn arg_to_json(arg: &Arg) -> serde_json::Value {
    match arg {
        Arg::Value(v) => value_to_json(v),
        Arg::Call(q) => query_to_json(q),
        Arg::Tuple(items) => args_to_json(items),
        Arg::Param(n) => serde_json::Value::String(format!("${}", n)),
    }
}

/// The root side-table: cached operator arguments plus the primary key
pub fn cache_to_json(cache: &Cache) -> serde_json::Value {
    let mut map = serde_json::Map::new();
    for operator in cache.operators() {
        let args = cache.get(operator).unwrap_or_default();
        map.insert(operator.to_string(), args_to_json(args));
    }
    if let (Some(field), Some(id)) = (cache.primary_key_field(), cache.primary_key()) {
        map.insert("primaryKey".to_string(), json!({ "field": field, "value": id }));
    }
    serde_json::Value::Object(map)
}
