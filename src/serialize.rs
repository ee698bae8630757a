//! Canonical text rendering of query trees.
//!
//! The rendering round-trips through the parser: `parse(query.to_string())`
//! rebuilds a structurally equal tree.
//!
//! # Examples
//!
//! ```
//! use rql::parse;
//!
//! let query = parse("price=lt=10&sort(-price)").unwrap();
//! assert_eq!(query.to_string(), "lt(price,10)&sort(-price)");
//! ```

use std::fmt;

use crate::ast::{Arg, Query};
use crate::coerce::{Converter, percent_encode};
use crate::output::to_json;
use crate::value::Value;

impl fmt::Display for Query {
    /// The root conjunction renders without an enclosing call: `and` joins
    /// its terms with `&`, a multi-term `or` with `|`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name.as_str() {
            "and" => write_joined(f, &self.args, "&"),
            "or" if self.args.len() > 1 => write_joined(f, &self.args, "|"),
            _ => write_call(f, self),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, args: &[Arg], separator: &str) -> fmt::Result {
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            f.write_str(separator)?;
        }
        write_arg(f, arg)?;
    }
    Ok(())
}

fn write_call(f: &mut fmt::Formatter<'_>, query: &Query) -> fmt::Result {
    write!(f, "{}(", query.name)?;
    write_joined(f, &query.args, ",")?;
    f.write_str(")")
}

fn write_arg(f: &mut fmt::Formatter<'_>, arg: &Arg) -> fmt::Result {
    match arg {
        Arg::Value(value) => f.write_str(&encode_value(value)),
        Arg::Call(query) => write_call(f, query),
        Arg::Tuple(items) => {
            f.write_str("(")?;
            write_joined(f, items, ",")?;
            f.write_str(")")
        }
        // $0 reads back as null, which is also what it binds to
        Arg::Param(0) => f.write_str("null"),
        Arg::Param(n) => write!(f, "${}", n),
    }
}

/// Render a literal so that the default converter reads it back unchanged.
///
/// The value is written bare when that already holds, otherwise with an
/// explicit converter prefix (`string:10`, `number:10.0`, `epoch:0`,
/// `re:^a`, `RE:^a`).
pub fn encode_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::Integer(n) => n.to_string(),
        Value::Float(n) => {
            let text = if n.is_finite() {
                format!("{:?}", n)
            } else {
                value.as_string()
            };
            prefixed_unless_auto(value, "number", text)
        }
        Value::String(s) => prefixed_unless_auto(value, "string", percent_encode(s)),
        Value::Date(d) => format!("epoch:{}", d.timestamp_millis()),
        Value::Regex(pattern) => {
            let converter = if pattern.case_insensitive() { "re" } else { "RE" };
            format!("{}:{}", converter, percent_encode(pattern.source()))
        }
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(encode_value).collect();
            format!("({})", items.join(","))
        }
        Value::Object(_) => format!("string:{}", percent_encode(&to_json(value))),
    }
}

fn prefixed_unless_auto(value: &Value, converter: &str, text: String) -> String {
    match Converter::Auto.convert(&text) {
        Ok(ref read_back) if read_back == value => text,
        _ => format!("{}:{}", converter, text),
    }
}
