use std::cmp::Ordering;
use std::fmt::Write as _;

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use indexmap::IndexMap;
use regex::{Regex, RegexBuilder};

/// A value flowing through queries: literals produced by the parser,
/// records held in a collection, and results produced by operators.
///
/// Besides the JSON types, two scalar kinds exist that only literals can
/// produce: dates (from the `date:`, `isodate:` and `epoch:` converters) and
/// regular expressions (from `re:`, `RE:` and `glob:`).
///
/// # Type Preservation
///
/// Integers and floats are kept apart so that `10` and `number:10.0`
/// survive a serialize/parse round trip unchanged. Comparisons between the
/// two numeric kinds are done numerically.
///
/// # Examples
///
/// ```
/// use rql::Value;
/// use indexmap::IndexMap;
///
/// let price = Value::Integer(10);
/// let name = Value::String("ten".to_string());
///
/// let mut record = IndexMap::new();
/// record.insert("price".to_string(), price);
/// record.insert("name".to_string(), name);
/// let record = Value::Object(record);
///
/// assert_eq!(record.get("price"), Some(&Value::Integer(10)));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// JSON null, also stands in for "undefined"
    Null,

    /// JSON boolean (true/false)
    Boolean(bool),

    /// Floating-point number
    Float(f64),

    /// Integer number (preserved separately from floats)
    Integer(i64),

    /// UTF-8 string
    String(String),

    /// Point in time, millisecond precision
    Date(DateTime<Utc>),

    /// Compiled regular expression literal
    Regex(Pattern),

    /// Array of values (homogeneous or heterogeneous)
    Array(Vec<Value>),

    /// Object with insertion-ordered string keys
    Object(IndexMap<String, Value>),
}

/// A regular expression literal that remembers its case sensitivity.
///
/// Two patterns are equal when their source text and flag match.
#[derive(Debug, Clone)]
pub struct Pattern {
    regex: Regex,
    case_insensitive: bool,
}

impl Pattern {
    pub fn new(source: &str, case_insensitive: bool) -> Result<Self, regex::Error> {
        let regex = RegexBuilder::new(source)
            .case_insensitive(case_insensitive)
            .build()?;
        Ok(Pattern {
            regex,
            case_insensitive,
        })
    }

    /// The pattern text, without flags
    pub fn source(&self) -> &str {
        self.regex.as_str()
    }

    pub fn case_insensitive(&self) -> bool {
        self.case_insensitive
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.case_insensitive == other.case_insensitive && self.source() == other.source()
    }
}

impl Value {
    /// Truthiness as used for predicate results and optional flags
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Integer(n) => *n != 0,
            Value::Float(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Date(_) | Value::Regex(_) | Value::Array(_) | Value::Object(_) => true,
        }
    }

    /// Get as float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            Value::Date(d) => Some(d.timestamp_millis() as f64),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Look up a field of an object value
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Object(map) => map.get(key),
            _ => None,
        }
    }

    /// Render as plain text, the way a scalar is spliced into a pattern or key
    pub fn as_string(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::Integer(n) => n.to_string(),
            Value::Float(n) => number_text(*n),
            Value::String(s) => s.clone(),
            Value::Date(d) => iso_text(d),
            Value::Regex(p) => p.source().to_string(),
            Value::Array(items) => items
                .iter()
                .map(|v| v.as_string())
                .collect::<Vec<_>>()
                .join(","),
            Value::Object(_) => "[object Object]".to_string(),
        }
    }

    /// Human-readable type name, also used as a converter prefix
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) | Value::Float(_) => "number",
            Value::String(_) => "string",
            Value::Date(_) => "date",
            Value::Regex(_) => "regex",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    /// Equality with numeric cross-kind comparison (`10 == 10.0`)
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Float(b)) | (Value::Float(b), Value::Integer(a)) => {
                (*a as f64) == *b
            }
            (Value::Date(a), Value::Integer(b)) | (Value::Integer(b), Value::Date(a)) => {
                a.timestamp_millis() == *b
            }
            _ => self == other,
        }
    }

    /// Native ordering between comparable values, `None` when unordered
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
            (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
            (a, b) => match (a.numeric(), b.numeric()) {
                (Some(x), Some(y)) => x.partial_cmp(&y),
                _ => None,
            },
        }
    }

    /// Total order used for sorting.
    ///
    /// Kinds rank null, boolean, number, string, regex, array, object. Dates
    /// sit on the numeric scale at their epoch milliseconds and NaN sorts
    /// after every other number.
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        self.sort_rank().cmp(&other.sort_rank()).then_with(|| match (self, other) {
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Regex(a), Value::Regex(b)) => a.source().cmp(b.source()),
            (Value::Array(_), Value::Array(_)) | (Value::Object(_), Value::Object(_)) => {
                self.fingerprint().cmp(&other.fingerprint())
            }
            _ => match (self.sort_number(), other.sort_number()) {
                (Some(a), Some(b)) => a.order(b),
                _ => Ordering::Equal,
            },
        })
    }

    fn sort_rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Boolean(_) => 1,
            Value::Integer(_) | Value::Float(_) | Value::Date(_) => 2,
            Value::String(_) => 3,
            Value::Regex(_) => 4,
            Value::Array(_) => 5,
            Value::Object(_) => 6,
        }
    }

    fn sort_number(&self) -> Option<SortNumber> {
        match self {
            Value::Integer(n) => Some(SortNumber::Int(*n)),
            Value::Float(n) => Some(SortNumber::Float(*n)),
            Value::Date(d) => Some(SortNumber::Int(d.timestamp_millis())),
            _ => None,
        }
    }

    fn numeric(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            Value::Date(d) => Some(d.timestamp_millis() as f64),
            _ => None,
        }
    }

    /// Structural key for set membership; objects hash independently of key order
    pub fn fingerprint(&self) -> String {
        let mut out = String::new();
        self.write_fingerprint(&mut out);
        out
    }

    fn write_fingerprint(&self, out: &mut String) {
        match self {
            Value::Null => out.push('n'),
            Value::Boolean(b) => out.push(if *b { 't' } else { 'f' }),
            Value::Integer(n) => {
                let _ = write!(out, "i{};", n);
            }
            Value::Float(n) => {
                let _ = write!(out, "d{:?};", n);
            }
            Value::String(s) => {
                let _ = write!(out, "s{}:{}", s.len(), s);
            }
            Value::Date(d) => {
                let _ = write!(out, "D{};", d.timestamp_millis());
            }
            Value::Regex(p) => {
                let flag = if p.case_insensitive() { 'i' } else { 'c' };
                let _ = write!(out, "r{}{}:{}", flag, p.source().len(), p.source());
            }
            Value::Array(items) => {
                out.push('[');
                for item in items {
                    item.write_fingerprint(out);
                }
                out.push(']');
            }
            Value::Object(map) => {
                let mut keys: Vec<_> = map.keys().collect();
                keys.sort();
                out.push('{');
                for key in keys {
                    let _ = write!(out, "{}:{}", key.len(), key);
                    map[key.as_str()].write_fingerprint(out);
                }
                out.push('}');
            }
        }
    }

    /// Build a date value from milliseconds since the epoch
    pub fn from_epoch_millis(ms: i64) -> Option<Value> {
        Utc.timestamp_millis_opt(ms).single().map(Value::Date)
    }
}

/// Renders a float the way a URL literal would spell it
pub fn number_text(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else {
        n.to_string()
    }
}

/// ISO-8601 text with millisecond precision and a `Z` suffix
pub fn iso_text(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(n as i64)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(d: DateTime<Utc>) -> Self {
        Value::Date(d)
    }
}

impl From<Pattern> for Value {
    fn from(p: Pattern) -> Self {
        Value::Regex(p)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

#[derive(Clone, Copy)]
enum SortNumber {
    Int(i64),
    Float(f64),
}

impl SortNumber {
    /// Exact comparison on the real line, without rounding integers to floats
    fn order(self, other: SortNumber) -> Ordering {
        match (self, other) {
            (SortNumber::Int(a), SortNumber::Int(b)) => a.cmp(&b),
            (SortNumber::Float(a), SortNumber::Float(b)) => a
                .is_nan()
                .cmp(&b.is_nan())
                .then_with(|| a.partial_cmp(&b).unwrap_or(Ordering::Equal)),
            (SortNumber::Int(a), SortNumber::Float(b)) => int_float_order(a, b),
            (SortNumber::Float(a), SortNumber::Int(b)) => int_float_order(b, a).reverse(),
        }
    }
}

fn int_float_order(int: i64, float: f64) -> Ordering {
    // 2^63 bounds the i64 range and is exact in f64
    const BOUND: f64 = 9_223_372_036_854_775_808.0;
    if float.is_nan() || float >= BOUND {
        return Ordering::Less;
    }
    if float < -BOUND {
        return Ordering::Greater;
    }
    let whole = float.trunc();
    int.cmp(&(whole as i64))
        .then_with(|| 0.0_f64.partial_cmp(&(float - whole)).unwrap_or(Ordering::Equal))
}
