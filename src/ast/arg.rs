use chrono::{DateTime, Utc};

use crate::ast::Query;
use crate::value::{Pattern, Value};

/// One argument of a query node.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    /// Scalar literal, already coerced by a converter
    ///
    /// # Examples
    /// ```text
    /// 10
    /// string:10
    /// re:^t
    /// ```
    Value(Value),

    /// Nested call term
    ///
    /// # Example
    /// ```text
    /// excludes(tags,ne(fun))
    /// ```
    Call(Query),

    /// Literal tuple from an unnamed parenthesized group
    ///
    /// # Example
    /// ```text
    /// (5,10,15)
    /// ```
    Tuple(Vec<Arg>),

    /// Reference to the N-th (1-based) bound parameter, resolved at execution
    ///
    /// # Example
    /// ```text
    /// $1
    /// ```
    Param(usize),
}

impl Arg {
    /// Build a literal tuple
    pub fn tuple<I, A>(items: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<Arg>,
    {
        Arg::Tuple(items.into_iter().map(Into::into).collect())
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Arg::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Arg::Value(Value::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_call(&self) -> Option<&Query> {
        match self {
            Arg::Call(q) => Some(q),
            _ => None,
        }
    }

    pub fn is_call(&self) -> bool {
        matches!(self, Arg::Call(_))
    }
}

impl From<Value> for Arg {
    fn from(v: Value) -> Self {
        Arg::Value(v)
    }
}

impl From<Query> for Arg {
    fn from(q: Query) -> Self {
        Arg::Call(q)
    }
}

impl From<&str> for Arg {
    fn from(s: &str) -> Self {
        Arg::Value(Value::from(s))
    }
}

impl From<String> for Arg {
    fn from(s: String) -> Self {
        Arg::Value(Value::String(s))
    }
}

impl From<i64> for Arg {
    fn from(n: i64) -> Self {
        Arg::Value(Value::Integer(n))
    }
}

impl From<i32> for Arg {
    fn from(n: i32) -> Self {
        Arg::Value(Value::Integer(n as i64))
    }
}

impl From<f64> for Arg {
    fn from(n: f64) -> Self {
        Arg::Value(Value::Float(n))
    }
}

impl From<bool> for Arg {
    fn from(b: bool) -> Self {
        Arg::Value(Value::Boolean(b))
    }
}

impl From<Pattern> for Arg {
    fn from(p: Pattern) -> Self {
        Arg::Value(Value::Regex(p))
    }
}

impl From<DateTime<Utc>> for Arg {
    fn from(d: DateTime<Utc>) -> Self {
        Arg::Value(Value::Date(d))
    }
}

impl From<Vec<Arg>> for Arg {
    fn from(items: Vec<Arg>) -> Self {
        Arg::Tuple(items)
    }
}
