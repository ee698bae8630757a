use std::cmp::Ordering;

use crate::value::Value;

/// Native comparison operators.
///
/// Terms with these names compile straight to a per-record test and never
/// go through the operator table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// Equal (`eq`, `=`, `==`)
    Equal,
    /// Not equal (`ne`, `!=`)
    NotEqual,
    /// Less than (`lt`, `<`)
    LessThan,
    /// Greater than (`gt`, `>`)
    GreaterThan,
    /// Less than or equal (`le`, `<=`)
    LessEqual,
    /// Greater than or equal (`ge`, `>=`)
    GreaterEqual,
}

impl Comparison {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "eq" => Some(Comparison::Equal),
            "ne" => Some(Comparison::NotEqual),
            "lt" => Some(Comparison::LessThan),
            "gt" => Some(Comparison::GreaterThan),
            "le" => Some(Comparison::LessEqual),
            "ge" => Some(Comparison::GreaterEqual),
            _ => None,
        }
    }

    /// Long-form name of a short FIQL operator symbol
    pub fn name_for_symbol(symbol: &str) -> Option<&'static str> {
        match symbol {
            "=" | "==" => Some("eq"),
            ">" => Some("gt"),
            ">=" => Some("ge"),
            "<" => Some("lt"),
            "<=" => Some("le"),
            "!=" => Some("ne"),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Comparison::Equal => "eq",
            Comparison::NotEqual => "ne",
            Comparison::LessThan => "lt",
            Comparison::GreaterThan => "gt",
            Comparison::LessEqual => "le",
            Comparison::GreaterEqual => "ge",
        }
    }

    /// Apply to a present value; absent values never reach here
    pub fn test(self, actual: &Value, expected: &Value) -> bool {
        match self {
            Comparison::Equal => actual.loose_eq(expected),
            Comparison::NotEqual => !actual.loose_eq(expected),
            Comparison::LessThan => actual.compare(expected) == Some(Ordering::Less),
            Comparison::GreaterThan => actual.compare(expected) == Some(Ordering::Greater),
            Comparison::LessEqual => matches!(
                actual.compare(expected),
                Some(Ordering::Less | Ordering::Equal)
            ),
            Comparison::GreaterEqual => matches!(
                actual.compare(expected),
                Some(Ordering::Greater | Ordering::Equal)
            ),
        }
    }
}
