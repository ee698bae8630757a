use indexmap::IndexMap;

use crate::ast::Arg;

/// Root-only side-table filled while parsing.
///
/// Holds the last-seen argument list of each cached operator (`sort`,
/// `select`, `values`, `limit` by default) and, when an `eq` test against the
/// primary-key field was seen, the compared value as text.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Cache {
    terms: IndexMap<String, Vec<Arg>>,
    primary_key: Option<(String, String)>,
}

impl Cache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last-seen arguments of the named operator
    pub fn get(&self, operator: &str) -> Option<&[Arg]> {
        self.terms.get(operator).map(Vec::as_slice)
    }

    pub fn record(&mut self, operator: &str, args: &[Arg]) {
        self.terms.insert(operator.to_string(), args.to_vec());
    }

    pub fn set_primary_key(&mut self, field: &str, value: String) {
        self.primary_key = Some((field.to_string(), value));
    }

    /// The id looked up by a single-record query, if any
    pub fn primary_key(&self) -> Option<&str> {
        self.primary_key.as_ref().map(|(_, value)| value.as_str())
    }

    /// Name of the field the primary-key entry was recorded under
    pub fn primary_key_field(&self) -> Option<&str> {
        self.primary_key.as_ref().map(|(field, _)| field.as_str())
    }

    pub fn operators(&self) -> impl Iterator<Item = &str> {
        self.terms.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty() && self.primary_key.is_none()
    }
}
