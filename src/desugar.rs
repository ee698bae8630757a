//! Textual rewriting passes that run before the tree is assembled.
//!
//! Each pass turns a convenience syntax into plain call syntax:
//!
//! ```text
//! price%3C10           -> price=lt=10
//! nested/property=x    -> (nested,property)=x
//! price=lt=10          -> lt(price,10)
//! a!=b                 -> ne(a,b)
//! ```

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::ast::Comparison;
use crate::parser::ParseError;

/// Characters allowed in a bare token (property name, value or call name)
const TOKEN_CHARS: &str = r"+*$\-:A-Za-z0-9_%.";

static SLASHED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("[{c}]*/[{c}/]*", c = TOKEN_CHARS)).expect("static pattern")
});

static COMPARISON: LazyLock<Regex> = LazyLock::new(|| {
    let operand = format!(r"(\([{c},]+\)|[{c}]*)", c = TOKEN_CHARS);
    Regex::new(&format!(
        r"{operand}([<>!]?=(?:[A-Za-z0-9_]*=)?|>|<){operand}",
        operand = operand
    ))
    .expect("static pattern")
});

/// Run every rewriting pass over raw query text
pub fn desugar(query: &str, json_query_compatible: bool) -> Result<String, ParseError> {
    if query.starts_with('?') {
        return Err(ParseError::Syntax("Query must not start with ?".to_string()));
    }

    let mut text = if json_query_compatible {
        escape_angle_brackets(query)
    } else {
        query.to_string()
    };

    if text.contains('/') {
        text = slashes_to_tuples(&text);
    }

    text = comparisons_to_calls(&text)?;

    if let Some(rest) = text.strip_prefix('?') {
        text = rest.to_string();
    }
    Ok(text)
}

/// `%3C=`, `%3E=`, `%3C`, `%3E` become the long operators `=le=`, `=ge=`, `=lt=`, `=gt=`
fn escape_angle_brackets(query: &str) -> String {
    query
        .replace("%3C=", "=le=")
        .replace("%3E=", "=ge=")
        .replace("%3C", "=lt=")
        .replace("%3E", "=gt=")
}

/// `a/b/c` becomes the tuple `(a,b,c)`
fn slashes_to_tuples(query: &str) -> String {
    SLASHED
        .replace_all(query, |caps: &Captures| format!("({})", caps[0].replace('/', ",")))
        .into_owned()
}

/// `property op value` becomes `name(property,value)`
fn comparisons_to_calls(query: &str) -> Result<String, ParseError> {
    let mut out = String::with_capacity(query.len());
    let mut last = 0;

    for caps in COMPARISON.captures_iter(query) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let property = caps.get(1).map_or("", |m| m.as_str());
        let operator = &caps[2];
        let value = caps.get(3).map_or("", |m| m.as_str());

        let name = if operator.len() < 3 {
            Comparison::name_for_symbol(operator)
                .ok_or_else(|| ParseError::Syntax(format!("Illegal operator {}", operator)))?
        } else {
            &operator[1..operator.len() - 1]
        };

        out.push_str(&query[last..whole.start()]);
        out.push_str(&format!("{}({},{})", name, property, value));
        last = whole.end();
    }

    out.push_str(&query[last..]);
    Ok(out)
}
