use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use tracing::trace;

use crate::ast::{Arg, Query};
use crate::value::Value;

static SIGNED_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([-+]*)(.+)$").expect("static pattern"));

/// Settings for [`normalize`].
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizeOptions {
    /// Field whose string or numeric `eq` test is reported as a lookup
    pub primary_key: String,

    /// Upper bound applied to any requested `limit`
    pub hard_limit: Option<usize>,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        NormalizeOptions {
            primary_key: "id".to_string(),
            hard_limit: None,
        }
    }
}

/// Backend-agnostic description of a query's paging, ordering and
/// projection, for handing to a storage layer.
///
/// Sort weights are `1` (ascending) and `-1` (descending); select weights
/// are `1` (included) and `0` (excluded).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Normalized {
    /// Raw arguments of the last `sort`
    pub sort: Vec<Arg>,
    pub sort_ordered: Vec<(String, i8)>,
    pub sort_by_field: IndexMap<String, i8>,

    /// Raw arguments of the last `select`
    pub select: Vec<Arg>,
    pub select_ordered: Vec<(String, i8)>,
    pub select_by_field: IndexMap<String, i8>,

    /// `None` means no limit was requested
    pub limit: Option<usize>,
    pub skip: usize,
    pub total_count_cap: Option<usize>,

    /// A `limit` was present, so the backend should count the full result
    pub needs_count: bool,

    /// `values` was requested: emit arrays of the selected fields
    pub values: bool,

    /// Id compared by `eq(<primary key>, id)`
    pub primary_key_equality: Option<String>,
}

/// Extract a [`Normalized`] descriptor from a query tree.
///
/// Calls whose first argument is a call are treated as grouping and walked
/// through; every other call contributes by name.
///
/// # Examples
///
/// ```
/// use rql::{normalize, parse, NormalizeOptions};
///
/// let query = parse("sort(-price,+name)&limit(10,20)").unwrap();
/// let normalized = normalize(&query, &NormalizeOptions::default());
///
/// assert_eq!(normalized.sort_ordered, vec![("price".to_string(), -1), ("name".to_string(), 1)]);
/// assert_eq!((normalized.limit, normalized.skip), (Some(10), 20));
/// ```
pub fn normalize(query: &Query, options: &NormalizeOptions) -> Normalized {
    let mut normalized = Normalized::default();

    query.walk(&mut |name: &str, args: &[Arg]| {
        trace!(term = name, "normalizing term");
        match name {
            "sort" => {
                normalized.sort = args.to_vec();
                normalized.sort_ordered = weighted(args, 1, -1);
                normalized.sort_by_field = normalized.sort_ordered.iter().cloned().collect();
            }
            "select" => {
                normalized.select = args.to_vec();
                normalized.select_ordered = weighted(args, 1, 0);
                normalized.select_by_field = normalized.select_ordered.iter().cloned().collect();
            }
            "unselect" => {
                for (field, _) in weighted(args, 0, 0) {
                    normalized.select_by_field.insert(field.clone(), 0);
                    normalized.select_ordered.push((field, 0));
                }
            }
            "limit" => {
                let limit = args.first().map_or(0, |arg| count(arg).unwrap_or(0));
                normalized.limit = Some(match options.hard_limit {
                    Some(hard) => limit.min(hard),
                    None => limit,
                });
                normalized.skip = args.get(1).and_then(count).unwrap_or(0);
                normalized.total_count_cap = args.get(2).and_then(count);
                normalized.needs_count = true;
            }
            "values" => normalized.values = true,
            "eq" => {
                if args.first().and_then(Arg::as_str) == Some(options.primary_key.as_str())
                    && let Some(id) = args.get(1).and_then(primary_key_text)
                {
                    normalized.primary_key_equality = Some(id);
                }
            }
            _ => {}
        }
    });

    normalized
}

/// Field names with their `+`/`-` prefix resolved to a weight
fn weighted(args: &[Arg], plus: i8, minus: i8) -> Vec<(String, i8)> {
    args.iter()
        .filter_map(field_text)
        .filter_map(|text| {
            let caps = SIGNED_FIELD.captures(&text)?;
            let weight = if caps[1].starts_with('-') { minus } else { plus };
            Some((caps[2].to_string(), weight))
        })
        .collect()
}

/// A field argument as text; tuple paths are joined with `.`
fn field_text(arg: &Arg) -> Option<String> {
    match arg {
        Arg::Value(value) => Some(value.as_string()),
        Arg::Tuple(parts) => {
            let parts: Option<Vec<String>> = parts.iter().map(field_text).collect();
            parts.map(|parts| parts.join("."))
        }
        Arg::Call(_) | Arg::Param(_) => None,
    }
}

/// Numeric argument as a count; non-numbers and NaN give `None`
fn count(arg: &Arg) -> Option<usize> {
    let n = arg.as_value()?.as_float()?;
    if n.is_nan() {
        None
    } else if n <= 0.0 {
        Some(0)
    } else if n >= usize::MAX as f64 {
        Some(usize::MAX)
    } else {
        Some(n as usize)
    }
}

fn primary_key_text(arg: &Arg) -> Option<String> {
    match arg.as_value()? {
        value @ (Value::String(_) | Value::Integer(_) | Value::Float(_)) => Some(value.as_string()),
        _ => None,
    }
}
