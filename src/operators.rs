use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, LazyLock};

use indexmap::IndexMap;
use rust_decimal::{Decimal, prelude::FromPrimitive, prelude::ToPrimitive};

use crate::evaluator::{EvalError, Evaluator, Operand, Operator, Outcome, Page, Records};
use crate::path::PropertyPath;
use crate::value::{Pattern, Value};

static DEFAULT_OPERATORS: LazyLock<HashMap<&'static str, Operator>> = LazyLock::new(|| {
    let mut operators: HashMap<&'static str, Operator> = HashMap::new();
    operators.insert("sort", Arc::new(sort));
    operators.insert("match", Arc::new(matches));
    operators.insert("in", Arc::new(within));
    operators.insert("out", Arc::new(outside));
    operators.insert("contains", Arc::new(contains));
    operators.insert("excludes", Arc::new(excludes));
    operators.insert("between", Arc::new(between));
    operators.insert("and", Arc::new(and));
    operators.insert("or", Arc::new(or));
    operators.insert("select", Arc::new(select));
    operators.insert("unselect", Arc::new(unselect));
    operators.insert("values", Arc::new(values));
    operators.insert("limit", Arc::new(limit));
    operators.insert("distinct", Arc::new(distinct));
    operators.insert("recurse", Arc::new(recurse));
    operators.insert("aggregate", Arc::new(aggregate));
    operators.insert("sum", Arc::new(sum));
    operators.insert("mean", Arc::new(mean));
    operators.insert("max", Arc::new(max));
    operators.insert("min", Arc::new(min));
    operators.insert("count", Arc::new(count));
    operators.insert("first", Arc::new(first));
    operators.insert("one", Arc::new(one));
    operators
});

/// The immutable default operator table
pub fn default_operators() -> &'static HashMap<&'static str, Operator> {
    &DEFAULT_OPERATORS
}

type OpResult = Result<Outcome, EvalError>;

fn sort(_: &Evaluator<'_>, mut input: Vec<Value>, args: &[Operand<'_>]) -> OpResult {
    let mut keys = Vec::with_capacity(args.len());
    for arg in args {
        keys.push(SortKey::from_value(arg.value("sort")?)?);
    }

    input.sort_by(|a, b| {
        keys.iter()
            .map(|key| key.compare(a, b))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    });
    Ok(Outcome::records(input))
}

struct SortKey {
    path: PropertyPath,
    ascending: bool,
}

impl SortKey {
    fn from_value(key: &Value) -> Result<Self, EvalError> {
        let Value::String(text) = key else {
            return Ok(SortKey {
                path: PropertyPath::from_value(key)?,
                ascending: true,
            });
        };
        let (ascending, name) = match text.strip_prefix('-') {
            Some(rest) => (false, rest),
            None => (true, text.strip_prefix('+').unwrap_or(text)),
        };
        Ok(SortKey {
            path: PropertyPath::from_value(&Value::from(name))?,
            ascending,
        })
    }

    /// Absent values order before present ones
    fn compare(&self, a: &Value, b: &Value) -> Ordering {
        let ordering = match (self.path.resolve(a), self.path.resolve(b)) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(x), Some(y)) => x.sort_cmp(y),
        };
        if self.ascending { ordering } else { ordering.reverse() }
    }
}

/// Split filter arguments into the property path and the comparison operand.
///
/// With a single argument the whole record is compared.
fn filter_args<'a, 'q>(
    name: &str,
    args: &'a [Operand<'q>],
) -> Result<(PropertyPath, &'a Operand<'q>), EvalError> {
    match args {
        [second] => Ok((PropertyPath::whole(), second)),
        [path, second, ..] => Ok((PropertyPath::from_value(path.value(name)?)?, second)),
        [] => Err(EvalError::TypeError(format!(
            "{}() requires a value to compare against",
            name
        ))),
    }
}

/// Keep the records whose resolved property satisfies `keep`
fn filter<F>(input: Vec<Value>, path: &PropertyPath, mut keep: F) -> OpResult
where
    F: FnMut(Option<&Value>) -> Result<bool, EvalError>,
{
    let mut matched = Vec::new();
    for record in input {
        if keep(path.resolve(&record))? {
            matched.push(record);
        }
    }
    Ok(Outcome::records(matched))
}

fn matches(_: &Evaluator<'_>, input: Vec<Value>, args: &[Operand<'_>]) -> OpResult {
    let (path, second) = filter_args("match", args)?;
    let pattern = match second.value("match")? {
        Value::Regex(pattern) => pattern.clone(),
        other => Pattern::new(&other.as_string(), false)
            .map_err(|e| EvalError::TypeError(format!("match() got an invalid pattern: {}", e)))?,
    };
    filter(input, &path, |actual| {
        Ok(actual.is_some_and(|v| pattern.is_match(&v.as_string())))
    })
}

/// A value set for `in`/`out`; a scalar is a set of one
fn member_of(set: &Value, value: &Value) -> bool {
    match set {
        Value::Array(items) => items.iter().any(|item| item.loose_eq(value)),
        single => single.loose_eq(value),
    }
}

fn within(_: &Evaluator<'_>, input: Vec<Value>, args: &[Operand<'_>]) -> OpResult {
    let (path, second) = filter_args("in", args)?;
    let set = second.value("in")?;
    filter(input, &path, |actual| Ok(actual.is_some_and(|v| member_of(set, v))))
}

fn outside(_: &Evaluator<'_>, input: Vec<Value>, args: &[Operand<'_>]) -> OpResult {
    let (path, second) = filter_args("out", args)?;
    let set = second.value("out")?;
    filter(input, &path, |actual| Ok(!actual.is_some_and(|v| member_of(set, v))))
}

/// Whether any element of an array field equals the literal or satisfies
/// the predicate term. Non-array fields never contain anything.
fn any_element(
    evaluator: &Evaluator<'_>,
    actual: Option<&Value>,
    needle: &Operand<'_>,
) -> Result<bool, EvalError> {
    let Some(Value::Array(items)) = actual else {
        return Ok(false);
    };
    match needle {
        Operand::Term(_) => {
            for item in items {
                if evaluator.call(needle, vec![item.clone()])?.is_match() {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        Operand::Value(value) => Ok(items.iter().any(|item| item.loose_eq(value))),
    }
}

fn contains(evaluator: &Evaluator<'_>, input: Vec<Value>, args: &[Operand<'_>]) -> OpResult {
    let (path, needle) = filter_args("contains", args)?;
    filter(input, &path, |actual| any_element(evaluator, actual, needle))
}

fn excludes(evaluator: &Evaluator<'_>, input: Vec<Value>, args: &[Operand<'_>]) -> OpResult {
    let (path, needle) = filter_args("excludes", args)?;
    filter(input, &path, |actual| {
        any_element(evaluator, actual, needle).map(|found| !found)
    })
}

fn between(_: &Evaluator<'_>, input: Vec<Value>, args: &[Operand<'_>]) -> OpResult {
    let (path, second) = filter_args("between", args)?;
    let (low, high) = match second.value("between")? {
        Value::Array(range) if range.len() == 2 => (&range[0], &range[1]),
        other => {
            return Err(EvalError::TypeError(format!(
                "between() expects a (low,high) pair, got {}",
                other.type_name()
            )));
        }
    };
    filter(input, &path, |actual| {
        Ok(actual.is_some_and(|v| {
            matches!(v.compare(low), Some(Ordering::Greater | Ordering::Equal))
                && v.compare(high) == Some(Ordering::Less)
        }))
    })
}

/// Threads the working set through each term in turn
fn and(evaluator: &Evaluator<'_>, input: Vec<Value>, args: &[Operand<'_>]) -> OpResult {
    let mut outcome = Outcome::records(input);
    for term in args {
        let items = outcome.into_records()?;
        outcome = evaluator.call(term, items)?;
    }
    Ok(outcome)
}

/// Union of every branch evaluated against the original input.
///
/// Equal records are counted rather than merged: the k-th copy a branch
/// yields is kept only when fewer than k copies are already in the union,
/// so duplicated input rows survive and `or(x)` returns what `x` does.
fn or(evaluator: &Evaluator<'_>, input: Vec<Value>, args: &[Operand<'_>]) -> OpResult {
    let mut emitted: HashMap<String, usize> = HashMap::new();
    let mut union = Vec::new();
    for term in args {
        let mut copies: HashMap<String, usize> = HashMap::new();
        for item in evaluator.call(term, input.clone())?.into_records()? {
            let fingerprint = item.fingerprint();
            let copy = copies.entry(fingerprint.clone()).or_default();
            *copy += 1;
            let kept = emitted.entry(fingerprint).or_default();
            if *copy > *kept {
                *kept += 1;
                union.push(item);
            }
        }
    }
    Ok(Outcome::records(union))
}

fn paths(name: &str, args: &[Operand<'_>]) -> Result<Vec<PropertyPath>, EvalError> {
    args.iter()
        .map(|arg| PropertyPath::from_value(arg.value(name)?))
        .collect()
}

fn select(_: &Evaluator<'_>, input: Vec<Value>, args: &[Operand<'_>]) -> OpResult {
    let fields = paths("select", args)?;
    let projected = input
        .iter()
        .map(|record| {
            let mut selected = IndexMap::new();
            for field in &fields {
                if let Some(value) = field.resolve(record) {
                    selected.insert(field.label().to_string(), value.clone());
                }
            }
            Value::Object(selected)
        })
        .collect();
    Ok(Outcome::records(projected))
}

fn unselect(_: &Evaluator<'_>, input: Vec<Value>, args: &[Operand<'_>]) -> OpResult {
    let fields = paths("unselect", args)?;
    let projected = input
        .into_iter()
        .map(|record| match record {
            Value::Object(mut map) => {
                for field in &fields {
                    map.shift_remove(field.label());
                }
                Value::Object(map)
            }
            other => other,
        })
        .collect();
    Ok(Outcome::records(projected))
}

fn values(_: &Evaluator<'_>, input: Vec<Value>, args: &[Operand<'_>]) -> OpResult {
    let fields = paths("values", args)?;
    let lookup = |field: &PropertyPath, record: &Value| field.resolve(record).cloned().unwrap_or(Value::Null);
    let emitted = input
        .iter()
        .map(|record| match fields.as_slice() {
            [field] => lookup(field, record),
            [] => match record {
                Value::Object(map) => Value::Array(map.values().cloned().collect()),
                _ => Value::Array(Vec::new()),
            },
            many => Value::Array(many.iter().map(|field| lookup(field, record)).collect()),
        })
        .collect();
    Ok(Outcome::records(emitted))
}

/// Non-negative count argument; non-numeric text counts as zero
fn count_arg(name: &str, operand: Option<&Operand<'_>>) -> Result<Option<usize>, EvalError> {
    let Some(operand) = operand else {
        return Ok(None);
    };
    let value = operand.value(name)?;
    if matches!(value, Value::Null) {
        return Ok(None);
    }
    let n = value.as_float().unwrap_or(0.0);
    Ok(Some(if n.is_nan() || n <= 0.0 {
        0
    } else if n >= usize::MAX as f64 {
        usize::MAX
    } else {
        n as usize
    }))
}

fn limit(_: &Evaluator<'_>, input: Vec<Value>, args: &[Operand<'_>]) -> OpResult {
    let count = count_arg("limit", args.first())?.unwrap_or(usize::MAX);
    let start = count_arg("limit", args.get(1))?.unwrap_or(0);
    let hard = match args.get(2) {
        Some(operand) => Some(operand.value("limit")?).filter(|v| v.is_truthy()),
        None => None,
    };
    // a non-numeric hardCount still pages, without capping the total
    let cap = match hard {
        Some(Value::Integer(_) | Value::Float(_)) => count_arg("limit", args.get(2))?,
        _ => None,
    };

    let total = input.len();
    let items: Vec<Value> = input.into_iter().skip(start).take(count).collect();

    let page = hard.map(|_| Page {
        start,
        end: (!items.is_empty()).then(|| start + items.len() - 1),
        total_count: cap.map_or(total, |cap| total.min(cap)),
    });
    Ok(Outcome::Records(Records { items, page }))
}

fn distinct(_: &Evaluator<'_>, input: Vec<Value>, _: &[Operand<'_>]) -> OpResult {
    let mut seen = HashSet::new();
    let unique = input
        .into_iter()
        .filter(|item| seen.insert(item.fingerprint()))
        .collect();
    Ok(Outcome::records(unique))
}

fn recurse(_: &Evaluator<'_>, input: Vec<Value>, args: &[Operand<'_>]) -> OpResult {
    let field = match args.first() {
        Some(operand) => Some(operand.value("recurse")?.as_string()),
        None => None,
    };
    let mut flattened = Vec::new();
    for record in &input {
        flatten(record, field.as_deref(), &mut flattened);
    }
    Ok(Outcome::records(flattened))
}

fn is_nested(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Array(_))
}

fn flatten(value: &Value, field: Option<&str>, out: &mut Vec<Value>) {
    if let Value::Array(items) = value {
        for item in items {
            flatten(item, field, out);
        }
        return;
    }
    out.push(value.clone());
    match field {
        Some(field) => {
            if let Some(child) = value.get(field).filter(|child| is_nested(child)) {
                flatten(child, Some(field), out);
            }
        }
        None => {
            if let Value::Object(map) = value {
                for child in map.values().filter(|child| is_nested(child)) {
                    flatten(child, None, out);
                }
            }
        }
    }
}

/// Role of one `aggregate` argument
enum Aggregation<'a, 'q> {
    /// Field whose value partitions the records
    Distinctive(PropertyPath),
    /// Term applied to each group's members
    Aggregator(&'a Operand<'q>),
}

fn aggregate(evaluator: &Evaluator<'_>, input: Vec<Value>, args: &[Operand<'_>]) -> OpResult {
    let mut distinctives = Vec::new();
    let mut aggregators = Vec::new();
    for arg in args {
        match aggregation(arg)? {
            Aggregation::Distinctive(path) => distinctives.push(path),
            Aggregation::Aggregator(term) => aggregators.push(term),
        }
    }

    let mut groups: IndexMap<String, Vec<Value>> = IndexMap::new();
    for record in input {
        let key: String = distinctives
            .iter()
            .map(|path| match path.resolve(&record) {
                Some(value) => format!("/{}", value.as_string()),
                None => "/undefined".to_string(),
            })
            .collect();
        groups.entry(key).or_default().push(record);
    }

    let mut results = Vec::with_capacity(groups.len());
    for members in groups.into_values() {
        // aggregator keys come first
        let mut grouped = IndexMap::new();
        for (index, term) in aggregators.iter().enumerate() {
            let result = evaluator.call(term, members.clone())?.into_value();
            grouped.insert(index.to_string(), result);
        }
        for path in &distinctives {
            if let Some(value) = members.first().and_then(|first| path.resolve(first)) {
                grouped.insert(path.label().to_string(), value.clone());
            }
        }
        results.push(Value::Object(grouped));
    }
    Ok(Outcome::records(results))
}

fn aggregation<'a, 'q>(arg: &'a Operand<'q>) -> Result<Aggregation<'a, 'q>, EvalError> {
    match arg {
        Operand::Term(_) => Ok(Aggregation::Aggregator(arg)),
        Operand::Value(value) => PropertyPath::from_value(value).map(Aggregation::Distinctive),
    }
}

/// Field values a reducer folds over; absent values are skipped
fn reduced_values(name: &str, input: &[Value], args: &[Operand<'_>]) -> Result<Vec<Value>, EvalError> {
    let path = match args.first() {
        Some(operand) => PropertyPath::from_value(operand.value(name)?)?,
        None => PropertyPath::whole(),
    };
    Ok(input
        .iter()
        .filter_map(|record| path.resolve(record).cloned())
        .collect())
}

fn reduce<F>(values: Vec<Value>, mut fold: F) -> Result<Value, EvalError>
where
    F: FnMut(Value, Value) -> Result<Value, EvalError>,
{
    let mut values = values.into_iter();
    let Some(mut acc) = values.next() else {
        return Ok(Value::Null);
    };
    for value in values {
        acc = fold(acc, value)?;
    }
    Ok(acc)
}

fn sum(_: &Evaluator<'_>, input: Vec<Value>, args: &[Operand<'_>]) -> OpResult {
    let values = reduced_values("sum", &input, args)?;
    reduce(values, |a, b| add(&a, &b)).map(Outcome::Scalar)
}

fn mean(_: &Evaluator<'_>, input: Vec<Value>, args: &[Operand<'_>]) -> OpResult {
    let values = reduced_values("mean", &input, args)?;
    let count = values.len();
    let total = reduce(values, |a, b| add(&a, &b))?;

    let total = match total {
        Value::Null => return Ok(Outcome::Scalar(Value::Null)),
        Value::Integer(n) => Decimal::from_i64(n),
        Value::Float(n) => Decimal::from_f64(n),
        other => {
            return Err(EvalError::TypeError(format!(
                "Cannot average {} values",
                other.type_name()
            )));
        }
    };
    let quotient = total.and_then(|t| t.checked_div(Decimal::from(count as u64)));
    let Some(quotient) = quotient else {
        return Ok(Outcome::Scalar(Value::Float(f64::NAN)));
    };
    if quotient.is_integer()
        && let Some(n) = quotient.to_i64()
    {
        return Ok(Outcome::Scalar(Value::Integer(n)));
    }
    Ok(Outcome::Scalar(
        quotient.to_f64().map_or(Value::Float(f64::NAN), Value::Float),
    ))
}

fn extreme(name: &str, input: Vec<Value>, args: &[Operand<'_>], keep: Ordering) -> OpResult {
    let values = reduced_values(name, &input, args)?;
    reduce(values, |a, b| match b.compare(&a) {
        Some(ordering) if ordering == keep => Ok(b),
        Some(_) => Ok(a),
        None => Err(EvalError::TypeError(format!(
            "{}() cannot order {} and {}",
            name,
            a.type_name(),
            b.type_name()
        ))),
    })
    .map(Outcome::Scalar)
}

fn max(_: &Evaluator<'_>, input: Vec<Value>, args: &[Operand<'_>]) -> OpResult {
    extreme("max", input, args, Ordering::Greater)
}

fn min(_: &Evaluator<'_>, input: Vec<Value>, args: &[Operand<'_>]) -> OpResult {
    extreme("min", input, args, Ordering::Less)
}

fn count(_: &Evaluator<'_>, input: Vec<Value>, _: &[Operand<'_>]) -> OpResult {
    Ok(Outcome::Scalar(Value::Integer(input.len() as i64)))
}

fn first(_: &Evaluator<'_>, input: Vec<Value>, _: &[Operand<'_>]) -> OpResult {
    Ok(Outcome::Scalar(input.into_iter().next().unwrap_or(Value::Null)))
}

fn one(_: &Evaluator<'_>, input: Vec<Value>, _: &[Operand<'_>]) -> OpResult {
    if input.len() > 1 {
        return Err(EvalError::Cardinality(input.len()));
    }
    Ok(Outcome::Scalar(input.into_iter().next().unwrap_or(Value::Null)))
}

/// Addition as used by `sum`: numbers add (integral mixed results stay
/// integers), anything added to a string concatenates.
pub fn add(left: &Value, right: &Value) -> Result<Value, EvalError> {
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => Ok(a
            .checked_add(*b)
            .map_or(Value::Float(*a as f64 + *b as f64), Value::Integer)),
        (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a + b)),
        (Value::Integer(a), Value::Float(b)) | (Value::Float(b), Value::Integer(a)) => {
            if let Some(ad) = Decimal::from_i64(*a)
                && let Some(bd) = Decimal::from_f64(*b)
                && let Some(rd) = ad.checked_add(bd)
            {
                if rd.is_integer()
                    && let Some(r) = rd.to_i64()
                {
                    return Ok(Value::Integer(r));
                } else if let Some(r) = rd.to_f64() {
                    return Ok(Value::Float(r));
                }
            }
            Ok(Value::Float(*a as f64 + b))
        }
        (Value::String(a), b) => Ok(Value::String(format!("{}{}", a, b.as_string()))),
        (a, Value::String(b)) => Ok(Value::String(format!("{}{}", a.as_string(), b))),
        (a, b) => Err(EvalError::TypeError(format!(
            "Cannot add {} and {}",
            a.type_name(),
            b.type_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_mixed_numbers() {
        assert_eq!(add(&Value::Integer(5), &Value::Float(5.0)).unwrap(), Value::Integer(10));
        assert_eq!(add(&Value::Float(0.5), &Value::Integer(1)).unwrap(), Value::Float(1.5));
    }

    #[test]
    fn test_add_concatenates_strings() {
        assert_eq!(add(&Value::from("a"), &Value::Integer(1)).unwrap(), Value::from("a1"));
        assert!(add(&Value::Boolean(true), &Value::Null).is_err());
    }

    #[test]
    fn test_default_table_has_reducers() {
        for name in ["sum", "mean", "max", "min", "count", "first", "one"] {
            assert!(default_operators().contains_key(name), "missing {}", name);
        }
    }
}
