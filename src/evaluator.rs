use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::ast::{Arg, Comparison, Query};
use crate::operators::default_operators;
use crate::parser::{ParseError, Parser};
use crate::path::PropertyPath;
use crate::value::Value;

/// Advisory bound for custom operator implementations that loop.
///
/// The engine itself never enforces it.
pub const MAX_ITERATIONS: usize = 10_000;

/// An operator implementation.
///
/// Receives the evaluator (to invoke sub-terms), the working set of records
/// and the operator's arguments.
pub type Operator =
    Arc<dyn Fn(&Evaluator<'_>, Vec<Value>, &[Operand<'_>]) -> Result<Outcome, EvalError> + Send + Sync>;

/// Errors that can occur during query execution.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
    /// No operator with this name in the overrides or the defaults
    UndefinedOperator(String),

    /// `one()` found this many records
    Cardinality(usize),

    /// Argument of the wrong kind for an operator
    TypeError(String),

    /// A scalar builder method was called without an executor
    MissingExecutor,

    /// Query text handed to the engine did not parse
    Parse(ParseError),
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::UndefinedOperator(name) => write!(f, "Operator {} is not defined", name),
            EvalError::Cardinality(count) => {
                write!(f, "More than one object found ({} records)", count)
            }
            EvalError::TypeError(msg) => write!(f, "Type error: {}", msg),
            EvalError::MissingExecutor => write!(f, "No executor configured for this query"),
            EvalError::Parse(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for EvalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EvalError::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ParseError> for EvalError {
    fn from(e: ParseError) -> Self {
        EvalError::Parse(e)
    }
}

/// Page information attached by `limit(count, skip, hardCount)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// Index of the first record of the page in the full result
    pub start: usize,
    /// Index of the last record of the page, `None` for an empty page
    pub end: Option<usize>,
    /// Size of the full result, capped by `hardCount`
    pub total_count: usize,
}

/// A result collection.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Records {
    pub items: Vec<Value>,
    pub page: Option<Page>,
}

impl Records {
    pub fn new(items: Vec<Value>) -> Self {
        Records { items, page: None }
    }
}

/// What a query produces: a collection, or a scalar from a terminal reducer.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Records(Records),
    Scalar(Value),
}

impl Outcome {
    pub fn records(items: Vec<Value>) -> Self {
        Outcome::Records(Records::new(items))
    }

    /// The records, if this is a collection
    pub fn items(&self) -> Option<&[Value]> {
        match self {
            Outcome::Records(r) => Some(&r.items),
            Outcome::Scalar(_) => None,
        }
    }

    /// Flatten to a value; collections become arrays
    pub fn into_value(self) -> Value {
        match self {
            Outcome::Records(r) => Value::Array(r.items),
            Outcome::Scalar(v) => v,
        }
    }

    /// Continue a pipeline with this result as the working set
    pub fn into_records(self) -> Result<Vec<Value>, EvalError> {
        match self {
            Outcome::Records(r) => Ok(r.items),
            Outcome::Scalar(Value::Array(items)) => Ok(items),
            Outcome::Scalar(v) => Err(EvalError::TypeError(format!(
                "Cannot continue a query from a {} result",
                v.type_name()
            ))),
        }
    }

    /// Whether a predicate invocation matched
    pub fn is_match(&self) -> bool {
        match self {
            Outcome::Records(r) => !r.items.is_empty(),
            Outcome::Scalar(v) => v.is_truthy(),
        }
    }
}

/// A compiled operator argument.
///
/// Literal tuples and bound parameters arrive as values; nested calls stay
/// terms so that each operator decides whether to run them as a branch,
/// a predicate or an aggregator.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand<'q> {
    Value(Value),
    Term(&'q Query),
}

impl Operand<'_> {
    /// The literal, or a type error naming the operator that needed one
    pub fn value(&self, operator: &str) -> Result<&Value, EvalError> {
        match self {
            Operand::Value(v) => Ok(v),
            Operand::Term(q) => Err(EvalError::TypeError(format!(
                "{}() expects a literal argument, got the term {}()",
                operator, q.name
            ))),
        }
    }

    pub fn as_term(&self) -> Option<&Query> {
        match self {
            Operand::Term(q) => Some(q),
            Operand::Value(_) => None,
        }
    }
}

/// Per-call settings: bound parameters and operator overrides.
#[derive(Clone, Default)]
pub struct ExecuteOptions {
    pub parameters: Vec<Value>,
    pub operators: HashMap<String, Operator>,
}

impl fmt::Debug for ExecuteOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.operators.keys().collect();
        names.sort();
        f.debug_struct("ExecuteOptions")
            .field("parameters", &self.parameters)
            .field("operators", &names)
            .finish()
    }
}

impl ExecuteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parameters(mut self, parameters: Vec<Value>) -> Self {
        self.parameters = parameters;
        self
    }

    /// Override (or add) an operator for this execution
    pub fn with_operator<F>(mut self, name: impl Into<String>, operator: F) -> Self
    where
        F: Fn(&Evaluator<'_>, Vec<Value>, &[Operand<'_>]) -> Result<Outcome, EvalError>
            + Send
            + Sync
            + 'static,
    {
        self.operators.insert(name.into(), Arc::new(operator));
        self
    }
}

/// Tree-walking query evaluator.
///
/// Operators are looked up in the per-call overrides first and then in the
/// immutable default table.
pub struct Evaluator<'o> {
    options: &'o ExecuteOptions,
}

impl<'o> Evaluator<'o> {
    pub fn new(options: &'o ExecuteOptions) -> Self {
        Evaluator { options }
    }

    fn operator(&self, name: &str) -> Option<&Operator> {
        self.options
            .operators
            .get(name)
            .or_else(|| default_operators().get(name))
    }

    /// Run one term against a working set
    pub fn eval(&self, term: &Query, input: Vec<Value>) -> Result<Outcome, EvalError> {
        if let Some(comparison) = Comparison::from_name(&term.name) {
            return self.compare(comparison, term, input);
        }

        let operator = self
            .operator(&term.name)
            .ok_or_else(|| EvalError::UndefinedOperator(term.name.clone()))?;
        let operands = term
            .args
            .iter()
            .map(|arg| self.operand(arg))
            .collect::<Result<Vec<_>, _>>()?;

        trace!(operator = %term.name, records = input.len(), "dispatching operator");
        operator(self, input, &operands)
    }

    /// Invoke an operand as a sub-query
    pub fn call(&self, operand: &Operand<'_>, input: Vec<Value>) -> Result<Outcome, EvalError> {
        match operand {
            Operand::Term(term) => self.eval(term, input),
            Operand::Value(v) => Err(EvalError::TypeError(format!(
                "Cannot apply the literal {} as a query term",
                v.as_string()
            ))),
        }
    }

    pub fn operand<'q>(&self, arg: &'q Arg) -> Result<Operand<'q>, EvalError> {
        match arg {
            Arg::Call(term) => Ok(Operand::Term(term)),
            other => self.literal(other).map(Operand::Value),
        }
    }

    /// Resolve a non-call argument to a value
    pub fn literal(&self, arg: &Arg) -> Result<Value, EvalError> {
        match arg {
            Arg::Value(v) => Ok(v.clone()),
            Arg::Tuple(items) => items
                .iter()
                .map(|item| self.literal(item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Arg::Param(n) => Ok(n
                .checked_sub(1)
                .and_then(|i| self.options.parameters.get(i))
                .cloned()
                .unwrap_or(Value::Null)),
            Arg::Call(term) => Err(EvalError::TypeError(format!(
                "The term {}() cannot be used as a literal",
                term.name
            ))),
        }
    }

    fn compare(
        &self,
        comparison: Comparison,
        term: &Query,
        input: Vec<Value>,
    ) -> Result<Outcome, EvalError> {
        let (path, expected) = match term.args.as_slice() {
            [expected] => (PropertyPath::whole(), self.literal(expected)?),
            [path, expected, ..] => (
                PropertyPath::from_value(&self.literal(path)?)?,
                self.literal(expected)?,
            ),
            [] => {
                return Err(EvalError::TypeError(format!(
                    "{}() requires a value to compare against",
                    comparison.name()
                )));
            }
        };

        let matched = input
            .into_iter()
            .filter(|record| {
                path.resolve(record)
                    .is_some_and(|actual| comparison.test(actual, &expected))
            })
            .collect();
        Ok(Outcome::records(matched))
    }
}

/// A query bound to its options, reusable across collections.
#[derive(Clone, Debug)]
pub struct Executable {
    query: Query,
    options: ExecuteOptions,
}

impl Executable {
    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn run(&self, records: Vec<Value>) -> Result<Outcome, EvalError> {
        execute(&self.query, &self.options, records)
    }
}

/// Bind a query to options for later execution
pub fn compile(query: Query, options: ExecuteOptions) -> Executable {
    Executable { query, options }
}

/// Parse query text with the option parameters bound, then bind it
pub fn compile_str(query: &str, options: ExecuteOptions) -> Result<Executable, EvalError> {
    let query = Parser::default().parse(query, Some(&options.parameters))?;
    Ok(compile(query, options))
}

/// Execute a query tree against a collection.
///
/// # Examples
///
/// ```
/// use rql::{execute, parse, ExecuteOptions, Value};
///
/// let records = vec![Value::from(vec![1, 2]), Value::from(vec![3])];
/// let query = parse("count()").unwrap();
/// let result = execute(&query, &ExecuteOptions::default(), records).unwrap();
///
/// assert_eq!(result.into_value(), Value::Integer(2));
/// ```
pub fn execute(
    query: &Query,
    options: &ExecuteOptions,
    records: Vec<Value>,
) -> Result<Outcome, EvalError> {
    debug!(query = %query, records = records.len(), "executing query");
    let outcome = Evaluator::new(options).eval(query, records)?;
    debug!(
        result = outcome.items().map_or("scalar".to_string(), |r| r.len().to_string()),
        "query executed"
    );
    Ok(outcome)
}

/// Parse and execute query text, binding the option parameters
pub fn execute_str(
    query: &str,
    options: &ExecuteOptions,
    records: Vec<Value>,
) -> Result<Outcome, EvalError> {
    let query = Parser::default().parse(query, Some(&options.parameters))?;
    execute(&query, options, records)
}
