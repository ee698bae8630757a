use std::fmt;
use std::sync::Arc;

use crate::ast::{Arg, Query};
use crate::evaluator::{EvalError, ExecuteOptions, Outcome, execute};
use crate::value::Value;

/// Operator names with a builder method.
pub const KNOWN_OPERATORS: &[&str] = &[
    "sort", "match", "in", "out", "or", "and", "select", "unselect", "contains", "excludes",
    "values", "limit", "distinct", "recurse", "aggregate", "between", "sum", "mean", "max", "min",
    "count", "first", "one", "eq", "ne", "le", "ge", "lt", "gt",
];

/// Operators whose builder methods run the query and return a value.
pub const KNOWN_SCALAR_OPERATORS: &[&str] = &["mean", "sum", "min", "max", "count", "first", "one"];

/// Runs a finished tree against some backend.
pub type Executor = Arc<dyn Fn(&Query) -> Result<Outcome, EvalError> + Send + Sync>;

/// Fluent construction of query trees.
///
/// Every method returns a new builder holding the accumulated `and` tree
/// plus one more term; the receiver is left untouched. Scalar methods
/// (`sum`, `count`, `one`, ...) instead hand the tree to the configured
/// executor and return its value.
///
/// # Examples
///
/// ```
/// use rql::{Builder, Value};
///
/// let query = Builder::new().eq("price", 10).sort(["-name"]);
/// assert_eq!(query.to_string(), "eq(price,10)&sort(-name)");
///
/// let records = vec![Value::from(vec![1]), Value::from(vec![2])];
/// assert_eq!(Builder::new().over(records).count().unwrap(), Value::Integer(2));
/// ```
#[derive(Clone, Default)]
pub struct Builder {
    query: Query,
    executor: Option<Executor>,
}

impl fmt::Debug for Builder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builder")
            .field("query", &self.query)
            .field("executor", &self.executor.is_some())
            .finish()
    }
}

impl fmt::Display for Builder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.query, f)
    }
}

impl From<Query> for Builder {
    fn from(query: Query) -> Self {
        Builder {
            query,
            executor: None,
        }
    }
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn into_query(self) -> Query {
        self.query
    }

    pub fn with_executor<F>(mut self, executor: F) -> Self
    where
        F: Fn(&Query) -> Result<Outcome, EvalError> + Send + Sync + 'static,
    {
        self.executor = Some(Arc::new(executor));
        self
    }

    /// Execute against an in-memory collection with the default engine
    pub fn over(self, records: Vec<Value>) -> Self {
        self.with_executor(move |query| execute(query, &ExecuteOptions::default(), records.clone()))
    }

    /// Append an arbitrary term
    pub fn term<I, A>(&self, name: &str, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<Arg>,
    {
        let mut query = self.query.clone();
        query.push(Query::call(name, args));
        Builder {
            query,
            executor: self.executor.clone(),
        }
    }

    /// Run the accumulated tree through the executor
    pub fn execute(&self) -> Result<Outcome, EvalError> {
        let executor = self.executor.as_ref().ok_or(EvalError::MissingExecutor)?;
        executor(&self.query)
    }

    fn scalar<I, A>(&self, name: &str, args: I) -> Result<Value, EvalError>
    where
        I: IntoIterator<Item = A>,
        A: Into<Arg>,
    {
        self.term(name, args).execute().map(Outcome::into_value)
    }

    pub fn sort<I, A>(&self, fields: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<Arg>,
    {
        self.term("sort", fields)
    }

    pub fn match_(&self, field: impl Into<Arg>, pattern: impl Into<Arg>) -> Self {
        self.term("match", [field.into(), pattern.into()])
    }

    pub fn in_(&self, field: impl Into<Arg>, values: impl Into<Arg>) -> Self {
        self.term("in", [field.into(), values.into()])
    }

    pub fn out(&self, field: impl Into<Arg>, values: impl Into<Arg>) -> Self {
        self.term("out", [field.into(), values.into()])
    }

    pub fn or<I, A>(&self, terms: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<Arg>,
    {
        self.term("or", terms)
    }

    pub fn and<I, A>(&self, terms: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<Arg>,
    {
        self.term("and", terms)
    }

    pub fn select<I, A>(&self, fields: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<Arg>,
    {
        self.term("select", fields)
    }

    pub fn unselect<I, A>(&self, fields: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<Arg>,
    {
        self.term("unselect", fields)
    }

    /// `needle` is a literal or a predicate term such as `Query::call("ne", ["fun"])`
    pub fn contains(&self, field: impl Into<Arg>, needle: impl Into<Arg>) -> Self {
        self.term("contains", [field.into(), needle.into()])
    }

    pub fn excludes(&self, field: impl Into<Arg>, needle: impl Into<Arg>) -> Self {
        self.term("excludes", [field.into(), needle.into()])
    }

    pub fn values<I, A>(&self, fields: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<Arg>,
    {
        self.term("values", fields)
    }

    pub fn limit(&self, count: i64, skip: i64, hard_count: Option<i64>) -> Self {
        let mut args = vec![Arg::from(count), Arg::from(skip)];
        args.extend(hard_count.map(Arg::from));
        self.term("limit", args)
    }

    pub fn distinct(&self) -> Self {
        self.term("distinct", Vec::<Arg>::new())
    }

    pub fn recurse(&self, field: Option<&str>) -> Self {
        self.term("recurse", field)
    }

    pub fn aggregate<I, A>(&self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<Arg>,
    {
        self.term("aggregate", args)
    }

    pub fn between(&self, field: impl Into<Arg>, low: impl Into<Arg>, high: impl Into<Arg>) -> Self {
        self.term("between", [field.into(), Arg::tuple([low.into(), high.into()])])
    }

    pub fn eq(&self, field: impl Into<Arg>, value: impl Into<Arg>) -> Self {
        self.term("eq", [field.into(), value.into()])
    }

    pub fn ne(&self, field: impl Into<Arg>, value: impl Into<Arg>) -> Self {
        self.term("ne", [field.into(), value.into()])
    }

    pub fn le(&self, field: impl Into<Arg>, value: impl Into<Arg>) -> Self {
        self.term("le", [field.into(), value.into()])
    }

    pub fn ge(&self, field: impl Into<Arg>, value: impl Into<Arg>) -> Self {
        self.term("ge", [field.into(), value.into()])
    }

    pub fn lt(&self, field: impl Into<Arg>, value: impl Into<Arg>) -> Self {
        self.term("lt", [field.into(), value.into()])
    }

    pub fn gt(&self, field: impl Into<Arg>, value: impl Into<Arg>) -> Self {
        self.term("gt", [field.into(), value.into()])
    }

    pub fn sum(&self, field: Option<&str>) -> Result<Value, EvalError> {
        self.scalar("sum", field)
    }

    pub fn mean(&self, field: Option<&str>) -> Result<Value, EvalError> {
        self.scalar("mean", field)
    }

    pub fn max(&self, field: Option<&str>) -> Result<Value, EvalError> {
        self.scalar("max", field)
    }

    pub fn min(&self, field: Option<&str>) -> Result<Value, EvalError> {
        self.scalar("min", field)
    }

    pub fn count(&self) -> Result<Value, EvalError> {
        self.scalar("count", Vec::<Arg>::new())
    }

    pub fn first(&self) -> Result<Value, EvalError> {
        self.scalar("first", Vec::<Arg>::new())
    }

    /// The single remaining record; more than one is a cardinality error
    pub fn one(&self) -> Result<Value, EvalError> {
        self.scalar("one", Vec::<Arg>::new())
    }
}
