use crate::ast::{Arg, Cache};

/// A query term: `name(args...)`.
///
/// The root node returned by the parser additionally carries the [`Cache`]
/// side-table and, for gentle parses that failed, the error message. Nested
/// nodes leave both empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// Operator or conjunction name
    pub name: String,

    /// Ordered arguments
    pub args: Vec<Arg>,

    /// Last-seen operator arguments (root only)
    pub cache: Cache,

    /// Failure captured by a gentle parse
    pub error: Option<String>,
}

impl Default for Query {
    fn default() -> Self {
        Query::new("and")
    }
}

impl Query {
    pub fn new(name: impl Into<String>) -> Self {
        Query {
            name: name.into(),
            args: Vec::new(),
            cache: Cache::default(),
            error: None,
        }
    }

    /// Create a call term with the given arguments
    pub fn call<I, A>(name: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<Arg>,
    {
        Query {
            args: args.into_iter().map(Into::into).collect(),
            ..Query::new(name)
        }
    }

    /// Append a term in place
    pub fn push(&mut self, term: impl Into<Arg>) -> &mut Self {
        self.args.push(term.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn is_conjunction(&self) -> bool {
        self.name == "and" || self.name == "or"
    }

    /// The same tree with the side-table and captured error dropped
    pub fn without_cache(&self) -> Query {
        Query {
            name: self.name.clone(),
            args: self.args.clone(),
            cache: Cache::default(),
            error: None,
        }
    }

    /// Visit every leaf call term.
    ///
    /// A call whose first argument is itself a call is treated as grouping
    /// structure and recursed through; any other call is handed to `visit`
    /// with its name and arguments.
    pub fn walk<F>(&self, visit: &mut F)
    where
        F: FnMut(&str, &[Arg]),
    {
        walk_terms(&self.args, visit);
    }
}

fn walk_terms<F>(terms: &[Arg], visit: &mut F)
where
    F: FnMut(&str, &[Arg]),
{
    for term in terms {
        let Arg::Call(query) = term else {
            continue;
        };
        if query.args.first().is_some_and(Arg::is_call) {
            walk_terms(&query.args, visit);
        } else {
            visit(&query.name, &query.args);
        }
    }
}
