use std::collections::HashMap;
use std::fmt;

use tracing::{debug, trace};

use crate::ast::{Arg, Cache, Delimiter, Query, Token};
use crate::coerce::Converter;
use crate::desugar::desugar;
use crate::lexer::Lexer;
use crate::value::Value;

/// Errors raised while parsing a query.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// Malformed query text: leading `?`, unknown operator symbol,
    /// unbalanced parentheses, mixed conjunctions, illegal characters
    Syntax(String),

    /// A literal that its converter rejected, or an unknown converter
    InvalidLiteral(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Syntax(msg) => write!(f, "Syntax error: {}", msg),
            ParseError::InvalidLiteral(msg) => write!(f, "Invalid literal: {}", msg),
        }
    }
}

impl std::error::Error for ParseError {}

/// Parser settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ParserConfig {
    /// Field whose `eq` test is cached as a single-record lookup
    pub primary_key: String,

    /// Rewrite `%3C`/`%3E` (escaped `<`/`>`) to long-form operators
    pub json_query_compatible: bool,

    /// Operators whose last-seen arguments are cached on the root
    pub cached_operators: Vec<String>,

    /// Converter for literals without a `name:` prefix
    pub default_converter: Converter,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            primary_key: "id".to_string(),
            json_query_compatible: true,
            cached_operators: ["sort", "select", "values", "limit"]
                .into_iter()
                .map(String::from)
                .collect(),
            default_converter: Converter::Auto,
        }
    }
}

/// Turns query text (or a key/value shorthand) into a [`Query`] tree.
#[derive(Debug, Clone, Default)]
pub struct Parser {
    config: ParserConfig,
}

impl Parser {
    pub fn new(config: ParserConfig) -> Self {
        Parser { config }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parse query text.
    ///
    /// `$N` tokens dereference the N-th (1-based) entry of `parameters`. When
    /// no parameters are given they stay in the tree as [`Arg::Param`] and
    /// are bound at execution time.
    ///
    /// # Examples
    ///
    /// ```
    /// use rql::{Arg, Parser, Query};
    ///
    /// let parser = Parser::default();
    /// let query = parser.parse("price=lt=10", None).unwrap();
    ///
    /// assert_eq!(query.name, "and");
    /// assert_eq!(query.args, vec![Arg::Call(Query::call("lt", [Arg::from("price"), Arg::from(10)]))]);
    /// ```
    pub fn parse(&self, input: &str, parameters: Option<&[Value]>) -> Result<Query, ParseError> {
        debug!(
            input_len = input.len(),
            parameters = parameters.map_or(0, |p| p.len()),
            "parsing query"
        );

        let text = desugar(input, self.config.json_query_compatible)?;
        trace!(desugared = %text, "desugared query text");

        let mut assembler = Assembler::new(&self.config, parameters);
        let mut lexer = Lexer::new(&text);
        let mut pending: Option<Token> = None;

        loop {
            let token = match pending.take() {
                Some(token) => token,
                None => lexer.next_token()?,
            };

            match token {
                Token::Eof => break,
                Token::RParen => assembler.close()?,
                token => {
                    let mut token = token;

                    let mut delimiter = None;
                    if let Token::Delimiter(d) = token {
                        assembler.set_conjunction(d)?;
                        delimiter = Some(d);
                        token = lexer.next_token()?;
                    }

                    let mut word = None;
                    if let Token::Word(w) = token {
                        word = Some(w);
                        token = lexer.next_token()?;
                    }

                    if token == Token::LParen {
                        assembler.open(word.unwrap_or_default());
                    } else {
                        if word.is_some() || delimiter == Some(Delimiter::Comma) {
                            assembler.append_literal(&word.unwrap_or_default())?;
                        }
                        pending = Some(token);
                    }
                }
            }
        }

        assembler.finish()
    }

    /// Parse without failing: errors are captured on an empty `and` root.
    pub fn parse_gently(&self, input: &str, parameters: Option<&[Value]>) -> Query {
        match self.parse(input, parameters) {
            Ok(query) => query,
            Err(e) => {
                debug!(error = %e, "gentle parse captured error");
                Query {
                    error: Some(e.to_string()),
                    ..Query::default()
                }
            }
        }
    }

    /// Build `and(eq(key,value),...)` from already-typed pairs.
    pub fn parse_shorthand<I, K, V>(&self, pairs: I) -> Query
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut root = Query::default();
        for (key, value) in pairs {
            let key = key.into();
            let value = value.into();
            if key == self.config.primary_key
                && let Some(id) = primary_key_text(&value)
            {
                root.cache.set_primary_key(&key, id);
            }
            root.push(Query::call("eq", [Arg::from(key), Arg::Value(value)]));
        }
        root
    }
}

/// Parse with the default configuration
pub fn parse(input: &str) -> Result<Query, ParseError> {
    Parser::default().parse(input, None)
}

/// Parse with the default configuration, binding `$N` parameters
pub fn parse_with_parameters(input: &str, parameters: &[Value]) -> Result<Query, ParseError> {
    Parser::default().parse(input, Some(parameters))
}

/// Gentle parse with the default configuration
pub fn parse_gently(input: &str) -> Query {
    Parser::default().parse_gently(input, None)
}

/// An open group during assembly.
struct Frame {
    id: usize,
    query: Query,
}

/// Explicit stack of open groups; the root sits at the bottom.
struct Assembler<'a> {
    config: &'a ParserConfig,
    parameters: Option<&'a [Value]>,
    stack: Vec<Frame>,
    cache: Cache,
    /// Which frame currently owns each cached operator's entry
    holders: HashMap<String, usize>,
    next_id: usize,
}

impl<'a> Assembler<'a> {
    fn new(config: &'a ParserConfig, parameters: Option<&'a [Value]>) -> Self {
        Assembler {
            config,
            parameters,
            stack: vec![Frame {
                id: 0,
                query: Query::new(""),
            }],
            cache: Cache::default(),
            holders: HashMap::new(),
            next_id: 1,
        }
    }

    /// The innermost open group; the root frame is only taken by `finish`
    fn current(&mut self) -> &mut Frame {
        let top = self.stack.len() - 1;
        &mut self.stack[top]
    }

    fn set_conjunction(&mut self, delimiter: Delimiter) -> Result<(), ParseError> {
        let Some(conjunction) = delimiter.conjunction() else {
            return Ok(());
        };
        let frame = self.current();
        if frame.query.name.is_empty() {
            frame.query.name = conjunction.to_string();
            Ok(())
        } else if frame.query.name != conjunction {
            Err(ParseError::Syntax(
                "Can not mix conjunctions within a group, use parenthesis around each set of same conjunctions (& and |)"
                    .to_string(),
            ))
        } else {
            Ok(())
        }
    }

    fn open(&mut self, name: String) {
        let id = self.next_id;
        self.next_id += 1;
        self.stack.push(Frame {
            id,
            query: Query::new(name),
        });
        self.touch();
    }

    fn close(&mut self) -> Result<(), ParseError> {
        let frame = if self.stack.len() > 1 { self.stack.pop() } else { None };
        let Some(Frame { id, query }) = frame else {
            return Err(ParseError::Syntax(
                "Closing parenthesis without an opening parenthesis".to_string(),
            ));
        };

        if self.holders.get(&query.name) == Some(&id) {
            self.cache.record(&query.name, &query.args);
        }

        let arg = if query.name.is_empty() {
            Arg::Tuple(query.args)
        } else {
            Arg::Call(query)
        };
        self.current().query.args.push(arg);
        Ok(())
    }

    fn append_literal(&mut self, text: &str) -> Result<(), ParseError> {
        let arg = self.literal(text)?;
        self.current().query.args.push(arg);
        self.touch();

        let config = self.config;
        let primary_key = &config.primary_key;
        let frame = &self.stack[self.stack.len() - 1];
        if frame.query.name == "eq"
            && frame.query.args.first().and_then(Arg::as_str) == Some(primary_key.as_str())
            && let Some(id) = frame.query.args.get(1).and_then(Arg::as_value).and_then(primary_key_text)
        {
            self.cache.set_primary_key(primary_key, id);
        }
        Ok(())
    }

    /// Mark the current frame as the latest holder of its cache entry
    fn touch(&mut self) {
        let config = self.config;
        let frame = self.current();
        if config.cached_operators.iter().any(|op| *op == frame.query.name) {
            let (name, id) = (frame.query.name.clone(), frame.id);
            self.holders.insert(name, id);
        }
    }

    fn literal(&self, text: &str) -> Result<Arg, ParseError> {
        if let Some(index) = text.strip_prefix('$') {
            let digits: String = index.chars().take_while(char::is_ascii_digit).collect();
            let position = digits.parse::<usize>().ok().filter(|n| *n > 0);
            return Ok(match (position, self.parameters) {
                (Some(n), Some(params)) => bound_arg(params.get(n - 1).cloned().unwrap_or(Value::Null)),
                (Some(n), None) => Arg::Param(n),
                (None, _) => Arg::Value(Value::Null),
            });
        }

        let (converter, text) = match text.split_once(':') {
            Some((name, rest)) => {
                let converter = Converter::from_name(name)
                    .ok_or_else(|| ParseError::InvalidLiteral(format!("Unknown converter {}", name)))?;
                (converter, rest)
            }
            None => (self.config.default_converter, text),
        };
        converter.convert(text).map(Arg::Value)
    }

    fn finish(mut self) -> Result<Query, ParseError> {
        let root = if self.stack.len() == 1 { self.stack.pop() } else { None };
        let Some(Frame { query: mut root, .. }) = root else {
            return Err(ParseError::Syntax(
                "Opening parenthesis without a closing parenthesis".to_string(),
            ));
        };
        if root.name.is_empty() {
            root.name = "and".to_string();
        }
        root.cache = self.cache;
        Ok(root)
    }
}

/// A bound array reads back as a tuple, so it is stored as one
fn bound_arg(value: Value) -> Arg {
    match value {
        Value::Array(items) => Arg::Tuple(items.into_iter().map(bound_arg).collect()),
        other => Arg::Value(other),
    }
}

/// Text recorded for a primary-key lookup; regexes and collections are skipped
fn primary_key_text(value: &Value) -> Option<String> {
    match value {
        Value::Regex(_) | Value::Array(_) | Value::Object(_) => None,
        other => Some(other.as_string()),
    }
}
