pub mod ast;
pub mod builder;
pub mod cli;
pub mod coerce;
pub mod desugar;
pub mod evaluator;
pub mod lexer;
pub mod normalize;
pub mod operators;
pub mod output;
pub mod parser;
pub mod path;
pub mod serialize;
pub mod value;

pub use ast::{Arg, Cache, Comparison, Query, Token};
pub use builder::{Builder, KNOWN_OPERATORS, KNOWN_SCALAR_OPERATORS};
pub use coerce::Converter;
pub use evaluator::{
    EvalError, Evaluator, Executable, ExecuteOptions, MAX_ITERATIONS, Operand, Operator, Outcome,
    Page, Records, compile, compile_str, execute, execute_str,
};
pub use lexer::Lexer;
pub use normalize::{NormalizeOptions, Normalized, normalize};
pub use output::{to_json, to_json_pretty};
pub use parser::{ParseError, Parser, ParserConfig, parse, parse_gently, parse_with_parameters};
pub use path::PropertyPath;
pub use serialize::encode_value;
pub use value::{Pattern, Value};
