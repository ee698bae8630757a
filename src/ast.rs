//! # Resource Query Language - Abstract Syntax Tree
//!
//! This module defines the tree produced by the parser, assembled by the
//! builder, consumed by the evaluator and rendered back to text by the
//! serializer.
//!
//! ## Architecture Overview
//!
//! The AST module is organized into focused submodules:
//!
//! - **[query]** - The `Query` node: a name plus ordered arguments
//! - **[arg]** - Argument union: literal value, nested call, literal tuple, parameter
//! - **[cache]** - Root side-table of last-seen operator arguments
//! - **[tokens]** - Tokens produced by the scanner during tree assembly
//! - **[operators]** - Native comparison operators (`eq`, `ne`, `lt`, ...)
//!
//! ## Quick Start
//!
//! ```text
//! price=lt=10&sort(-price)&limit(5)
//! ```
//!
//! This query parses to `and(lt(price,10),sort(-price),limit(5))`.
//!
//! ## Core Concepts
//!
//! ### Calls and Conjunctions
//!
//! Every term is a call `name(arg,...)`. The conjunctions `and` and `or` are
//! ordinary calls whose arguments are the terms they combine. The root is
//! always a conjunction, `and` unless the top-level group was joined by `|`.
//!
//! ### Literal Tuples
//!
//! A parenthesized list without a name is a literal tuple, not a call:
//!
//! ```text
//! in(price,(5,10,15))     // tuple of three numbers
//! nested/property=value   // slash paths desugar to tuples: eq((nested,property),value)
//! ```
//!
//! ### Ownership
//!
//! A node exclusively owns its arguments. There are no parent links in a
//! finished tree, so trees are plain values that can be cloned, compared and
//! shared across executions.
pub mod arg;
pub mod cache;
pub mod operators;
pub mod query;
pub mod tokens;

pub use arg::Arg;
pub use cache::Cache;
pub use operators::Comparison;
pub use query::Query;
pub use tokens::{Delimiter, Token};
