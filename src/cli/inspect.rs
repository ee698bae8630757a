//! Parse and normalize queries without executing them

use indexmap::IndexMap;
use serde_json::json;

use super::{CliError, args_to_json, cache_to_json, parse_parameters, query_to_json};
use crate::normalize::{NormalizeOptions, Normalized, normalize};
use crate::parser::{Parser, ParserConfig};

/// Options for the parse command
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    pub query: String,
    /// JSON text of each `$N` parameter; empty leaves parameters unbound
    pub parameters: Vec<String>,
    /// Capture errors in the report instead of failing
    pub gently: bool,
    pub config: ParserConfig,
}

/// Canonical text, tree and cache of a parsed query
pub fn parse_report(options: &ParseOptions) -> Result<serde_json::Value, CliError> {
    let parser = Parser::new(options.config.clone());
    let parameters = parse_parameters(&options.parameters)?;
    let parameters = (!parameters.is_empty()).then_some(parameters.as_slice());

    let query = if options.gently {
        parser.parse_gently(&options.query, parameters)
    } else {
        parser.parse(&options.query, parameters)?
    };

    Ok(json!({
        "canonical": query.to_string(),
        "tree": query_to_json(&query),
        "cache": cache_to_json(&query.cache),
        "error": query.error,
    }))
}

/// Options for the normalize command
#[derive(Debug, Clone, Default)]
pub struct NormalizeCommand {
    pub query: String,
    pub options: NormalizeOptions,
}

/// Normalized descriptor of a query as JSON
pub fn normalize_report(command: &NormalizeCommand) -> Result<serde_json::Value, CliError> {
    let config = ParserConfig {
        primary_key: command.options.primary_key.clone(),
        ..ParserConfig::default()
    };
    let query = Parser::new(config).parse(&command.query, None)?;
    Ok(normalized_to_json(&normalize(&query, &command.options)))
}

fn normalized_to_json(normalized: &Normalized) -> serde_json::Value {
    json!({
        "sort": args_to_json(&normalized.sort),
        "sortOrdered": ordered_weights(&normalized.sort_ordered),
        "sortByField": field_weights(&normalized.sort_by_field),
        "select": args_to_json(&normalized.select),
        "selectOrdered": ordered_weights(&normalized.select_ordered),
        "selectByField": field_weights(&normalized.select_by_field),
        "limit": normalized.limit,
        "skip": normalized.skip,
        "totalCountCap": normalized.total_count_cap,
        "needsCount": normalized.needs_count,
        "values": normalized.values,
        "primaryKeyEquality": normalized.primary_key_equality,
    })
}

/// `[{"price": -1}, {"name": 1}]`
fn ordered_weights(pairs: &[(String, i8)]) -> serde_json::Value {
    pairs
        .iter()
        .map(|(field, weight)| {
            let mut entry = serde_json::Map::new();
            entry.insert(field.clone(), json!(weight));
            serde_json::Value::Object(entry)
        })
        .collect()
}

fn field_weights(weights: &IndexMap<String, i8>) -> serde_json::Value {
    weights
        .iter()
        .map(|(field, weight)| (field.clone(), json!(weight)))
        .collect::<serde_json::Map<_, _>>()
        .into()
}
