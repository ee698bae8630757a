//! Execute RQL queries against JSON input

use indexmap::IndexMap;

use super::{CliError, json_to_value};
use crate::evaluator::{ExecuteOptions, Outcome, execute};
use crate::parser::{Parser, ParserConfig};
use crate::value::Value;

/// Options for the query command
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// The RQL query to execute
    pub query: String,
    /// JSON array of records
    pub input: Option<String>,
    /// JSON text of each `$N` parameter, in order
    pub parameters: Vec<String>,
    /// Parser settings
    pub config: ParserConfig,
}

/// Parse JSON parameter texts into values
pub fn parse_parameters(parameters: &[String]) -> Result<Vec<Value>, CliError> {
    parameters
        .iter()
        .map(|text| Ok(json_to_value(serde_json::from_str(text)?)))
        .collect()
}

/// Execute a query against the input records.
///
/// A paged result (`limit` with a hard count) is wrapped as
/// `{"items": [...], "start": .., "end": .., "totalCount": ..}`.
pub fn execute_query(options: &QueryOptions) -> Result<Value, CliError> {
    let json_str = options.input.as_ref().ok_or(CliError::NoInput)?;
    let records = match json_to_value(serde_json::from_str(json_str)?) {
        Value::Array(records) => records,
        single => vec![single],
    };

    let parameters = parse_parameters(&options.parameters)?;
    let query = Parser::new(options.config.clone()).parse(&options.query, Some(&parameters))?;
    let execute_options = ExecuteOptions::new().with_parameters(parameters);

    Ok(match execute(&query, &execute_options, records)? {
        Outcome::Records(records) => match records.page {
            Some(page) => {
                let mut paged = IndexMap::new();
                paged.insert("items".to_string(), Value::Array(records.items));
                paged.insert("start".to_string(), Value::Integer(page.start as i64));
                paged.insert(
                    "end".to_string(),
                    page.end.map_or(Value::Null, |end| Value::Integer(end as i64)),
                );
                paged.insert("totalCount".to_string(), Value::Integer(page.total_count as i64));
                Value::Object(paged)
            }
            None => Value::Array(records.items),
        },
        Outcome::Scalar(value) => value,
    })
}
