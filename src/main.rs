use clap::{Parser as ClapParser, Subcommand};
use rql::cli::{self, CliError, NormalizeCommand, ParseOptions, QueryOptions};
use rql::output::{to_json, to_json_pretty};
use rql::{NormalizeOptions, ParserConfig};
use std::io::{self, Read};
use tracing_subscriber::EnvFilter;

#[derive(ClapParser)]
#[command(name = "rql")]
#[command(about = "RQL - A URL-safe resource query language for filtering, sorting and aggregating JSON records")]
#[command(version)]
struct Cli {
    /// Log parsing and execution details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a query against a JSON array of records
    Query {
        /// The RQL query to execute
        query: String,

        /// JSON input (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<String>,

        /// JSON value for $1, $2, ... (repeatable)
        #[arg(long = "param")]
        params: Vec<String>,

        /// Field compared by eq() for single-record lookups
        #[arg(long, default_value = "id")]
        primary_key: String,

        /// Do not rewrite %3C/%3E as comparison operators
        #[arg(long)]
        no_json_compat: bool,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,
    },

    /// Print the canonical form, tree and cache of a query
    Parse {
        /// The RQL query to parse
        query: String,

        /// JSON value for $1, $2, ... (repeatable)
        #[arg(long = "param")]
        params: Vec<String>,

        /// Report errors in the output instead of failing
        #[arg(long)]
        gently: bool,
    },

    /// Print the normalized descriptor of a query
    Normalize {
        /// The RQL query to normalize
        query: String,

        /// Upper bound for any requested limit
        #[arg(long)]
        hard_limit: Option<usize>,

        /// Field compared by eq() for single-record lookups
        #[arg(long, default_value = "id")]
        primary_key: String,
    },

    /// List documentation categories
    Docs,

    /// Show documentation for a specific category
    Doc {
        /// Category name (use 'rql docs' to list categories)
        category: String,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Query {
            query,
            input,
            params,
            primary_key,
            no_json_compat,
            pretty,
        } => run_query(
            query,
            input,
            params,
            ParserConfig {
                primary_key,
                json_query_compatible: !no_json_compat,
                ..ParserConfig::default()
            },
            pretty,
        ),
        Commands::Parse {
            query,
            params,
            gently,
        } => run_parse(ParseOptions {
            query,
            parameters: params,
            gently,
            config: ParserConfig::default(),
        }),
        Commands::Normalize {
            query,
            hard_limit,
            primary_key,
        } => run_normalize(NormalizeCommand {
            query,
            options: NormalizeOptions {
                primary_key,
                hard_limit,
            },
        }),
        Commands::Docs => {
            print!("{}", cli::get_docs_overview());
            Ok(())
        }
        Commands::Doc { category } => match cli::get_doc_category(&category) {
            Ok(content) => {
                print!("{}", content);
                Ok(())
            }
            Err(e) => Err(e),
        },
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

/// `RQL_LOG` wins; otherwise warnings, or debug output with --verbose
fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_env("RQL_LOG")
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "rql=debug" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run_query(
    query: String,
    input: Option<String>,
    parameters: Vec<String>,
    config: ParserConfig,
    pretty: bool,
) -> Result<(), CliError> {
    let input = match input {
        Some(s) => Some(s),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer).map_err(CliError::Io)?;
            Some(buffer)
        }
        None => None,
    };

    let options = QueryOptions {
        query,
        input,
        parameters,
        config,
    };

    let output = cli::execute_query(&options)?;
    let json = if pretty {
        to_json_pretty(&output)
    } else {
        to_json(&output)
    };
    println!("{}", json);
    Ok(())
}

fn run_parse(options: ParseOptions) -> Result<(), CliError> {
    let report = cli::parse_report(&options)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn run_normalize(command: NormalizeCommand) -> Result<(), CliError> {
    let report = cli::normalize_report(&command)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
