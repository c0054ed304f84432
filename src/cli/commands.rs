//! CLI command implementations
//!
//! Every command resolves configuration, builds the schema registry once
//! (failing fast on any bad schema source) and writes one JSON line.

use std::env;
use std::path::Path;

use serde_json::{json, Value};

use crate::observability::{self, Event};
use crate::schema::{SchemaRegistry, ValidationOutcome};

use super::args::{Cli, Command, SchemaArgs};
use super::config::Config;
use super::errors::{CliError, CliResult};
use super::io::{read_payload, write_error, write_response};

/// Parse arguments and run the selected command.
///
/// Returns `Ok(false)` when a payload was checked and found invalid.
/// Errors are also written to stdout as a JSON error line.
pub fn run() -> CliResult<bool> {
    let cli = Cli::parse_args();
    let result = run_command(cli.command);
    if let Err(e) = &result {
        write_error(e.code_str(), e.message())?;
    }
    result
}

/// Dispatch a parsed command
pub fn run_command(command: Command) -> CliResult<bool> {
    match command {
        Command::Check {
            schemas,
            schema,
            payload,
        } => check(&schemas, &schema, payload.as_deref()),
        Command::List { schemas } => {
            list(&schemas)?;
            Ok(true)
        }
    }
}

/// Resolve configuration from the process environment and the arguments
fn resolve_config(args: &SchemaArgs) -> CliResult<Config> {
    let mut config = Config::load(args.config.as_deref(), |key| env::var(key).ok())?;
    if let Some(dir) = &args.schema_dir {
        config.schema_dir = dir.clone();
    }

    observability::init(&config.log_level)
        .map_err(|e| CliError::config_error(format!("Invalid log_level: {}", e)))?;

    tracing::info!(
        event = %Event::ConfigLoaded,
        schema_dir = %config.schema_dir.display(),
        schemas = config.schemas.len(),
    );

    Ok(config)
}

/// Build the registry the configuration describes
pub fn build_registry(config: &Config) -> CliResult<SchemaRegistry> {
    let sources = config.sources()?;
    Ok(SchemaRegistry::build(&sources)?)
}

/// Validate one payload against a named schema
pub fn check(args: &SchemaArgs, schema: &str, payload: Option<&Path>) -> CliResult<bool> {
    let config = resolve_config(args)?;
    let registry = build_registry(&config)?;
    let bytes = read_payload(payload)?;

    let outcome = registry.validator().validate(schema, &bytes)?;
    let valid = outcome.is_valid();

    write_response(outcome_json(schema, &outcome)?)?;
    Ok(valid)
}

/// List compiled schemas
pub fn list(args: &SchemaArgs) -> CliResult<()> {
    let config = resolve_config(args)?;
    let registry = build_registry(&config)?;
    write_response(registry_json(&registry)?)
}

fn outcome_json(schema: &str, outcome: &ValidationOutcome) -> CliResult<Value> {
    let mut data = json!({
        "schema": schema,
        "valid": outcome.is_valid(),
    });
    if !outcome.is_valid() {
        data["violations"] = serde_json::to_value(outcome.violations())?;
    }
    Ok(data)
}

fn registry_json(registry: &SchemaRegistry) -> CliResult<Value> {
    let schemas = registry
        .schemas()
        .into_iter()
        .map(|schema| -> CliResult<Value> {
            let mut entry = serde_json::to_value(schema)?;
            entry["required_fields"] = json!(schema.required_fields());
            Ok(entry)
        })
        .collect::<CliResult<Vec<Value>>>()?;

    Ok(json!({ "schemas": schemas }))
}
