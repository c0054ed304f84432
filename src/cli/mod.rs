//! CLI module for schemagate
//!
//! Provides command-line interface for:
//! - check: validate one payload against a named schema
//! - list: show the compiled schema registry

mod args;
mod commands;
mod config;
mod errors;
mod io;

pub use args::{Cli, Command, SchemaArgs};
pub use commands::{build_registry, check, list, run, run_command};
pub use config::{Config, DEFAULT_CONFIG_PATH, ENV_LOG, ENV_SCHEMAS, ENV_SCHEMA_DIR};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_payload, write_error, write_response};
