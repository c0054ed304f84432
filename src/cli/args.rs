//! CLI argument definitions using clap
//!
//! Commands:
//! - schemagate check --schema <name> [--payload <path>]
//! - schemagate list

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// schemagate - closed-world structural validation of JSON payloads
#[derive(Parser, Debug)]
#[command(name = "schemagate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Where schemas come from
#[derive(Args, Debug, Clone, Default)]
pub struct SchemaArgs {
    /// Path to configuration file (default: ./schemagate.json if present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory of schema files, overrides configuration and environment
    #[arg(long)]
    pub schema_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate one JSON payload against a named schema
    Check {
        #[command(flatten)]
        schemas: SchemaArgs,

        /// Name of the schema to validate against
        #[arg(long)]
        schema: String,

        /// Payload file; reads stdin when omitted
        #[arg(long)]
        payload: Option<PathBuf>,
    },

    /// List compiled schemas
    List {
        #[command(flatten)]
        schemas: SchemaArgs,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
