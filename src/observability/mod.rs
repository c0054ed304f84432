//! Observability for schemagate
//!
//! The library only emits `tracing` events, each tagged with an
//! `event = <EVENT_NAME>` field. Installing a subscriber is left to the
//! binary (or the embedding service).
//!
//! # Usage
//!
//! ```ignore
//! use schemagate::observability::{self, Event};
//!
//! observability::init("info")?;
//! tracing::info!(event = %Event::ConfigLoaded, schema_dir = "schemas");
//! ```

mod events;

pub use events::Event;

use tracing_subscriber::EnvFilter;

/// Environment variable consulted before the configured level
pub const LOG_ENV: &str = "RUST_LOG";

/// Installs a JSON subscriber writing to stderr.
///
/// `RUST_LOG` takes precedence over `default_level`. Installing twice is a
/// no-op so tests and embedding services can call this freely.
///
/// # Errors
///
/// Returns the filter parse error if neither `RUST_LOG` nor
/// `default_level` is a valid filter directive.
pub fn init(default_level: &str) -> Result<(), tracing_subscriber::filter::ParseError> {
    let filter = match EnvFilter::try_from_env(LOG_ENV) {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_level)?,
    };

    let _ = tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();

    Ok(())
}
