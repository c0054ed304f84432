//! Observable events for schemagate
//!
//! Every log line carries an `event` field naming one of these. Events are
//! explicit and typed so log consumers can match on stable names.

use std::fmt;

/// Observable events in schemagate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Configuration resolved from env, file and defaults
    ConfigLoaded,

    // Registry construction
    /// Registry build begins
    RegistryBuildStart,
    /// One schema source compiled
    SchemaCompiled,
    /// A later source replaced a schema with the same identifier
    SchemaReplaced,
    /// Registry build complete, ready to validate
    RegistryBuilt,
    /// Registry build aborted (FATAL)
    RegistryBuildFailed,

    // Validation calls
    /// Payload conforms to its schema
    ValidationPassed,
    /// Payload violates its schema
    ValidationFailed,
    /// Payload could not be parsed
    PayloadRejected,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",

            Event::RegistryBuildStart => "REGISTRY_BUILD_BEGIN",
            Event::SchemaCompiled => "SCHEMA_COMPILED",
            Event::SchemaReplaced => "SCHEMA_REPLACED",
            Event::RegistryBuilt => "REGISTRY_BUILD_COMPLETE",
            Event::RegistryBuildFailed => "REGISTRY_BUILD_FAILED",

            Event::ValidationPassed => "VALIDATION_PASSED",
            Event::ValidationFailed => "VALIDATION_FAILED",
            Event::PayloadRejected => "PAYLOAD_REJECTED",
        }
    }

    /// Returns true if this event indicates a fatal condition
    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::RegistryBuildFailed)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
