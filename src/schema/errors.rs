//! Schema error types
//!
//! Error codes:
//! - SCHEMA_SOURCE_UNREADABLE (FATAL)
//! - SCHEMA_IDENTIFIER_MISSING (FATAL)
//! - SCHEMA_MALFORMED_DEFINITION (FATAL)
//! - SCHEMA_UNKNOWN_IDENTIFIER (FATAL)
//! - SCHEMA_DUPLICATE_FIELD (FATAL)
//! - SCHEMA_EMPTY_REGISTRY (FATAL)
//! - SCHEMA_NOT_FOUND (REJECT)
//! - SCHEMA_MALFORMED_PAYLOAD (REJECT)
//!
//! Build-time errors are fatal: the registry refuses to exist rather than
//! run with a partial schema set. Call-time errors only reject the one
//! payload they concern.

use std::fmt;

use thiserror::Error;

/// Severity levels for schema errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The single validation call is rejected
    Reject,
    /// The validation subsystem must not start
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Errors raised while building a registry or serving a validation call.
///
/// Payload violations are not errors; they are returned as data inside
/// [`ValidationOutcome::Invalid`](super::ValidationOutcome::Invalid).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("schema source '{origin}' is unreadable: {reason}")]
    SourceUnreadable { origin: String, reason: String },

    #[error("schema source '{origin}' declares no package identifier")]
    IdentifierMissing { origin: String },

    #[error("malformed schema definition in '{origin}' at line {line}: {reason}")]
    MalformedDefinition {
        origin: String,
        line: usize,
        reason: String,
    },

    #[error("schema source '{origin}' has no definition '#{identifier}' matching its package")]
    UnknownIdentifier { origin: String, identifier: String },

    #[error("field '{field}' is declared more than once in '{origin}'")]
    DuplicateFieldDeclaration { origin: String, field: String },

    #[error("schema registry has no sources to compile")]
    EmptyRegistry,

    #[error("schema '{0}' not found")]
    SchemaNotFound(String),

    #[error("payload is not well-formed JSON: {0}")]
    MalformedPayload(String),
}

impl SchemaError {
    pub(crate) fn malformed(origin: &str, line: usize, reason: impl Into<String>) -> Self {
        SchemaError::MalformedDefinition {
            origin: origin.to_string(),
            line,
            reason: reason.into(),
        }
    }

    /// Returns the stable string code of this error
    pub fn code(&self) -> &'static str {
        match self {
            SchemaError::SourceUnreadable { .. } => "SCHEMA_SOURCE_UNREADABLE",
            SchemaError::IdentifierMissing { .. } => "SCHEMA_IDENTIFIER_MISSING",
            SchemaError::MalformedDefinition { .. } => "SCHEMA_MALFORMED_DEFINITION",
            SchemaError::UnknownIdentifier { .. } => "SCHEMA_UNKNOWN_IDENTIFIER",
            SchemaError::DuplicateFieldDeclaration { .. } => "SCHEMA_DUPLICATE_FIELD",
            SchemaError::EmptyRegistry => "SCHEMA_EMPTY_REGISTRY",
            SchemaError::SchemaNotFound(_) => "SCHEMA_NOT_FOUND",
            SchemaError::MalformedPayload(_) => "SCHEMA_MALFORMED_PAYLOAD",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            SchemaError::SchemaNotFound(_) | SchemaError::MalformedPayload(_) => Severity::Reject,
            _ => Severity::Fatal,
        }
    }

    /// Returns whether this error must stop the validation subsystem from starting
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }

    /// Returns the schema source this error originated from, if any
    pub fn origin(&self) -> Option<&str> {
        match self {
            SchemaError::SourceUnreadable { origin, .. }
            | SchemaError::IdentifierMissing { origin }
            | SchemaError::MalformedDefinition { origin, .. }
            | SchemaError::UnknownIdentifier { origin, .. }
            | SchemaError::DuplicateFieldDeclaration { origin, .. } => Some(origin),
            _ => None,
        }
    }
}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(SchemaError::EmptyRegistry.code(), "SCHEMA_EMPTY_REGISTRY");
        assert_eq!(
            SchemaError::SchemaNotFound("person".into()).code(),
            "SCHEMA_NOT_FOUND"
        );
        assert_eq!(
            SchemaError::MalformedPayload("eof".into()).code(),
            "SCHEMA_MALFORMED_PAYLOAD"
        );
    }

    #[test]
    fn test_severity_levels() {
        assert_eq!(SchemaError::EmptyRegistry.severity(), Severity::Fatal);
        assert_eq!(
            SchemaError::IdentifierMissing { origin: "a.cue".into() }.severity(),
            Severity::Fatal
        );
        assert_eq!(
            SchemaError::SchemaNotFound("x".into()).severity(),
            Severity::Reject
        );
        assert!(!SchemaError::MalformedPayload("x".into()).is_fatal());
    }

    #[test]
    fn test_display_names_source() {
        let err = SchemaError::malformed("schemas/person.cue", 4, "expected ':'");
        let display = err.to_string();
        assert!(display.contains("schemas/person.cue"));
        assert!(display.contains("line 4"));
        assert_eq!(err.origin(), Some("schemas/person.cue"));
    }

    #[test]
    fn test_call_errors_have_no_origin() {
        assert_eq!(SchemaError::SchemaNotFound("x".into()).origin(), None);
        assert_eq!(SchemaError::EmptyRegistry.origin(), None);
    }
}
