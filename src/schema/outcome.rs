//! Validation outcomes and violations
//!
//! Violations are collected exhaustively: one validation call reports every
//! problem it finds, never just the first.

use std::fmt;

use serde::Serialize;
use serde_json::Number;

use super::types::{is_false, TypeTag};

/// Path used for violations against the payload itself
pub const ROOT_PATH: &str = "$root";

/// What is wrong at a violation's path
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViolationKind {
    /// A declared field is absent from the payload
    MissingRequiredField,
    /// The payload carries a key the schema does not declare
    DisallowedAdditionalProperty,
    /// The value's runtime type differs from the declared one
    TypeMismatch { expected: TypeTag, actual: TypeTag },
    /// A numeric value falls outside its bounds
    OutOfRange {
        actual: Number,
        #[serde(skip_serializing_if = "Option::is_none")]
        min: Option<Number>,
        #[serde(skip_serializing_if = "Option::is_none")]
        max: Option<Number>,
        #[serde(skip_serializing_if = "is_false")]
        exclusive_min: bool,
        #[serde(skip_serializing_if = "is_false")]
        exclusive_max: bool,
    },
}

impl ViolationKind {
    /// Returns the stable name of this violation kind
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationKind::MissingRequiredField => "missing_required_field",
            ViolationKind::DisallowedAdditionalProperty => "disallowed_additional_property",
            ViolationKind::TypeMismatch { .. } => "type_mismatch",
            ViolationKind::OutOfRange { .. } => "out_of_range",
        }
    }
}

/// One located mismatch between a payload and a schema
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    /// Dotted field path, e.g. `address.zipCode`
    pub path: String,
    #[serde(flatten)]
    pub kind: ViolationKind,
}

impl Violation {
    pub fn missing_field(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: ViolationKind::MissingRequiredField,
        }
    }

    pub fn extra_field(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: ViolationKind::DisallowedAdditionalProperty,
        }
    }

    pub fn type_mismatch(path: impl Into<String>, expected: TypeTag, actual: TypeTag) -> Self {
        Self {
            path: path.into(),
            kind: ViolationKind::TypeMismatch { expected, actual },
        }
    }

    pub fn out_of_range(
        path: impl Into<String>,
        actual: Number,
        min: Option<Number>,
        max: Option<Number>,
    ) -> Self {
        Self {
            path: path.into(),
            kind: ViolationKind::OutOfRange {
                actual,
                min,
                max,
                exclusive_min: false,
                exclusive_max: false,
            },
        }
    }

    /// Marks the bounds of an out-of-range violation as exclusive.
    pub fn exclusive(mut self, lower: bool, upper: bool) -> Self {
        if let ViolationKind::OutOfRange {
            exclusive_min,
            exclusive_max,
            ..
        } = &mut self.kind
        {
            *exclusive_min = lower;
            *exclusive_max = upper;
        }
        self
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ViolationKind::MissingRequiredField => {
                write!(f, "field '{}': required field is missing", self.path)
            }
            ViolationKind::DisallowedAdditionalProperty => {
                write!(f, "field '{}': undeclared field is not allowed", self.path)
            }
            ViolationKind::TypeMismatch { expected, actual } => {
                write!(f, "field '{}': expected {}, got {}", self.path, expected, actual)
            }
            ViolationKind::OutOfRange {
                actual,
                min,
                max,
                exclusive_min,
                exclusive_max,
            } => {
                let lower = min.as_ref().map_or("-inf".to_string(), |n| n.to_string());
                let upper = max.as_ref().map_or("+inf".to_string(), |n| n.to_string());
                write!(
                    f,
                    "field '{}': {} is outside {}{}, {}{}",
                    self.path,
                    actual,
                    if *exclusive_min { '(' } else { '[' },
                    lower,
                    upper,
                    if *exclusive_max { ')' } else { ']' },
                )
            }
        }
    }
}

/// Verdict of one validation call
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "verdict", rename_all = "lowercase")]
pub enum ValidationOutcome {
    Valid,
    Invalid { violations: Vec<Violation> },
}

impl ValidationOutcome {
    /// Builds an outcome from the collected violations
    pub fn from_violations(violations: Vec<Violation>) -> Self {
        if violations.is_empty() {
            ValidationOutcome::Valid
        } else {
            ValidationOutcome::Invalid { violations }
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid)
    }

    /// Returns the collected violations; empty when valid
    pub fn violations(&self) -> &[Violation] {
        match self {
            ValidationOutcome::Valid => &[],
            ValidationOutcome::Invalid { violations } => violations,
        }
    }
}

impl fmt::Display for ValidationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationOutcome::Valid => write!(f, "valid"),
            ValidationOutcome::Invalid { violations } => {
                write!(f, "invalid ({} violations)", violations.len())?;
                for violation in violations {
                    write!(f, "\n  - {}", violation)?;
                }
                Ok(())
            }
        }
    }
}
