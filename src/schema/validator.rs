//! Structural validator for JSON payloads
//!
//! Validation semantics:
//! - All declared fields are present
//! - No undeclared fields exist
//! - Field types exactly match schema types (no coercion, no nulls)
//! - Numeric values lie within their bounds
//! - Integers may be written as whole floats (`56.0`)
//!
//! Every check runs to completion; the outcome lists all violations in
//! declaration order, followed by the undeclared keys of each object.

use serde_json::{Map, Number, Value};

use super::errors::{SchemaError, SchemaResult};
use super::outcome::{ValidationOutcome, Violation, ROOT_PATH};
use super::registry::SchemaRegistry;
use super::types::{FieldConstraint, StructuralSchema, TypeTag};
use crate::observability::Event;

/// Anything able to check a payload against a named schema.
///
/// Lets callers swap in another engine without touching call sites.
pub trait Validation: Send + Sync {
    fn validate(&self, schema_name: &str, payload: &[u8]) -> SchemaResult<ValidationOutcome>;
}

/// Stateless validator backed by a schema registry.
///
/// Never mutates the registry or caches anything between calls.
#[derive(Debug, Clone, Copy)]
pub struct StructuralValidator<'a> {
    registry: &'a SchemaRegistry,
}

impl<'a> StructuralValidator<'a> {
    /// Creates a new validator backed by the given registry.
    pub fn new(registry: &'a SchemaRegistry) -> Self {
        Self { registry }
    }

    /// Parses and validates a raw JSON payload.
    ///
    /// # Errors
    ///
    /// - `SchemaNotFound` if the registry has no schema `schema_name`
    /// - `MalformedPayload` if `payload` is not well-formed JSON
    pub fn validate(&self, schema_name: &str, payload: &[u8]) -> SchemaResult<ValidationOutcome> {
        let schema = self.schema(schema_name)?;

        let value: Value = serde_json::from_slice(payload).map_err(|e| {
            tracing::debug!(event = %Event::PayloadRejected, schema = %schema_name, error = %e);
            SchemaError::MalformedPayload(e.to_string())
        })?;

        Ok(self.check(schema, &value))
    }

    /// Validates an already parsed JSON value.
    ///
    /// # Errors
    ///
    /// Returns `SchemaNotFound` if the registry has no schema `schema_name`.
    pub fn validate_value(&self, schema_name: &str, value: &Value) -> SchemaResult<ValidationOutcome> {
        let schema = self.schema(schema_name)?;
        Ok(self.check(schema, value))
    }

    fn schema(&self, schema_name: &str) -> SchemaResult<&'a StructuralSchema> {
        self.registry
            .lookup(schema_name)
            .ok_or_else(|| SchemaError::SchemaNotFound(schema_name.to_string()))
    }

    fn check(&self, schema: &StructuralSchema, value: &Value) -> ValidationOutcome {
        let mut violations = Vec::new();

        match value.as_object() {
            Some(obj) => validate_object(obj, schema, "", &mut violations),
            None => violations.push(Violation::type_mismatch(
                ROOT_PATH,
                TypeTag::Object,
                TypeTag::of(value),
            )),
        }

        let outcome = ValidationOutcome::from_violations(violations);
        if outcome.is_valid() {
            tracing::debug!(event = %Event::ValidationPassed, schema = %schema.name);
        } else {
            tracing::debug!(
                event = %Event::ValidationFailed,
                schema = %schema.name,
                violations = outcome.violations().len(),
            );
        }
        outcome
    }
}

impl Validation for StructuralValidator<'_> {
    fn validate(&self, schema_name: &str, payload: &[u8]) -> SchemaResult<ValidationOutcome> {
        StructuralValidator::validate(self, schema_name, payload)
    }
}

/// Walks one object: declared fields first, then undeclared keys.
fn validate_object(
    obj: &Map<String, Value>,
    schema: &StructuralSchema,
    path_prefix: &str,
    violations: &mut Vec<Violation>,
) {
    for field in &schema.fields {
        let field_path = make_path(path_prefix, &field.name);
        match obj.get(&field.name) {
            Some(value) => validate_value(value, &field.constraint, &field_path, violations),
            None => violations.push(Violation::missing_field(field_path)),
        }
    }

    if !schema.additional_properties_allowed {
        for key in obj.keys() {
            if !schema.declares(key) {
                violations.push(Violation::extra_field(make_path(path_prefix, key)));
            }
        }
    }
}

/// Validates a value against a field constraint.
fn validate_value(
    value: &Value,
    constraint: &FieldConstraint,
    field_path: &str,
    violations: &mut Vec<Violation>,
) {
    let mismatch = || Violation::type_mismatch(field_path, constraint.type_tag(), TypeTag::of(value));

    match constraint {
        FieldConstraint::String => {
            if !value.is_string() {
                violations.push(mismatch());
            }
        }
        FieldConstraint::Boolean => {
            if !value.is_boolean() {
                violations.push(mismatch());
            }
        }
        FieldConstraint::Integer { min, max } => {
            let Some((n, wide)) = number_of(value).and_then(|n| whole(n).map(|w| (n, w))) else {
                violations.push(mismatch());
                return;
            };
            let below = min.map_or(false, |lo| wide < i128::from(lo));
            let above = max.map_or(false, |hi| wide > i128::from(hi));
            if below || above {
                violations.push(Violation::out_of_range(
                    field_path,
                    n.clone(),
                    min.map(Number::from),
                    max.map(Number::from),
                ));
            }
        }
        FieldConstraint::Number {
            min,
            max,
            exclusive_min,
            exclusive_max,
        } => {
            // Integers are acceptable numbers
            let Some((n, x)) = number_of(value).and_then(|n| n.as_f64().map(|x| (n, x))) else {
                violations.push(mismatch());
                return;
            };
            let below = min.map_or(false, |lo| if *exclusive_min { x <= lo } else { x < lo });
            let above = max.map_or(false, |hi| if *exclusive_max { x >= hi } else { x > hi });
            if below || above {
                violations.push(
                    Violation::out_of_range(
                        field_path,
                        n.clone(),
                        min.and_then(Number::from_f64),
                        max.and_then(Number::from_f64),
                    )
                    .exclusive(*exclusive_min, *exclusive_max),
                );
            }
        }
        FieldConstraint::Object { nested } => match value.as_object() {
            Some(obj) => validate_object(obj, nested, field_path, violations),
            None => violations.push(mismatch()),
        },
    }
}

fn number_of(value: &Value) -> Option<&Number> {
    match value {
        Value::Number(n) => Some(n),
        _ => None,
    }
}

/// Integral value of `n`, accepting floats with no fractional part.
///
/// Whole floats beyond the `i128` range saturate, which still compares
/// correctly against `i64` bounds.
fn whole(n: &Number) -> Option<i128> {
    if let Some(i) = n.as_i64() {
        return Some(i128::from(i));
    }
    if let Some(u) = n.as_u64() {
        return Some(i128::from(u));
    }
    n.as_f64()
        .filter(|x| x.is_finite() && x.fract() == 0.0)
        .map(|x| x as i128)
}

/// Creates a field path from prefix and field name.
fn make_path(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{}.{}", prefix, field)
    }
}
