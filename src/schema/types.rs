//! Compiled schema representation
//!
//! Supported constraints:
//! - string: UTF-8 string
//! - integer: whole number with optional inclusive bounds
//! - number: any JSON number with optional bounds, each inclusive or exclusive
//! - boolean
//! - object: nested closed-world schema
//!
//! Every compiled object is closed: undeclared keys are rejected and every
//! declared field is required.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

/// Runtime type tags used in type mismatch reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeTag {
    String,
    Integer,
    Number,
    Boolean,
    Object,
    Array,
    Null,
}

impl TypeTag {
    /// Returns the type name for error messages
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeTag::String => "string",
            TypeTag::Integer => "integer",
            TypeTag::Number => "number",
            TypeTag::Boolean => "boolean",
            TypeTag::Object => "object",
            TypeTag::Array => "array",
            TypeTag::Null => "null",
        }
    }

    /// Classifies a JSON value. Numbers without a fractional
    /// representation are `integer`, all others `number`.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => TypeTag::Null,
            Value::Bool(_) => TypeTag::Boolean,
            Value::Number(n) => {
                if n.is_i64() || n.is_u64() {
                    TypeTag::Integer
                } else {
                    TypeTag::Number
                }
            }
            Value::String(_) => TypeTag::String,
            Value::Array(_) => TypeTag::Array,
            Value::Object(_) => TypeTag::Object,
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub(crate) fn is_false(flag: &bool) -> bool {
    !*flag
}

/// One field's expected type and, for numerics, its bounds.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldConstraint {
    String,
    Integer {
        #[serde(skip_serializing_if = "Option::is_none")]
        min: Option<i64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        max: Option<i64>,
    },
    Number {
        #[serde(skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
        #[serde(skip_serializing_if = "is_false")]
        exclusive_min: bool,
        #[serde(skip_serializing_if = "is_false")]
        exclusive_max: bool,
    },
    Boolean,
    Object {
        nested: StructuralSchema,
    },
}

impl FieldConstraint {
    /// Returns the type tag a payload value must carry to satisfy this constraint
    pub fn type_tag(&self) -> TypeTag {
        match self {
            FieldConstraint::String => TypeTag::String,
            FieldConstraint::Integer { .. } => TypeTag::Integer,
            FieldConstraint::Number { .. } => TypeTag::Number,
            FieldConstraint::Boolean => TypeTag::Boolean,
            FieldConstraint::Object { .. } => TypeTag::Object,
        }
    }
}

/// A named field of a structural schema
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(flatten)]
    pub constraint: FieldConstraint,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, constraint: FieldConstraint) -> Self {
        Self {
            name: name.into(),
            constraint,
        }
    }

    /// Create a string field
    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldConstraint::String)
    }

    /// Create an integer field with inclusive bounds
    pub fn integer(name: impl Into<String>, min: Option<i64>, max: Option<i64>) -> Self {
        Self::new(name, FieldConstraint::Integer { min, max })
    }

    /// Create a number field with inclusive bounds
    pub fn number(name: impl Into<String>, min: Option<f64>, max: Option<f64>) -> Self {
        Self::new(
            name,
            FieldConstraint::Number {
                min,
                max,
                exclusive_min: false,
                exclusive_max: false,
            },
        )
    }

    /// Create a boolean field
    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldConstraint::Boolean)
    }

    /// Create a nested object field
    pub fn object(name: impl Into<String>, nested: StructuralSchema) -> Self {
        Self::new(name, FieldConstraint::Object { nested })
    }
}

/// Compiled, closed-world description of an object's permitted shape.
///
/// Field order follows declaration order and only affects the order of
/// reported violations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructuralSchema {
    pub name: String,
    pub fields: Vec<FieldDef>,
    pub additional_properties_allowed: bool,
}

impl StructuralSchema {
    /// Create a closed schema from field definitions
    pub fn new(name: impl Into<String>, fields: Vec<FieldDef>) -> Self {
        Self {
            name: name.into(),
            fields,
            additional_properties_allowed: false,
        }
    }

    /// Looks up a declared field by name
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns whether `name` is a declared field
    pub fn declares(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// All declared field names; every declared field is required.
    pub fn required_fields(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Returns the number of declared fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
