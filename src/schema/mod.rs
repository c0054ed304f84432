//! Schema subsystem for schemagate
//!
//! Schemas are compiled once into an immutable registry, then every
//! payload is checked against a named schema.
//!
//! # Design Principles
//!
//! - Closed world: every declared field is required, undeclared fields are rejected
//! - No nulls, defaults, or coercion
//! - Registry construction is all-or-nothing
//! - Violations are data, collected exhaustively
//! - Deterministic validation

mod compiler;
mod errors;
mod outcome;
mod registry;
mod source;
mod syntax;
mod types;
mod validator;

pub use compiler::{compile, enforce_closed_world};
pub use errors::{SchemaError, SchemaResult, Severity};
pub use outcome::{ValidationOutcome, Violation, ViolationKind, ROOT_PATH};
pub use registry::SchemaRegistry;
pub use source::{package_identifier, sources_in_dir, RawSchema, SchemaSource, SCHEMA_EXTENSION};
pub use types::{FieldConstraint, FieldDef, StructuralSchema, TypeTag};
pub use validator::{StructuralValidator, Validation};
