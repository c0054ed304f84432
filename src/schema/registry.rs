//! Schema registry
//!
//! Built once from an ordered batch of schema sources, immutable afterwards.
//! Construction is all-or-nothing: if any source fails to load or compile,
//! no registry is returned.

use std::collections::HashMap;
use std::path::Path;

use serde_json::Value;

use super::compiler;
use super::errors::{SchemaError, SchemaResult};
use super::outcome::ValidationOutcome;
use super::source::{sources_in_dir, SchemaSource};
use super::types::StructuralSchema;
use super::validator::{StructuralValidator, Validation};
use crate::observability::Event;

/// Immutable lookup table from schema name to compiled schema.
///
/// Holds no interior mutability, so a shared reference can be handed to
/// any number of concurrent validation calls.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    schemas: HashMap<String, StructuralSchema>,
}

impl SchemaRegistry {
    /// Loads and compiles every source in order.
    ///
    /// A later source declaring an identifier already seen replaces the
    /// earlier schema.
    ///
    /// # Errors
    ///
    /// - `EmptyRegistry` if `sources` is empty
    /// - the first load or compile error encountered
    pub fn build(sources: &[SchemaSource]) -> SchemaResult<Self> {
        tracing::info!(event = %Event::RegistryBuildStart, sources = sources.len());

        let result = Self::compile_all(sources);
        match &result {
            Ok(registry) => tracing::info!(
                event = %Event::RegistryBuilt,
                schemas = registry.len(),
                names = ?registry.names(),
            ),
            Err(e) => tracing::error!(
                event = %Event::RegistryBuildFailed,
                code = e.code(),
                error = %e,
            ),
        }
        result
    }

    fn compile_all(sources: &[SchemaSource]) -> SchemaResult<Self> {
        if sources.is_empty() {
            return Err(SchemaError::EmptyRegistry);
        }

        let mut schemas = HashMap::with_capacity(sources.len());
        for source in sources {
            let raw = source.read()?;
            let schema = compiler::compile(&raw)?;

            tracing::debug!(
                event = %Event::SchemaCompiled,
                schema = %schema.name,
                origin = %raw.origin,
            );

            if let Some(previous) = schemas.insert(schema.name.clone(), schema) {
                tracing::warn!(
                    event = %Event::SchemaReplaced,
                    schema = %previous.name,
                    origin = %raw.origin,
                    "later source replaces earlier schema"
                );
            }
        }

        Ok(Self { schemas })
    }

    /// Builds a registry from every schema file in `dir`.
    pub fn from_dir(dir: &Path) -> SchemaResult<Self> {
        Self::build(&sources_in_dir(dir)?)
    }

    /// Gets a compiled schema by name.
    ///
    /// A missing name is not an error here; the validator decides.
    pub fn lookup(&self, name: &str) -> Option<&StructuralSchema> {
        self.schemas.get(name)
    }

    /// Checks if a schema exists.
    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    /// Returns the number of compiled schemas.
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Returns all schema names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.schemas.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Returns all compiled schemas, sorted by name.
    pub fn schemas(&self) -> Vec<&StructuralSchema> {
        let mut schemas: Vec<&StructuralSchema> = self.schemas.values().collect();
        schemas.sort_by(|a, b| a.name.cmp(&b.name));
        schemas
    }

    /// Returns a validator reading from this registry.
    pub fn validator(&self) -> StructuralValidator<'_> {
        StructuralValidator::new(self)
    }

    /// Validates an already parsed JSON value.
    pub fn validate_value(&self, schema_name: &str, value: &Value) -> SchemaResult<ValidationOutcome> {
        self.validator().validate_value(schema_name, value)
    }
}

impl Validation for SchemaRegistry {
    fn validate(&self, schema_name: &str, payload: &[u8]) -> SchemaResult<ValidationOutcome> {
        self.validator().validate(schema_name, payload)
    }
}
