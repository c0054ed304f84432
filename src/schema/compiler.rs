//! Schema compiler
//!
//! Turns one raw schema definition into a closed-world [`StructuralSchema`].
//! The schema is the definition named after the source's package
//! identifier; references to other definitions in the same source are
//! expanded inline.
//!
//! Whatever the source says about optional fields (`name?:`) or open
//! structs (`...`), the compiled schema requires every declared field and
//! forbids undeclared ones.

use std::collections::HashMap;

use super::errors::{SchemaError, SchemaResult};
use super::source::RawSchema;
use super::syntax::{self, Comparison, Expr, SchemaFile, StructLit, Term};
use super::types::{FieldConstraint, FieldDef, StructuralSchema};

/// Compiles a raw schema definition.
///
/// # Errors
///
/// - `MalformedDefinition` for syntax errors, unknown types, bad bounds,
///   unknown or cyclic references
/// - `UnknownIdentifier` if no definition matches the package identifier
/// - `DuplicateFieldDeclaration` if an object declares a field twice
pub fn compile(raw: &RawSchema) -> SchemaResult<StructuralSchema> {
    let file = syntax::parse(&raw.origin, &raw.text)?;

    let definition = file
        .definition(&raw.identifier)
        .ok_or_else(|| SchemaError::UnknownIdentifier {
            origin: raw.origin.clone(),
            identifier: raw.identifier.clone(),
        })?;

    let mut compiler = Compiler {
        origin: &raw.origin,
        file: &file,
        expanding: vec![raw.identifier.clone()],
        expanded: HashMap::new(),
        fields: 0,
    };

    let mut schema = match compiler.constraint(&definition.value, &raw.identifier)? {
        FieldConstraint::Object { nested } => nested,
        other => {
            return Err(SchemaError::malformed(
                &raw.origin,
                definition.line,
                format!(
                    "definition '#{}' must be a struct, found {}",
                    raw.identifier,
                    other.type_tag()
                ),
            ));
        }
    };
    schema.name = raw.identifier.clone();

    enforce_closed_world(&mut schema);

    tracing::debug!(
        schema = %schema.name,
        origin = %raw.origin,
        fields = schema.len(),
        "compiled schema"
    );

    Ok(schema)
}

/// Forbids additional properties on the schema and every nested object.
///
/// Required-ness needs no rewrite: every declared field is required.
pub fn enforce_closed_world(schema: &mut StructuralSchema) {
    schema.additional_properties_allowed = false;
    for field in &mut schema.fields {
        if let FieldConstraint::Object { nested } = &mut field.constraint {
            enforce_closed_world(nested);
        }
    }
}

/// Upper limit on the fields one schema may expand to, nested ones included.
const MAX_EXPANDED_FIELDS: usize = 10_000;

/// Re-roots the nested schema names of an expanded definition at `path`.
fn rebase(constraint: &mut FieldConstraint, path: &str) {
    if let FieldConstraint::Object { nested } = constraint {
        nested.name = path.to_string();
        for field in &mut nested.fields {
            let field_path = format!("{}.{}", path, field.name);
            rebase(&mut field.constraint, &field_path);
        }
    }
}

struct Compiler<'a> {
    origin: &'a str,
    file: &'a SchemaFile,
    /// Definitions currently being expanded, for cycle detection
    expanding: Vec<String>,
    /// Finished expansions and the number of fields each contributes
    expanded: HashMap<String, (FieldConstraint, usize)>,
    /// Fields produced so far
    fields: usize,
}

impl<'a> Compiler<'a> {
    fn malformed(&self, line: usize, reason: impl Into<String>) -> SchemaError {
        SchemaError::malformed(self.origin, line, reason)
    }

    fn add_fields(&mut self, count: usize, line: usize) -> SchemaResult<()> {
        self.fields += count;
        if self.fields > MAX_EXPANDED_FIELDS {
            return Err(self.malformed(
                line,
                format!("schema expands to more than {} fields", MAX_EXPANDED_FIELDS),
            ));
        }
        Ok(())
    }

    /// Interprets one `&` conjunction at field path `path`.
    fn constraint(&mut self, expr: &Expr, path: &str) -> SchemaResult<FieldConstraint> {
        let mut base = None;
        let mut bounds = Vec::new();

        for term in &expr.terms {
            match term {
                Term::Bound(cmp, literal) => bounds.push((*cmp, literal.as_str())),
                other => {
                    if base.is_some() {
                        return Err(self.malformed(
                            expr.line,
                            format!("field '{}' combines more than one type", path),
                        ));
                    }
                    base = Some(other);
                }
            }
        }

        let base = base.ok_or_else(|| {
            self.malformed(expr.line, format!("field '{}' has bounds but no type", path))
        })?;

        if !bounds.is_empty() && !matches!(base, Term::Type(_)) {
            return Err(self.malformed(
                expr.line,
                format!("field '{}': bounds only apply to int and number", path),
            ));
        }

        match base {
            Term::Type(keyword) => self.primitive(keyword, &bounds, expr.line, path),
            Term::Struct(body) => self.object(body, path),
            Term::Reference(name) => self.reference(name, expr.line, path),
            Term::Bound(..) => unreachable!("bounds are collected separately"),
        }
    }

    fn primitive(
        &self,
        keyword: &str,
        bounds: &[(Comparison, &str)],
        line: usize,
        path: &str,
    ) -> SchemaResult<FieldConstraint> {
        let constraint = match keyword {
            "string" => FieldConstraint::String,
            "bool" => FieldConstraint::Boolean,
            "int" => {
                let (min, max) = self.integer_bounds(bounds, line, path)?;
                FieldConstraint::Integer { min, max }
            }
            "number" | "float" => self.number(bounds, line, path)?,
            other => {
                return Err(self.malformed(
                    line,
                    format!("field '{}' has unknown type '{}'", path, other),
                ));
            }
        };

        if !bounds.is_empty() && !matches!(keyword, "int" | "number" | "float") {
            return Err(self.malformed(
                line,
                format!("field '{}': bounds only apply to int and number", path),
            ));
        }

        Ok(constraint)
    }

    fn integer_bounds(
        &self,
        bounds: &[(Comparison, &str)],
        line: usize,
        path: &str,
    ) -> SchemaResult<(Option<i64>, Option<i64>)> {
        let mut min = None;
        let mut max = None;

        for (cmp, literal) in bounds {
            let value: i64 = literal.replace('_', "").parse().map_err(|_| {
                self.malformed(
                    line,
                    format!("field '{}': '{}' is not an integer bound", path, literal),
                )
            })?;

            let overflow = || {
                self.malformed(line, format!("field '{}': bound {} overflows", path, literal))
            };
            let (slot, inclusive) = match cmp {
                Comparison::Ge => (&mut min, value),
                Comparison::Gt => (&mut min, value.checked_add(1).ok_or_else(overflow)?),
                Comparison::Le => (&mut max, value),
                Comparison::Lt => (&mut max, value.checked_sub(1).ok_or_else(overflow)?),
            };
            if slot.replace(inclusive).is_some() {
                return Err(self.malformed(
                    line,
                    format!("field '{}' repeats a {} bound", path, cmp.as_str()),
                ));
            }
        }

        if let (Some(lo), Some(hi)) = (min, max) {
            if lo > hi {
                return Err(self.malformed(
                    line,
                    format!("field '{}': empty range [{}, {}]", path, lo, hi),
                ));
            }
        }

        Ok((min, max))
    }

    fn number(
        &self,
        bounds: &[(Comparison, &str)],
        line: usize,
        path: &str,
    ) -> SchemaResult<FieldConstraint> {
        let mut min: Option<(f64, bool)> = None;
        let mut max: Option<(f64, bool)> = None;

        for (cmp, literal) in bounds {
            let value: f64 = literal
                .replace('_', "")
                .parse()
                .ok()
                .filter(|v: &f64| v.is_finite())
                .ok_or_else(|| {
                    self.malformed(
                        line,
                        format!("field '{}': '{}' is not a numeric bound", path, literal),
                    )
                })?;

            let (slot, exclusive) = match cmp {
                Comparison::Ge => (&mut min, false),
                Comparison::Gt => (&mut min, true),
                Comparison::Le => (&mut max, false),
                Comparison::Lt => (&mut max, true),
            };
            if slot.replace((value, exclusive)).is_some() {
                return Err(self.malformed(
                    line,
                    format!("field '{}' repeats a {} bound", path, cmp.as_str()),
                ));
            }
        }

        if let (Some((lo, lo_open)), Some((hi, hi_open))) = (min, max) {
            if lo > hi || (lo == hi && (lo_open || hi_open)) {
                return Err(self.malformed(
                    line,
                    format!("field '{}': empty range between {} and {}", path, lo, hi),
                ));
            }
        }

        Ok(FieldConstraint::Number {
            min: min.map(|(v, _)| v),
            max: max.map(|(v, _)| v),
            exclusive_min: min.map_or(false, |(_, open)| open),
            exclusive_max: max.map_or(false, |(_, open)| open),
        })
    }

    fn object(&mut self, body: &StructLit, path: &str) -> SchemaResult<FieldConstraint> {
        let mut fields: Vec<FieldDef> = Vec::with_capacity(body.fields.len());

        for decl in &body.fields {
            let field_path = format!("{}.{}", path, decl.label);

            if fields.iter().any(|f| f.name == decl.label) {
                return Err(SchemaError::DuplicateFieldDeclaration {
                    origin: self.origin.to_string(),
                    field: field_path,
                });
            }
            if decl.optional {
                tracing::debug!(
                    field = %field_path,
                    line = decl.line,
                    "optional marker ignored, all fields are required"
                );
            }

            let constraint = self.constraint(&decl.value, &field_path)?;
            self.add_fields(1, decl.line)?;
            fields.push(FieldDef::new(decl.label.clone(), constraint));
        }

        Ok(FieldConstraint::Object {
            nested: StructuralSchema {
                name: path.to_string(),
                fields,
                additional_properties_allowed: body.open,
            },
        })
    }

    fn reference(&mut self, name: &str, line: usize, path: &str) -> SchemaResult<FieldConstraint> {
        let file = self.file;
        let definition = file.definition(name).ok_or_else(|| {
            self.malformed(
                line,
                format!("field '{}' references unknown definition '#{}'", path, name),
            )
        })?;

        if self.expanding.iter().any(|n| n == name) {
            return Err(self.malformed(
                line,
                format!("field '{}': definition '#{}' refers to itself", path, name),
            ));
        }

        if let Some((cached, count)) = self.expanded.get(name) {
            let (mut constraint, count) = (cached.clone(), *count);
            self.add_fields(count, line)?;
            rebase(&mut constraint, path);
            return Ok(constraint);
        }

        let before = self.fields;
        self.expanding.push(name.to_string());
        let constraint = self.constraint(&definition.value, path);
        self.expanding.pop();
        let constraint = constraint?;

        self.expanded
            .insert(name.to_string(), (constraint.clone(), self.fields - before));
        Ok(constraint)
    }
}
