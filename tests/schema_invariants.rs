//! Schema Invariant Tests
//!
//! - Closed world: all declared fields required, no undeclared fields
//! - Violations are collected exhaustively
//! - Type matching is exact, no coercion
//! - Bounds are inclusive
//! - Validation is deterministic and free of hidden state
//! - Registry construction fails atomically

use std::path::PathBuf;

use schemagate::schema::{
    FieldConstraint, SchemaError, SchemaRegistry, SchemaSource, StructuralSchema,
    StructuralValidator, TypeTag, Validation, ValidationOutcome, Violation, ViolationKind,
};
use serde_json::Number;

// =============================================================================
// Helper Functions
// =============================================================================

fn schema_file(name: &str) -> SchemaSource {
    SchemaSource::file(
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("schemas")
            .join(format!("{}.cue", name)),
    )
}

fn person_registry() -> SchemaRegistry {
    SchemaRegistry::build(&[SchemaSource::embedded(
        "person.cue",
        "package person\n#person: {\n  name: string\n  age: int & >=0 & <=130\n}\n",
    )])
    .unwrap()
}

fn check(registry: &SchemaRegistry, schema: &str, payload: &str) -> ValidationOutcome {
    StructuralValidator::new(registry)
        .validate(schema, payload.as_bytes())
        .unwrap()
}

fn assert_closed(schema: &StructuralSchema) {
    assert!(!schema.additional_properties_allowed, "{} is open", schema.name);
    let names: Vec<&str> = schema.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(schema.required_fields(), names);
    for field in &schema.fields {
        if let FieldConstraint::Object { nested } = &field.constraint {
            assert_closed(nested);
        }
    }
}

// =============================================================================
// Closed-World Tests
// =============================================================================

/// Every compiled schema forbids extra keys and requires every field,
/// even when the source marks fields optional or structs open.
#[test]
fn test_closed_world_invariant() {
    let registry = SchemaRegistry::build(&[
        schema_file("personResponse"),
        schema_file("animalResponse"),
        SchemaSource::embedded(
            "loose.cue",
            "package loose\n#loose: {\n  a?: string\n  b: { c?: int\n ... }\n  ...\n}\n",
        ),
    ])
    .unwrap();

    assert_eq!(registry.len(), 3);
    for schema in registry.schemas() {
        assert_closed(schema);
    }
}

// =============================================================================
// Scenario Tests
// =============================================================================

#[test]
fn test_valid_person() {
    let registry = person_registry();
    for payload in [
        r#"{"name":"Ron","age":56}"#,
        r#"{"name":"Harry","age":4}"#,
        r#"{"name":"Hermine","age":34}"#,
        r#"{"name":"Dobby","age":97}"#,
        r#"{"name":"Luna","age":22}"#,
    ] {
        assert_eq!(check(&registry, "person", payload), ValidationOutcome::Valid);
    }
}

#[test]
fn test_missing_name() {
    let registry = person_registry();
    assert_eq!(
        check(&registry, "person", r#"{"age":56}"#).violations(),
        &[Violation::missing_field("name")]
    );
}

#[test]
fn test_age_out_of_range() {
    let registry = person_registry();
    assert_eq!(
        check(&registry, "person", r#"{"name":"Peter","age":200}"#).violations(),
        &[Violation::out_of_range(
            "age",
            Number::from(200),
            Some(Number::from(0)),
            Some(Number::from(130)),
        )]
    );
}

#[test]
fn test_age_as_string() {
    let registry = person_registry();
    assert_eq!(
        check(&registry, "person", r#"{"name":"Tom","age":"200"}"#).violations(),
        &[Violation::type_mismatch("age", TypeTag::Integer, TypeTag::String)]
    );
}

#[test]
fn test_extra_property() {
    let registry = person_registry();
    assert_eq!(
        check(&registry, "person", r#"{"name":"X","age":1,"extra":"y"}"#).violations(),
        &[Violation::extra_field("extra")]
    );
}

#[test]
fn test_build_without_sources() {
    assert_eq!(SchemaRegistry::build(&[]).unwrap_err(), SchemaError::EmptyRegistry);
}

// =============================================================================
// Exhaustive Collection Tests
// =============================================================================

/// N missing fields and M extra keys yield exactly N + M violations.
#[test]
fn test_missing_and_extra_are_all_reported() {
    let registry = person_registry();
    let outcome = check(&registry, "person", r#"{"message":"Hello","type":"chat","extra":"extra"}"#);

    let violations = outcome.violations();
    assert_eq!(violations.len(), 2 + 3);
    let missing = violations
        .iter()
        .filter(|v| v.kind == ViolationKind::MissingRequiredField)
        .count();
    let extra = violations
        .iter()
        .filter(|v| v.kind == ViolationKind::DisallowedAdditionalProperty)
        .count();
    assert_eq!((missing, extra), (2, 3));

    // Declared-field violations come first
    assert_eq!(violations[0].path, "name");
    assert_eq!(violations[1].path, "age");
}

/// Both wrong types are reported, not just the first.
#[test]
fn test_every_type_mismatch_reported() {
    let registry = person_registry();
    let outcome = check(&registry, "person", r#"{"name":123,"age":"200"}"#);
    assert_eq!(
        outcome.violations(),
        &[
            Violation::type_mismatch("name", TypeTag::String, TypeTag::Integer),
            Violation::type_mismatch("age", TypeTag::Integer, TypeTag::String),
        ]
    );
}

#[test]
fn test_empty_object_reports_each_field() {
    let registry = person_registry();
    assert_eq!(check(&registry, "person", "{}").violations().len(), 2);
}

// =============================================================================
// Bound Tests
// =============================================================================

#[test]
fn test_bounds_are_inclusive() {
    let registry = SchemaRegistry::build(&[SchemaSource::embedded(
        "bounded.cue",
        "package bounded\n#bounded: { age: int & >=0 & <=120 }",
    )])
    .unwrap();

    assert!(check(&registry, "bounded", r#"{"age":0}"#).is_valid());
    assert!(check(&registry, "bounded", r#"{"age":120}"#).is_valid());

    let outcome = check(&registry, "bounded", r#"{"age":121}"#);
    assert_eq!(outcome.violations()[0].kind.as_str(), "out_of_range");
    let outcome = check(&registry, "bounded", r#"{"age":-1}"#);
    assert_eq!(outcome.violations()[0].kind.as_str(), "out_of_range");
}

// =============================================================================
// Nested Object Tests
// =============================================================================

#[test]
fn test_nested_paths_via_reference() {
    let registry = SchemaRegistry::build(&[schema_file("animalResponse")]).unwrap();

    let valid = r#"{"name":"Rex","age":3,"species":"dog",
        "habitat":{"region":"Europe","domestic":true,"coverage":0.4}}"#;
    assert!(check(&registry, "animalResponse", valid).is_valid());

    let invalid = r#"{"name":"Rex","age":3,"species":"dog",
        "habitat":{"region":"Europe","coverage":1.5,"climate":"mild"}}"#;
    let outcome = check(&registry, "animalResponse", invalid);
    let paths: Vec<&str> = outcome.violations().iter().map(|v| v.path.as_str()).collect();
    assert_eq!(
        paths,
        vec!["habitat.domestic", "habitat.coverage", "habitat.climate"]
    );
}

// =============================================================================
// Determinism Tests
// =============================================================================

/// Same payload validates the same way every time.
#[test]
fn test_validation_is_idempotent() {
    let registry = person_registry();
    let validator = StructuralValidator::new(&registry);
    let payload = br#"{"name":5,"extra":true}"#;

    let first = validator.validate("person", payload).unwrap();
    for _ in 0..100 {
        assert_eq!(validator.validate("person", payload).unwrap(), first);
    }
}

/// Concurrent calls share one registry without locking.
#[test]
fn test_concurrent_validation() {
    let registry = person_registry();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = &registry;
                scope.spawn(move || {
                    let payload = format!(r#"{{"name":"n{}","age":{}}}"#, i, i * 20);
                    registry.validate("person", payload.as_bytes()).unwrap()
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            let outcome = handle.join().unwrap();
            assert_eq!(outcome.is_valid(), i * 20 <= 130);
        }
    });
}

// =============================================================================
// Call Error Tests
// =============================================================================

#[test]
fn test_unknown_schema_is_error_not_violation() {
    let registry = person_registry();
    let err = registry.validate("plant", b"{}").unwrap_err();
    assert_eq!(err, SchemaError::SchemaNotFound("plant".into()));
    assert!(!err.is_fatal());
}

#[test]
fn test_broken_json_is_error_not_violation() {
    let registry = person_registry();
    let err = registry.validate("person", b"{\"name\": \"Ron\",").unwrap_err();
    assert_eq!(err.code(), "SCHEMA_MALFORMED_PAYLOAD");
}

/// A bad call does not affect the next one.
#[test]
fn test_calls_are_independent() {
    let registry = person_registry();
    assert!(registry.validate("person", b"not json").is_err());
    assert!(registry
        .validate("person", br#"{"name":"Ron","age":56}"#)
        .unwrap()
        .is_valid());
}

#[test]
fn test_non_object_payload_is_violation() {
    let registry = person_registry();
    let outcome = check(&registry, "person", r#""just text""#);
    assert_eq!(
        outcome.violations(),
        &[Violation::type_mismatch("$root", TypeTag::Object, TypeTag::String)]
    );
}
