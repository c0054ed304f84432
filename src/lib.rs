//! schemagate - closed-world structural validation of JSON payloads
//!
//! Schema definitions are compiled once into an immutable
//! [`SchemaRegistry`](schema::SchemaRegistry); payloads are then checked
//! against a named schema and every violation is reported.

pub mod cli;
pub mod observability;
pub mod schema;
