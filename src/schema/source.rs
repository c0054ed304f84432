//! Schema source loading
//!
//! A schema source is either a file on disk or text handed over directly
//! by the embedding service. Loading reads the text and extracts the
//! declared `package` identifier; nothing is parsed beyond that here.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use super::errors::{SchemaError, SchemaResult};

/// File extension of schema definition files
pub const SCHEMA_EXTENSION: &str = "cue";

/// Locator of one raw schema definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaSource {
    /// Definition stored in a file
    File(PathBuf),
    /// Definition supplied in memory under a readable name
    Embedded { name: String, text: String },
}

impl SchemaSource {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        SchemaSource::File(path.into())
    }

    pub fn embedded(name: impl Into<String>, text: impl Into<String>) -> Self {
        SchemaSource::Embedded {
            name: name.into(),
            text: text.into(),
        }
    }

    /// Readable name used in diagnostics
    pub fn origin(&self) -> String {
        match self {
            SchemaSource::File(path) => path.display().to_string(),
            SchemaSource::Embedded { name, .. } => name.clone(),
        }
    }

    /// Reads the source text and extracts its declared identifier.
    ///
    /// # Errors
    ///
    /// - `SourceUnreadable` if the file cannot be read as UTF-8 text
    /// - `IdentifierMissing` if no `package` clause is present
    pub fn read(&self) -> SchemaResult<RawSchema> {
        let origin = self.origin();
        let text = match self {
            SchemaSource::File(path) => {
                fs::read_to_string(path).map_err(|e| SchemaError::SourceUnreadable {
                    origin: origin.clone(),
                    reason: e.to_string(),
                })?
            }
            SchemaSource::Embedded { text, .. } => text.clone(),
        };

        let identifier = package_identifier(&text)
            .ok_or_else(|| SchemaError::IdentifierMissing {
                origin: origin.clone(),
            })?
            .to_string();

        tracing::debug!(origin = %origin, identifier = %identifier, "found package identifier");

        Ok(RawSchema {
            identifier,
            origin,
            text,
        })
    }
}

impl fmt::Display for SchemaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.origin())
    }
}

/// Raw schema definition text together with its declared identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSchema {
    pub identifier: String,
    pub origin: String,
    pub text: String,
}

fn package_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?m)^\s*package\s+([A-Za-z_][A-Za-z0-9_]*)")
            .expect("package pattern is a valid regex")
    })
}

/// Extracts the identifier of the first `package` clause
pub fn package_identifier(text: &str) -> Option<&str> {
    package_pattern()
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Lists every schema definition file in `dir`, sorted by file name.
///
/// # Errors
///
/// Returns `SourceUnreadable` if the directory cannot be listed.
pub fn sources_in_dir(dir: &Path) -> SchemaResult<Vec<SchemaSource>> {
    let unreadable = |e: std::io::Error| SchemaError::SourceUnreadable {
        origin: dir.display().to_string(),
        reason: e.to_string(),
    };

    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(unreadable)? {
        let path = entry.map_err(unreadable)?.path();

        // Skip anything that is not a schema file
        if !path.is_file() || path.extension().map_or(true, |ext| ext != SCHEMA_EXTENSION) {
            continue;
        }
        paths.push(path);
    }
    paths.sort();

    Ok(paths.into_iter().map(SchemaSource::File).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_package_identifier() {
        assert_eq!(
            package_identifier("package personResponse\n\n#personResponse: {}"),
            Some("personResponse")
        );
        assert_eq!(package_identifier("// header\n  package  animal\n"), Some("animal"));
        assert_eq!(package_identifier("#person: { name: string }"), None);
    }

    #[test]
    fn test_package_inside_field_is_ignored() {
        assert_eq!(package_identifier("#x: { name: string } // package foo"), None);
    }

    #[test]
    fn test_read_embedded() {
        let source = SchemaSource::embedded("inline", "package person\n#person: {}\n");
        let raw = source.read().unwrap();
        assert_eq!(raw.identifier, "person");
        assert_eq!(raw.origin, "inline");
    }

    #[test]
    fn test_identifier_missing() {
        let source = SchemaSource::embedded("inline", "#person: {}");
        let err = source.read().unwrap_err();
        assert_eq!(err.code(), "SCHEMA_IDENTIFIER_MISSING");
        assert_eq!(err.origin(), Some("inline"));
    }

    #[test]
    fn test_missing_file_is_unreadable() {
        let temp_dir = TempDir::new().unwrap();
        let source = SchemaSource::file(temp_dir.path().join("nonExistingSchema.cue"));
        let err = source.read().unwrap_err();
        assert_eq!(err.code(), "SCHEMA_SOURCE_UNREADABLE");
    }

    #[test]
    fn test_sources_in_dir_sorted_and_filtered() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("b.cue"), "package b").unwrap();
        fs::write(temp_dir.path().join("a.cue"), "package a").unwrap();
        fs::write(temp_dir.path().join("notes.txt"), "package c").unwrap();

        let sources = sources_in_dir(temp_dir.path()).unwrap();
        let names: Vec<String> = sources
            .iter()
            .map(|s| match s {
                SchemaSource::File(p) => p.file_name().unwrap().to_string_lossy().into_owned(),
                SchemaSource::Embedded { name, .. } => name.clone(),
            })
            .collect();
        assert_eq!(names, vec!["a.cue", "b.cue"]);
    }

    #[test]
    fn test_sources_in_missing_dir() {
        let temp_dir = TempDir::new().unwrap();
        let result = sources_in_dir(&temp_dir.path().join("absent"));
        assert_eq!(result.unwrap_err().code(), "SCHEMA_SOURCE_UNREADABLE");
    }
}
