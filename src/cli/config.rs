//! Configuration for the schemagate binary
//!
//! Precedence: environment > configuration file > defaults.
//!
//! ```json
//! {
//!   "schema_dir": "schemas",
//!   "schemas": ["personResponse.cue", "animalResponse.cue"],
//!   "log_level": "info"
//! }
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::schema::{sources_in_dir, SchemaSource};

use super::errors::{CliError, CliResult};

/// Configuration file read when `--config` is not given
pub const DEFAULT_CONFIG_PATH: &str = "./schemagate.json";

/// Overrides `schema_dir`
pub const ENV_SCHEMA_DIR: &str = "SCHEMAGATE_SCHEMA_DIR";
/// Overrides `schemas`, comma separated
pub const ENV_SCHEMAS: &str = "SCHEMAGATE_SCHEMAS";
/// Overrides `log_level`
pub const ENV_LOG: &str = "SCHEMAGATE_LOG";

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Directory holding schema files (optional, default "schemas")
    #[serde(default = "default_schema_dir")]
    pub schema_dir: PathBuf,

    /// Schema files to load, relative to `schema_dir`.
    /// Empty means every schema file in `schema_dir`.
    #[serde(default)]
    pub schemas: Vec<PathBuf>,

    /// Log filter directive (optional, default "info")
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_schema_dir() -> PathBuf {
    PathBuf::from("schemas")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_dir: default_schema_dir(),
            schemas: Vec::new(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Resolve configuration.
    ///
    /// An explicitly given file must exist; the default file is optional.
    pub fn load<F>(path: Option<&Path>, getenv: F) -> CliResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match path {
            Some(path) => Self::from_file(path)?
                .ok_or_else(|| CliError::config_error(format!("Config file '{}' not found", path.display())))?,
            None => Self::from_file(Path::new(DEFAULT_CONFIG_PATH))?.unwrap_or_default(),
        };

        config.apply_env(getenv);
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from file, `None` if the file does not exist
    fn from_file(path: &Path) -> CliResult<Option<Self>> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(CliError::config_error(format!("Failed to read config: {}", e)));
            }
        };

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        Ok(Some(config))
    }

    fn apply_env<F>(&mut self, getenv: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| getenv(key).filter(|v| !v.trim().is_empty());

        if let Some(dir) = non_empty(ENV_SCHEMA_DIR) {
            self.schema_dir = PathBuf::from(dir);
        }
        if let Some(list) = non_empty(ENV_SCHEMAS) {
            self.schemas = list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
                .collect();
        }
        if let Some(level) = non_empty(ENV_LOG) {
            self.log_level = level;
        }
    }

    fn validate(&self) -> CliResult<()> {
        if self.schema_dir.as_os_str().is_empty() {
            return Err(CliError::config_error("schema_dir must not be empty"));
        }
        if self.log_level.trim().is_empty() {
            return Err(CliError::config_error("log_level must not be empty"));
        }
        Ok(())
    }

    /// The ordered schema source batch this configuration describes
    pub fn sources(&self) -> CliResult<Vec<SchemaSource>> {
        if self.schemas.is_empty() {
            return Ok(sources_in_dir(&self.schema_dir)?);
        }
        Ok(self
            .schemas
            .iter()
            .map(|file| SchemaSource::File(self.schema_dir.join(file)))
            .collect())
    }
}
