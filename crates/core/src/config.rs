//! Configuration via `annota.toml`
//!
//! Every section is optional; missing keys fall back to defaults, so an empty
//! file is a valid configuration.

use crate::error::{Error, Result};
use crate::limits::DocumentLimits;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Conventional config file name.
pub const CONFIG_FILE_NAME: &str = "annota.toml";

/// Diff engine settings (`[diff]`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffConfig {
    /// Mark the ancestors of every changed location as changed too.
    pub mark_ancestors: bool,
}

impl Default for DiffConfig {
    fn default() -> Self {
        DiffConfig {
            mark_ancestors: true,
        }
    }
}

/// Logging settings (`[logging]`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing-subscriber` env-filter directive, e.g. `"info"` or
    /// `"annota_context=debug"`. `RUST_LOG` takes precedence when set.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            filter: "info".to_string(),
        }
    }
}

/// Configuration loaded from `annota.toml`.
///
/// # Example
///
/// ```toml
/// [document]
/// max_nesting_depth = 100
///
/// [diff]
/// mark_ancestors = true
///
/// [logging]
/// filter = "info"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotaConfig {
    /// Limits applied by the in-memory document engine.
    #[serde(default)]
    pub document: DocumentLimits,
    /// Diff engine behavior.
    #[serde(default)]
    pub diff: DiffConfig,
    /// Log filtering.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AnnotaConfig {
    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# annota configuration

# Limits enforced on every committed document revision.
[document]
max_document_size = 16777216
max_nesting_depth = 100
max_path_length = 256

# Diff engine: when true, every ancestor of a changed location is annotated
# as changed with its value before the edit.
[diff]
mark_ancestors = true

# Log filter directive (RUST_LOG overrides it).
[logging]
filter = "info"
"#
    }

    /// Parse config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the text is not valid configuration.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse configuration: {}", e)))
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        toml::from_str(&content).map_err(|e| {
            Error::Config(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })
    }

    /// Write the default config file if it does not already exist.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml())?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
