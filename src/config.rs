//! Configuration file support
//!
//! Handles parsing of `.data-testing.toml` configuration files and
//! environment variable overrides.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::database::{DatabaseError, DatabaseResult};
use crate::models::{PipelineReference, TransUnitTest};

/// Default configuration filename
pub const CONFIG_FILENAME: &str = ".data-testing.toml";

/// Default directory holding data sets, groups, unit tests and results
pub const DEFAULT_STORAGE_PATH: &str = "data-testing";

/// Name of the connection [`ENV_DUCKDB_PATH`] applies to
pub const DEFAULT_CONNECTION: &str = "default";

/// Environment variable for the storage directory
pub const ENV_STORAGE_PATH: &str = "DATA_TESTING_STORAGE_PATH";

/// Environment variable for the DuckDB file of the default connection
pub const ENV_DUCKDB_PATH: &str = "DATA_TESTING_DUCKDB_PATH";

/// Connection backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionBackend {
    /// DuckDB database file (default)
    #[default]
    DuckDB,
    /// Private in-memory DuckDB database
    Memory,
}

impl std::str::FromStr for ConnectionBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "duckdb" => Ok(ConnectionBackend::DuckDB),
            "memory" | "in-memory" => Ok(ConnectionBackend::Memory),
            _ => Err(format!(
                "Unknown connection backend: {}. Use 'duckdb' or 'memory'.",
                s
            )),
        }
    }
}

impl std::fmt::Display for ConnectionBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionBackend::DuckDB => write!(f, "duckdb"),
            ConnectionBackend::Memory => write!(f, "memory"),
        }
    }
}

/// Storage configuration section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSection {
    /// Directory of stored elements (relative to workspace, or absolute)
    #[serde(default = "default_storage_path")]
    pub path: String,
}

fn default_storage_path() -> String {
    DEFAULT_STORAGE_PATH.to_string()
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
        }
    }
}

/// One named database connection referenced by data set groups
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ConnectionSection {
    #[serde(default)]
    pub backend: ConnectionBackend,

    /// Database file; ignored for in-memory connections
    #[serde(default)]
    pub path: String,
}

/// Execution configuration section
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExecutionSection {
    /// Value of `persist_results` for unit tests created through
    /// [`TestingConfig::new_unit_test`]
    #[serde(default)]
    pub persist_results_default: bool,
}

/// Main configuration structure
///
/// Represents the `.data-testing.toml` configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TestingConfig {
    #[serde(default)]
    pub storage: StorageSection,

    /// Connections by name
    #[serde(default)]
    pub connections: BTreeMap<String, ConnectionSection>,

    #[serde(default)]
    pub execution: ExecutionSection,
}

impl TestingConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a DuckDB file connection
    pub fn with_duckdb(mut self, name: impl Into<String>, path: impl Into<String>) -> Self {
        self.connections.insert(
            name.into(),
            ConnectionSection {
                backend: ConnectionBackend::DuckDB,
                path: path.into(),
            },
        );
        self
    }

    /// Add an in-memory connection
    pub fn with_memory(mut self, name: impl Into<String>) -> Self {
        self.connections.insert(
            name.into(),
            ConnectionSection {
                backend: ConnectionBackend::Memory,
                path: String::new(),
            },
        );
        self
    }

    /// Load configuration from a workspace directory
    ///
    /// Looks for `.data-testing.toml` in the workspace directory.
    /// Falls back to defaults if not found.
    pub fn load(workspace_path: &Path) -> DatabaseResult<Self> {
        let config_path = workspace_path.join(CONFIG_FILENAME);

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .map_err(|e| DatabaseError::IoError(format!("Failed to read config: {}", e)))?;

            Self::parse(&content)?
        } else {
            Self::default()
        };

        config.apply_env_overrides();

        Ok(config)
    }

    /// Parse configuration from TOML string
    pub fn parse(content: &str) -> DatabaseResult<Self> {
        toml::from_str(content)
            .map_err(|e| DatabaseError::ConfigError(format!("Failed to parse config: {}", e)))
    }

    /// Save configuration to a workspace directory
    pub fn save(&self, workspace_path: &Path) -> DatabaseResult<()> {
        let config_path = workspace_path.join(CONFIG_FILENAME);
        let content = self.to_toml()?;

        std::fs::write(&config_path, content)
            .map_err(|e| DatabaseError::IoError(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// Convert configuration to TOML string
    pub fn to_toml(&self) -> DatabaseResult<String> {
        toml::to_string_pretty(self).map_err(|e| {
            DatabaseError::SerializationError(format!("Failed to serialize config: {}", e))
        })
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var(ENV_STORAGE_PATH) {
            self.storage.path = path;
        }

        // Replaces (or creates) the default connection as a DuckDB file
        if let Ok(path) = std::env::var(ENV_DUCKDB_PATH) {
            self.connections.insert(
                DEFAULT_CONNECTION.to_string(),
                ConnectionSection {
                    backend: ConnectionBackend::DuckDB,
                    path,
                },
            );
        }
    }

    /// Storage directory for a workspace
    pub fn storage_path(&self, workspace_path: &Path) -> PathBuf {
        resolve_path(workspace_path, &self.storage.path, DEFAULT_STORAGE_PATH)
    }

    /// Connection settings by name
    pub fn connection(&self, name: &str) -> DatabaseResult<&ConnectionSection> {
        self.connections
            .get(name)
            .ok_or_else(|| DatabaseError::UnknownConnection(name.to_string()))
    }

    /// Database file of a connection, resolved against the workspace
    ///
    /// `None` for in-memory connections.
    pub fn connection_path(
        &self,
        name: &str,
        workspace_path: &Path,
    ) -> DatabaseResult<Option<PathBuf>> {
        let connection = self.connection(name)?;
        match connection.backend {
            ConnectionBackend::Memory => Ok(None),
            ConnectionBackend::DuckDB => {
                if connection.path.is_empty() {
                    return Err(DatabaseError::ConfigError(format!(
                        "Connection '{}' has no database path",
                        name
                    )));
                }
                Ok(Some(resolve_path(workspace_path, &connection.path, "")))
            }
        }
    }

    /// New unit test carrying this workspace's execution defaults
    pub fn new_unit_test(
        &self,
        name: impl Into<String>,
        pipeline: PipelineReference,
    ) -> TransUnitTest {
        let mut unit_test = TransUnitTest::new(name, pipeline);
        unit_test.persist_results = self.execution.persist_results_default;
        unit_test
    }

    /// Check if configuration exists in a workspace
    pub fn exists(workspace_path: &Path) -> bool {
        workspace_path.join(CONFIG_FILENAME).exists()
    }
}

fn resolve_path(workspace_path: &Path, path: &str, default: &str) -> PathBuf {
    if path.is_empty() {
        workspace_path.join(default)
    } else if Path::new(path).is_absolute() {
        PathBuf::from(path)
    } else {
        workspace_path.join(path)
    }
}

/// Generate a sample configuration file content
pub fn sample_config() -> &'static str {
    r#"# Data Testing SDK Configuration

[storage]
# Directory holding data sets, groups, unit tests and results
# (relative to workspace, or absolute)
path = "data-testing"

# Connections referenced by data set groups
[connections.default]
# Backend: "duckdb" (default) or "memory"
backend = "duckdb"
path = "golden.duckdb"

[execution]
# Persist run records of newly created unit tests
persist_results_default = false
"#
}
