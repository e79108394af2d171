//! `vetquote.toml`.
//!
//! ```toml
//! [storage]
//! backend = "sqlite"              # memory | json | sqlite
//! connection_string = "vet.db"    # data directory for json, file for sqlite
//!
//! [metrics]
//! top_services = 4
//!
//! [log]
//! level = "info"
//! file = "vetquote.log"           # optional
//! ```
//!
//! Every key is optional. Command-line flags win over the file.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use vet_core::db::DbConfig;

pub const DEFAULT_CONFIG_FILE: &str = "vetquote.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: String,
    pub connection_string: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: "json".to_string(),
            connection_string: "./data".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// How many services the daily report lists.
    pub top_services: usize,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { top_services: 4 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Bare level or full `EnvFilter` directive. `RUST_LOG` overrides it.
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub metrics: MetricsConfig,
    pub log: LogConfig,
}

impl AppConfig {
    /// Read `path`. A file that does not exist yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply `--backend` / `--db` from the command line.
    pub fn with_storage_overrides(
        mut self,
        backend: Option<String>,
        connection_string: Option<String>,
    ) -> Self {
        if let Some(backend) = backend {
            self.storage.backend = backend;
        }
        if let Some(connection_string) = connection_string {
            self.storage.connection_string = connection_string;
        }
        self
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig {
            backend: self.storage.backend.clone(),
            connection_string: self.storage.connection_string.clone(),
        }
    }
}
