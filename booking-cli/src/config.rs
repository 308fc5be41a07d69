use std::{
    fs,
    path::{Path, PathBuf},
};

use booking_core::{FlowConfig, db::DbConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// `[logging]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level or full `EnvFilter` directive. `RUST_LOG` wins when set.
    pub level: String,
    /// Append log records to this file as well.
    pub file: Option<PathBuf>,
    pub stdout: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            stdout: true,
        }
    }
}

/// Application configuration read from a TOML file.
///
/// ```toml
/// [database]
/// backend = "sqlite"
/// connection_string = "salon.db"
///
/// [booking]
/// debounce_ms = 300
///
/// [logging]
/// level = "debug"
/// file = "salon.log"
/// ```
///
/// Every table and key is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DbConfig,
    pub booking: FlowConfig,
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DbConfig {
                backend: "sqlite".to_string(),
                connection_string: "salon.db".to_string(),
            },
            booking: FlowConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Loads `path` when given, otherwise returns the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Command-line flags take precedence over file values.
    pub fn with_overrides(
        mut self,
        backend: Option<String>,
        db: Option<String>,
        log_level: Option<String>,
    ) -> Self {
        if let Some(backend) = backend {
            self.database.backend = backend;
        }
        if let Some(db) = db {
            self.database.connection_string = db;
        }
        if let Some(level) = log_level {
            self.logging.level = level;
        }
        self
    }
}
