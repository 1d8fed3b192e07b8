//! Runtime configuration for database bootstrap and logging.
//!
//! # Responsibility
//! - Describe how to open the wrapped SQLite connection.
//! - Describe where and how verbosely core logs are written.
//!
//! # Invariants
//! - Every field has a usable default except `LogConfig::dir`.
//! - Loading never panics; malformed input maps to `ConfigError`.

use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_LOG_BASENAME: &str = "datarepo";
const DEFAULT_MAX_LOG_FILE_BYTES: u64 = 10 * 1024 * 1024;
const DEFAULT_MAX_LOG_FILES: usize = 5;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub db: DbConfig,
    pub log: Option<LogConfig>,
}

impl Config {
    /// Parses a JSON configuration document.
    pub fn from_json_str(input: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&input)
    }

    fn validate(&self) -> ConfigResult<()> {
        if let Some(log) = &self.log {
            if log.max_files == 0 {
                return Err(ConfigError::Invalid(
                    "log.max_files must be at least 1".to_string(),
                ));
            }
            if log.file_basename.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "log.file_basename cannot be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// How to open the SQLite handle.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DbConfig {
    /// Database file. `None` opens a private in-memory database.
    pub path: Option<PathBuf>,
    pub foreign_keys: bool,
    pub busy_timeout_ms: u64,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            path: None,
            foreign_keys: true,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

impl DbConfig {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn memory() -> Self {
        Self::default()
    }
}

/// Rolling file log settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    #[serde(default = "default_level_string")]
    pub level: String,
    pub dir: PathBuf,
    #[serde(default = "default_basename")]
    pub file_basename: String,
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
    #[serde(default = "default_max_files")]
    pub max_files: usize,
}

impl LogConfig {
    /// Log settings for `dir` with build-mode defaults for everything else.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            level: default_level_string(),
            dir: dir.into(),
            file_basename: default_basename(),
            max_file_bytes: default_max_file_bytes(),
            max_files: default_max_files(),
        }
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }
}

fn default_level_string() -> String {
    crate::logging::default_log_level().to_string()
}

fn default_basename() -> String {
    DEFAULT_LOG_BASENAME.to_string()
}

fn default_max_file_bytes() -> u64 {
    DEFAULT_MAX_LOG_FILE_BYTES
}

fn default_max_files() -> usize {
    DEFAULT_MAX_LOG_FILES
}
