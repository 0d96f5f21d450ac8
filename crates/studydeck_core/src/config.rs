//! Runtime configuration for hosts embedding the core.
//!
//! # Invariants
//! - `log_dir`, when set, is absolute (required by `init_logging`).
//! - `log_level` is one of `trace|debug|info|warn|error`.

use crate::logging::default_log_level;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const DEFAULT_DATA_DIR: &str = "studydeck-data";

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(toml::de::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "cannot read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

/// Storage and logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StudyConfig {
    /// Directory backing the blob store (database image and notes).
    pub data_dir: PathBuf,
    /// Directory of the legacy flat store, consulted once for migration.
    pub legacy_dir: Option<PathBuf>,
    pub log_level: String,
    /// Rolling log directory; logging stays off when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            legacy_dir: None,
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl StudyConfig {
    /// Parses TOML text and validates the result.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: StudyConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("data_dir cannot be empty".to_string()));
        }
        match self.log_level.trim().to_ascii_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "warning" | "error" => {}
            other => {
                return Err(ConfigError::Invalid(format!(
                    "unsupported log_level `{other}`"
                )))
            }
        }
        if let Some(log_dir) = &self.log_dir {
            if !log_dir.is_absolute() {
                return Err(ConfigError::Invalid(format!(
                    "log_dir must be an absolute path, got `{}`",
                    log_dir.display()
                )));
            }
        }
        Ok(())
    }
}

/// Reads and validates a TOML config file.
pub fn load_config(path: impl AsRef<Path>) -> Result<StudyConfig, ConfigError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    StudyConfig::from_toml_str(&text)
}
