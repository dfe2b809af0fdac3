//! Core runtime configuration.
//!
//! # Responsibility
//! - Parse operator configuration from TOML with a default for every field.
//! - Reject configurations whose bounds would disable slug allocation or
//!   write retries.
//!
//! # Invariants
//! - Unknown keys are errors, not silently ignored.
//! - `CoreConfig::default()` always passes `validate()`.

use crate::logging::default_log_level;
use crate::service::content_service::ContentPolicy;
use crate::slugs::SlugPolicy;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Configuration loading/validation error.
#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(toml::de::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
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

/// Top-level configuration for the newsdesk core and CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    /// SQLite file. `None` means an in-memory database.
    pub database_path: Option<PathBuf>,
    pub log_level: String,
    /// Absolute log directory. `None` disables file logging.
    pub log_dir: Option<PathBuf>,
    pub slug: SlugPolicy,
    pub content: ContentPolicy,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            log_level: default_log_level().to_string(),
            log_dir: None,
            slug: SlugPolicy::default(),
            content: ContentPolicy::default(),
        }
    }
}

impl CoreConfig {
    /// Reads and validates a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Parses and validates TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.slug.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "slug.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.slug.max_base_len == 0 {
            return Err(ConfigError::Invalid(
                "slug.max_base_len must be at least 1".to_string(),
            ));
        }
        if self.content.write_retries == 0 {
            return Err(ConfigError::Invalid(
                "content.write_retries must be at least 1".to_string(),
            ));
        }
        if let Some(log_dir) = self.log_dir.as_ref() {
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
