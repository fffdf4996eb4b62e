//! Environment-driven configuration for the request boundary.
//!
//! # Invariants
//! - Blank values behave exactly like unset ones.
//! - Resolution reads only through the supplied lookup, never global state.

use postclip_core::{default_log_level, init_logging, LoggingError, ServiceProfile};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "POSTCLIP_DB_PATH";
pub const PROFILE_ENV: &str = "POSTCLIP_PROFILE";
pub const LOG_LEVEL_ENV: &str = "POSTCLIP_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "POSTCLIP_LOG_DIR";

const DEFAULT_DB_FILE_NAME: &str = "postclip.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    UnknownProfile(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownProfile(value) => write!(
                f,
                "unknown {PROFILE_ENV} `{value}`; expected capture|strict"
            ),
        }
    }
}

impl Error for ConfigError {}

/// Resolved runtime settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub db_path: PathBuf,
    pub profile: ServiceProfile,
    pub log_level: String,
    /// Logging stays off when unset.
    pub log_dir: Option<PathBuf>,
}

impl ApiConfig {
    /// Resolves settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves settings through `lookup`, applying defaults for unset keys.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let value = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|trimmed| !trimmed.is_empty())
        };

        let db_path = value(DB_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME));

        let profile = match value(PROFILE_ENV) {
            Some(raw) => ServiceProfile::parse(&raw).ok_or(ConfigError::UnknownProfile(raw))?,
            None => ServiceProfile::default(),
        };

        Ok(Self {
            db_path,
            profile,
            log_level: value(LOG_LEVEL_ENV).unwrap_or_else(|| default_log_level().to_string()),
            log_dir: value(LOG_DIR_ENV).map(PathBuf::from),
        })
    }

    /// Starts file logging when a log directory is configured.
    ///
    /// Returns `Ok(false)` when logging is disabled.
    pub fn start_logging(&self) -> Result<bool, LoggingError> {
        match &self.log_dir {
            Some(log_dir) => init_logging(&self.log_level, log_dir).map(|()| true),
            None => Ok(false),
        }
    }
}
