//! Environment-driven application configuration.
//!
//! # Responsibility
//! - Load an optional `.env` file once, then read `REALIZA_*` variables.
//! - Resolve defaults for the database path and log directory.
//!
//! # Invariants
//! - Boolean variables only recognise `true`/`false` (any case); any other
//!   value falls back to the default.
//! - `log_dir` is always absolute.
//! - Without an explicit level, `debug` selects `debug`, otherwise `info`.

use crate::logging::{log_level_for_debug, normalize_level};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_DATABASE_PATH: &str = "REALIZA_DATABASE_PATH";
pub const ENV_LOG_DIR: &str = "REALIZA_LOG_DIR";
pub const ENV_LOG_LEVEL: &str = "REALIZA_LOG_LEVEL";
pub const ENV_DEBUG: &str = "REALIZA_DEBUG";

const DEFAULT_DATABASE_PATH: &str = "realiza.db";
const DEFAULT_LOG_SUBDIR: &str = "tmp";

#[derive(Debug)]
pub enum ConfigError {
    /// Variable is set but cannot be used.
    InvalidValue { key: &'static str, message: String },
    CurrentDir(std::io::Error),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, message } => write!(f, "invalid `{key}`: {message}"),
            Self::CurrentDir(err) => write!(f, "cannot resolve current directory: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::CurrentDir(err) => Some(err),
            Self::InvalidValue { .. } => None,
        }
    }
}

/// Resolved runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database_path: PathBuf,
    pub log_dir: PathBuf,
    pub log_level: String,
    pub debug: bool,
}

impl AppConfig {
    /// Loads `.env` when present, then reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Missing .env is normal; real variables still apply.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let current_dir = std::env::current_dir().map_err(ConfigError::CurrentDir)?;

        let database_path = env_value(&lookup, ENV_DATABASE_PATH)
            .map_or_else(|| PathBuf::from(DEFAULT_DATABASE_PATH), PathBuf::from);

        let log_dir = match env_value(&lookup, ENV_LOG_DIR) {
            Some(dir) => {
                let dir = PathBuf::from(dir);
                if dir.is_absolute() {
                    dir
                } else {
                    current_dir.join(dir)
                }
            }
            None => current_dir.join(DEFAULT_LOG_SUBDIR),
        };

        let debug = env_flag(&lookup, ENV_DEBUG, cfg!(debug_assertions));

        let log_level = match env_value(&lookup, ENV_LOG_LEVEL) {
            Some(level) => normalize_level(&level)
                .map_err(|err| ConfigError::InvalidValue {
                    key: ENV_LOG_LEVEL,
                    message: err.to_string(),
                })?
                .to_string(),
            None => log_level_for_debug(debug).to_string(),
        };

        Ok(Self {
            database_path,
            log_dir,
            log_level,
            debug,
        })
    }
}

/// Trimmed variable value; blank values count as unset.
fn env_value(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_flag(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: bool) -> bool {
    match lookup(key).map(|value| value.trim().to_ascii_lowercase()).as_deref() {
        Some("true") => true,
        Some("false") => false,
        _ => default,
    }
}
