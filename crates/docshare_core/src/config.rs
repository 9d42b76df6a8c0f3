//! Runtime configuration loaded from environment variables.
//!
//! # Responsibility
//! - Resolve database path, file-store root, and logging settings.
//! - Report which defaults were applied.
//!
//! # Invariants
//! - Loading never panics; malformed values surface as `ConfigError`.
//! - `max_notifications_per_user` is at least 1.

use crate::logging::default_log_level;
use crate::model::notification::DEFAULT_MAX_NOTIFICATIONS_PER_USER;
use log::info;
use std::path::PathBuf;
use thiserror::Error;

pub const ENV_DB_PATH: &str = "DOCSHARE_DB_PATH";
pub const ENV_FILES_DIR: &str = "DOCSHARE_FILES_DIR";
pub const ENV_LOG_LEVEL: &str = "DOCSHARE_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "DOCSHARE_LOG_DIR";
pub const ENV_MAX_NOTIFICATIONS: &str = "DOCSHARE_MAX_NOTIFICATIONS";

const DEFAULT_DB_PATH: &str = "docshare.sqlite3";
const DEFAULT_FILES_DIR: &str = "Files";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: `{value}` ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    /// Root of the file store; `Files/` and `ImageCovers/` live below it.
    pub files_dir: PathBuf,
    pub log_level: String,
    /// File logging is off when unset.
    pub log_dir: Option<PathBuf>,
    pub max_notifications_per_user: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            files_dir: PathBuf::from(DEFAULT_FILES_DIR),
            log_level: default_log_level().to_string(),
            log_dir: None,
            max_notifications_per_user: DEFAULT_MAX_NOTIFICATIONS_PER_USER,
        }
    }
}

impl AppConfig {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let read = |key: &'static str| {
            let value = lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty());
            if value.is_none() {
                info!("event=config_default module=config status=ok key={key}");
            }
            value
        };

        let max_notifications_per_user = match read(ENV_MAX_NOTIFICATIONS) {
            Some(value) => parse_cap(&value)?,
            None => defaults.max_notifications_per_user,
        };

        Ok(Self {
            db_path: read(ENV_DB_PATH).map_or(defaults.db_path, PathBuf::from),
            files_dir: read(ENV_FILES_DIR).map_or(defaults.files_dir, PathBuf::from),
            log_level: read(ENV_LOG_LEVEL).unwrap_or(defaults.log_level),
            log_dir: read(ENV_LOG_DIR).map(PathBuf::from),
            max_notifications_per_user,
        })
    }
}

fn parse_cap(value: &str) -> Result<u32, ConfigError> {
    let invalid = |reason| ConfigError::Invalid {
        key: ENV_MAX_NOTIFICATIONS,
        value: value.to_string(),
        reason,
    };
    let cap: u32 = value
        .parse()
        .map_err(|_| invalid("must be a positive integer"))?;
    if cap == 0 {
        return Err(invalid("must be at least 1"));
    }
    Ok(cap)
}
