//! Runtime configuration for core callers.
//!
//! # Responsibility
//! - Collect store and logging settings from defaults or the environment.
//! - Open the configured durable store and start logging from one place.
//!
//! # Invariants
//! - `log_level` is always a normalized level name.
//! - `log_dir`, when set, is absolute.
//! - No `db_path` means a private in-memory database.

use crate::db::{open_db, open_db_in_memory};
use crate::kv::KvResult;
use crate::logging::{default_log_level, init_logging, normalize_level, normalize_log_dir};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "CONTACTBOOK_DB_PATH";
pub const LOG_LEVEL_ENV: &str = "CONTACTBOOK_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "CONTACTBOOK_LOG_DIR";

/// Invalid configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub variable: &'static str,
    pub message: String,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid {}: {}", self.variable, self.message)
    }
}

impl Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    /// SQLite file backing the key-value store.
    pub db_path: Option<PathBuf>,
    pub log_level: &'static str,
    /// File logging is skipped when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            log_level: default_log_level(),
            log_dir: None,
        }
    }
}

impl CoreConfig {
    /// Reads `CONTACTBOOK_*` variables; unset or blank ones keep defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as `from_env`, reading values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();

        if let Some(path) = read(DB_PATH_ENV) {
            config.db_path = Some(PathBuf::from(path));
        }
        if let Some(level) = read(LOG_LEVEL_ENV) {
            config.log_level = normalize_level(&level).map_err(|message| ConfigError {
                variable: LOG_LEVEL_ENV,
                message,
            })?;
        }
        if let Some(dir) = read(LOG_DIR_ENV) {
            let dir = normalize_log_dir(PathBuf::from(dir).as_path()).map_err(|message| {
                ConfigError {
                    variable: LOG_DIR_ENV,
                    message,
                }
            })?;
            config.log_dir = Some(dir);
        }

        Ok(config)
    }

    /// Opens the configured store database with migrations applied.
    pub fn open_connection(&self) -> KvResult<Connection> {
        match &self.db_path {
            Some(path) => open_db(path),
            None => open_db_in_memory(),
        }
    }

    /// Starts file logging when `log_dir` is set. Returns whether it did.
    pub fn init_logging(&self) -> Result<bool, String> {
        match &self.log_dir {
            Some(dir) => init_logging(self.log_level, dir).map(|()| true),
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CoreConfig, DB_PATH_ENV, LOG_DIR_ENV, LOG_LEVEL_ENV};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |name| values.get(name).cloned()
    }

    #[test]
    fn empty_environment_keeps_defaults() {
        let config = CoreConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, CoreConfig::default());
    }

    #[test]
    fn reads_and_normalizes_values() {
        let config = CoreConfig::from_lookup(lookup_from(&[
            (DB_PATH_ENV, " /var/lib/contactbook/store.db "),
            (LOG_LEVEL_ENV, "Warning"),
            (LOG_DIR_ENV, "/var/log/contactbook"),
        ]))
        .unwrap();

        assert_eq!(
            config.db_path,
            Some(PathBuf::from("/var/lib/contactbook/store.db"))
        );
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/contactbook")));
    }

    #[test]
    fn rejects_bad_level_and_relative_log_dir() {
        let err = CoreConfig::from_lookup(lookup_from(&[(LOG_LEVEL_ENV, "loud")])).unwrap_err();
        assert_eq!(err.variable, LOG_LEVEL_ENV);

        let err = CoreConfig::from_lookup(lookup_from(&[(LOG_DIR_ENV, "logs")])).unwrap_err();
        assert_eq!(err.variable, LOG_DIR_ENV);
    }

    #[test]
    fn in_memory_connection_when_no_path() {
        let conn = CoreConfig::default().open_connection().unwrap();
        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'kv_entries';",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 1);
    }
}
