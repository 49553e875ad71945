//! Configuration loading from file and environment variables.

use serde::Deserialize;
use thiserror::Error;

/// Path read when neither `--config` nor `DIGSIGDB_CONFIG_PATH` is given.
pub const DEFAULT_CONFIG_PATH: &str = "/usr/local/etc/digsigdb.toml";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub statistics: StatisticsConfig,
}

/// Database configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,

    /// Busy timeout for SQLite connections, in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Maximum number of pooled connections.
    #[serde(default = "default_pool_max_size")]
    pub pool_max_size: u32,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "digsig_orm=debug,warn").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

/// Retention and monitoring thresholds for statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct StatisticsConfig {
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,

    #[serde(default = "default_warning_days")]
    pub warning_days: i64,

    #[serde(default = "default_critical_days")]
    pub critical_days: i64,
}

fn default_db_path() -> String {
    "/var/lib/digsigdb/digsigdb.db".to_string()
}

fn default_busy_timeout_ms() -> u64 {
    digsig_db::DbRuntimeSettings::default().busy_timeout_ms
}

fn default_pool_max_size() -> u32 {
    digsig_db::DbRuntimeSettings::default().pool_max_size
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_retention_days() -> i64 {
    digsig_orm::DEFAULT_RETENTION_DAYS
}

fn default_warning_days() -> i64 {
    1
}

fn default_critical_days() -> i64 {
    7
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
            pool_max_size: default_pool_max_size(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        Self {
            retention_days: default_retention_days(),
            warning_days: default_warning_days(),
            critical_days: default_critical_days(),
        }
    }
}

impl DatabaseConfig {
    pub fn runtime_settings(&self) -> digsig_db::DbRuntimeSettings {
        digsig_db::DbRuntimeSettings {
            busy_timeout_ms: self.busy_timeout_ms,
            pool_max_size: self.pool_max_size,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is outside its permitted range.
    #[error("invalid value for {key}: {value}")]
    Invalid {
        /// Dotted key of the offending setting.
        key: &'static str,
        /// The rejected value.
        value: i64,
    },
}

impl StatisticsConfig {
    /// Checks that every day count is usable as a retention or threshold.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` for a negative count or one above
    /// `digsig_types::MAX_DAYS`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks = [
            ("statistics.retention_days", self.retention_days),
            ("statistics.warning_days", self.warning_days),
            ("statistics.critical_days", self.critical_days),
        ];
        for (key, value) in checks {
            if digsig_types::days(value).is_err() {
                return Err(ConfigError::Invalid { key, value });
            }
        }
        Ok(())
    }
}

/// Loads configuration from a TOML file, falling back to defaults when the
/// file does not exist, then applies environment overrides.
///
/// Environment variable overrides:
/// - `DIGSIGDB_DB_PATH` overrides `database.path`
/// - `DIGSIGDB_LOG_LEVEL` overrides `logging.level`
/// - `DIGSIGDB_LOG_JSON` overrides `logging.json` (set to "true" to enable)
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed,
/// or if a `[statistics]` day count is out of range.
pub fn load_config(path: &str) -> Result<Config, ConfigError> {
    let mut config = read_config_file(path)?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    config.statistics.validate()?;
    Ok(config)
}

fn read_config_file(path: &str) -> Result<Config, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!(path, "config file not found, using defaults");
            Ok(Config::default())
        }
        Err(e) => Err(ConfigError::FileRead(e)),
    }
}

fn apply_env_overrides(config: &mut Config, var: impl Fn(&str) -> Option<String>) {
    if let Some(db_path) = var("DIGSIGDB_DB_PATH") {
        config.database.path = db_path;
    }
    if let Some(level) = var("DIGSIGDB_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = var("DIGSIGDB_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
}
