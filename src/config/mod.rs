//! Configuration management for the console core
//!
//! This module handles loading, parsing, and validating configuration from:
//! - A configuration file (TOML format)
//! - Environment variables
//!
//! Configuration precedence (highest to lowest):
//! 1. Environment variables
//! 2. Configuration file
//! 3. Default values

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ConfigError, Result};

/// Environment variable overriding the connection store file.
pub const ENV_CONNECTIONS_FILE: &str = "MONGO_CONSOLE_CONNECTIONS";

/// Environment variable overriding the log level.
pub const ENV_LOG_LEVEL: &str = "MONGO_CONSOLE_LOG_LEVEL";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Connection pool configuration
    #[serde(default)]
    pub pool: PoolConfig,

    /// Connection record store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Connection pool configuration
///
/// Durations are stored in seconds to keep the file format readable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PoolConfig {
    /// Maximum sockets per pooled client
    #[serde(default = "default_max_pool_size")]
    pub max_pool_size: u32,

    /// Minimum sockets kept open per pooled client
    #[serde(default = "default_min_pool_size")]
    pub min_pool_size: u32,

    /// Driver-level idle socket close threshold in seconds
    #[serde(default = "default_max_idle_time")]
    pub max_idle_time: u64,

    /// Connect timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,

    /// Server selection timeout in seconds
    #[serde(default = "default_server_selection_timeout")]
    pub server_selection_timeout: u64,

    /// A pooled client unused for this many seconds is closed by the sweep
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout: u64,

    /// Interval between idle sweeps in seconds
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval: u64,

    /// Timeout for one-off connection tests in seconds
    #[serde(default = "default_test_timeout")]
    pub test_timeout: u64,

    /// Application name reported to the server
    #[serde(default = "default_app_name")]
    pub app_name: String,
}

/// Connection record store configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreConfig {
    /// Path to the JSON file holding saved connections
    #[serde(default = "default_connections_file")]
    pub connections_file: PathBuf,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: LogLevel,

    /// Enable timestamps in logs
    #[serde(default = "default_log_timestamps")]
    pub timestamps: bool,
}

/// Log level options
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

// Default value functions
fn default_max_pool_size() -> u32 {
    10
}

fn default_min_pool_size() -> u32 {
    1
}

fn default_max_idle_time() -> u64 {
    300
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_server_selection_timeout() -> u64 {
    10
}

fn default_idle_timeout() -> u64 {
    300
}

fn default_sweep_interval() -> u64 {
    60
}

fn default_test_timeout() -> u64 {
    5
}

fn default_app_name() -> String {
    "mongo-console".to_string()
}

fn default_connections_file() -> PathBuf {
    config_dir().join("connections.json")
}

fn default_log_level() -> LogLevel {
    LogLevel::Warn
}

fn default_log_timestamps() -> bool {
    true
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".mongo-console")
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_pool_size: default_max_pool_size(),
            min_pool_size: default_min_pool_size(),
            max_idle_time: default_max_idle_time(),
            connect_timeout: default_connect_timeout(),
            server_selection_timeout: default_server_selection_timeout(),
            idle_timeout: default_idle_timeout(),
            sweep_interval: default_sweep_interval(),
            test_timeout: default_test_timeout(),
            app_name: default_app_name(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            connections_file: default_connections_file(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            timestamps: default_log_timestamps(),
        }
    }
}

impl Config {
    /// Get the default configuration file path
    pub fn default_config_path() -> PathBuf {
        config_dir().join("config.toml")
    }

    /// Load configuration from a TOML file
    ///
    /// A missing file is not an error when no explicit path was given; the
    /// defaults are used instead.
    ///
    /// # Arguments
    /// * `path` - Explicit path, or `None` for the default location
    pub fn load_from_file(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (Self::default_config_path(), false),
        };

        if !path.exists() {
            if explicit {
                return Err(ConfigError::FileNotFound(path.display().to_string()).into());
            }
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| ConfigError::InvalidFormat(e.to_string()).into())
    }

    /// Load configuration from file and apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = Self::load_from_file(path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides using the given lookup
    ///
    /// The lookup is injected so overrides can be tested without touching
    /// the process environment.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(ENV_CONNECTIONS_FILE).filter(|s| !s.is_empty()) {
            self.store.connections_file = PathBuf::from(path);
        }

        if let Some(level) = lookup(ENV_LOG_LEVEL).filter(|s| !s.is_empty()) {
            self.logging.level = LogLevel::parse(&level).ok_or(ConfigError::InvalidValue {
                field: ENV_LOG_LEVEL.to_string(),
                value: level,
            })?;
        }

        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let pool = &self.pool;

        if pool.max_pool_size == 0 {
            return Err(invalid("pool.max_pool_size", pool.max_pool_size));
        }
        if pool.min_pool_size > pool.max_pool_size {
            return Err(invalid("pool.min_pool_size", pool.min_pool_size));
        }
        if pool.connect_timeout == 0 {
            return Err(invalid("pool.connect_timeout", pool.connect_timeout));
        }
        if pool.server_selection_timeout == 0 {
            return Err(invalid(
                "pool.server_selection_timeout",
                pool.server_selection_timeout,
            ));
        }
        if pool.sweep_interval == 0 {
            return Err(invalid("pool.sweep_interval", pool.sweep_interval));
        }
        if pool.test_timeout == 0 {
            return Err(invalid("pool.test_timeout", pool.test_timeout));
        }

        Ok(())
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::InvalidFormat(e.to_string()).into())
    }
}

fn invalid(field: &str, value: impl ToString) -> crate::error::MongoConsoleError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    }
    .into()
}

impl PoolConfig {
    /// Connect timeout as Duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }

    /// Server selection timeout as Duration
    pub fn server_selection_timeout(&self) -> Duration {
        Duration::from_secs(self.server_selection_timeout)
    }

    /// Driver idle socket threshold as Duration
    pub fn max_idle_time(&self) -> Duration {
        Duration::from_secs(self.max_idle_time)
    }

    /// Pooled client idle threshold as Duration
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout)
    }

    /// Sweep interval as Duration
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval)
    }

    /// Connection test timeout as Duration
    pub fn test_timeout(&self) -> Duration {
        Duration::from_secs(self.test_timeout)
    }
}

impl LogLevel {
    /// Parse a level name, case-insensitively
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "error" => Some(LogLevel::Error),
            "warn" | "warning" => Some(LogLevel::Warn),
            "info" => Some(LogLevel::Info),
            "debug" => Some(LogLevel::Debug),
            "trace" => Some(LogLevel::Trace),
            _ => None,
        }
    }

    /// Convert to tracing::Level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.pool.max_pool_size, 10);
        assert_eq!(config.pool.min_pool_size, 1);
        assert_eq!(config.pool.idle_timeout(), Duration::from_secs(300));
        assert_eq!(config.pool.sweep_interval(), Duration::from_secs(60));
        assert_eq!(config.pool.test_timeout(), Duration::from_secs(5));
        assert_eq!(config.logging.level, LogLevel::Warn);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = Config::from_toml_str(
            r#"
            [pool]
            idle_timeout = 30

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.pool.idle_timeout, 30);
        assert_eq!(config.pool.max_pool_size, 10);
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert!(config.logging.timestamps);
    }

    #[test]
    fn test_invalid_toml() {
        let err = Config::from_toml_str("[pool]\nmax_pool_size = \"many\"").unwrap_err();
        assert!(err.to_string().contains("Invalid config format"));
    }

    #[test]
    fn test_validate_rejects_inverted_pool_bounds() {
        let mut config = Config::default();
        config.pool.min_pool_size = 20;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_CONNECTIONS_FILE, "/tmp/conns.json"),
            (ENV_LOG_LEVEL, "TRACE"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_env(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(
            config.store.connections_file,
            PathBuf::from("/tmp/conns.json")
        );
        assert_eq!(config.logging.level, LogLevel::Trace);
    }

    #[test]
    fn test_env_rejects_unknown_level() {
        let mut config = Config::default();
        let result = config.apply_env(|k| (k == ENV_LOG_LEVEL).then(|| "loud".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(Config::load_from_file(Some(&missing)).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[store]\nconnections_file = \"/data/c.json\"\n").unwrap();

        let config = Config::load_from_file(Some(&path)).unwrap();
        assert_eq!(config.store.connections_file, PathBuf::from("/data/c.json"));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = Config::default();
        let rendered = config.to_toml().unwrap();
        assert_eq!(Config::from_toml_str(&rendered).unwrap(), config);
    }
}
