//! Configuration management for the todokv server.
//!
//! Loads configuration from environment variables with sensible defaults.
//! A `.env` file, if present, is read by the binary before this runs.

use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use todokv_redb::{DEFAULT_LOCK_TIMEOUT, StorageConfig};
use tracing::Level;

/// Errors from loading or validating configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed.
    #[error("invalid value for {var}: {value:?}")]
    Invalid {
        /// Variable name
        var: &'static str,
        /// The rejected value
        value: String,
    },

    /// A timeout is zero.
    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    /// `PORT` is zero.
    #[error("PORT must be greater than zero")]
    ZeroPort,

    /// `DB_PATH` is empty.
    #[error("DB_PATH must not be empty")]
    EmptyDbPath,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,
    /// Storage file configuration
    pub storage: StorageConfig,
    /// Logging configuration
    pub log: LogConfig,
    /// Deadline of every todo request
    pub request_timeout: Duration,
    /// Deadline of the readiness probe
    pub ready_timeout: Duration,
}

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
    /// Grace period for in-flight requests on shutdown
    pub shutdown_timeout: Duration,
}

impl ServerConfig {
    /// `host:port` to bind.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Tracing output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable, multi-line
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Default level when `RUST_LOG` is unset
    pub level: Level,
    /// Output format
    pub format: LogFormat,
    /// `LOG_LEVEL` value that was not recognized and fell back to `info`
    pub unrecognized_level: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: LogFormat::Pretty,
            unrecognized_level: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                shutdown_timeout: Duration::from_secs(10),
            },
            storage: StorageConfig::new("todo.db").with_lock_timeout(DEFAULT_LOCK_TIMEOUT),
            log: LogConfig::default(),
            request_timeout: Duration::from_secs(5),
            ready_timeout: Duration::from_millis(500),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is malformed or the result fails
    /// [`Config::validate`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to its
    /// value. Unset and empty variables take their defaults.
    ///
    /// # Errors
    ///
    /// See [`Config::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let (level, unrecognized_level) = match get("LOG_LEVEL") {
            None => (defaults.log.level, None),
            Some(raw) => match parse_log_level(&raw) {
                Some(level) => (level, None),
                None => (Level::INFO, Some(raw)),
            },
        };

        let config = Self {
            server: ServerConfig {
                host: get("HOST").unwrap_or(defaults.server.host),
                port: parse_or("PORT", get("PORT"), defaults.server.port)?,
                shutdown_timeout: Duration::from_secs(parse_or(
                    "SHUTDOWN_TIMEOUT_SECS",
                    get("SHUTDOWN_TIMEOUT_SECS"),
                    defaults.server.shutdown_timeout.as_secs(),
                )?),
            },
            storage: StorageConfig::new(
                get("DB_PATH").map_or(defaults.storage.path, PathBuf::from),
            )
            .with_lock_timeout(millis_or(
                "DB_LOCK_TIMEOUT_MS",
                get("DB_LOCK_TIMEOUT_MS"),
                defaults.storage.lock_timeout,
            )?),
            log: LogConfig {
                level,
                format: match get("LOG_FORMAT") {
                    None => defaults.log.format,
                    Some(raw) => parse_log_format(&raw).ok_or(ConfigError::Invalid {
                        var: "LOG_FORMAT",
                        value: raw,
                    })?,
                },
                unrecognized_level,
            },
            request_timeout: millis_or(
                "REQUEST_TIMEOUT_MS",
                get("REQUEST_TIMEOUT_MS"),
                defaults.request_timeout,
            )?,
            ready_timeout: millis_or(
                "READY_TIMEOUT_MS",
                get("READY_TIMEOUT_MS"),
                defaults.ready_timeout,
            )?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the server cannot run with.
    ///
    /// # Errors
    ///
    /// - `ZeroTimeout`: any timeout is zero
    /// - `ZeroPort`: the port is zero
    /// - `EmptyDbPath`: the storage path is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::ZeroPort);
        }
        if self.storage.path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyDbPath);
        }
        let timeouts = [
            ("DB_LOCK_TIMEOUT_MS", self.storage.lock_timeout),
            ("REQUEST_TIMEOUT_MS", self.request_timeout),
            ("READY_TIMEOUT_MS", self.ready_timeout),
            ("SHUTDOWN_TIMEOUT_SECS", self.server.shutdown_timeout),
        ];
        if let Some((var, _)) = timeouts.into_iter().find(|(_, t)| t.is_zero()) {
            return Err(ConfigError::ZeroTimeout(var));
        }
        Ok(())
    }
}

/// `debug`, `info`, `warn`/`warning`, `error` and `trace`, case-insensitive.
fn parse_log_level(raw: &str) -> Option<Level> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" | "warning" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

fn parse_log_format(raw: &str) -> Option<LogFormat> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "pretty" | "text" => Some(LogFormat::Pretty),
        "json" => Some(LogFormat::Json),
        _ => None,
    }
}

fn parse_or<T: std::str::FromStr>(
    var: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
    }
}

fn millis_or(
    var: &'static str,
    raw: Option<String>,
    default: Duration,
) -> Result<Duration, ConfigError> {
    raw.map_or(Ok(default), |value| {
        parse_or(var, Some(value), 0u64).map(Duration::from_millis)
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Config::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.server.address(), "0.0.0.0:8080");
        assert_eq!(config.storage.path, PathBuf::from("todo.db"));
        assert_eq!(config.storage.lock_timeout, Duration::from_secs(1));
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.ready_timeout, Duration::from_millis(500));
        assert_eq!(config.server.shutdown_timeout, Duration::from_secs(10));
        assert_eq!(config.log.level, Level::INFO);
        assert_eq!(config.log.format, LogFormat::Pretty);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "9000"),
            ("DB_PATH", "/var/lib/todokv/todo.db"),
            ("DB_LOCK_TIMEOUT_MS", "250"),
            ("LOG_LEVEL", "DEBUG"),
            ("LOG_FORMAT", "json"),
            ("REQUEST_TIMEOUT_MS", "1500"),
            ("READY_TIMEOUT_MS", "100"),
            ("SHUTDOWN_TIMEOUT_SECS", "3"),
        ])
        .unwrap();
        assert_eq!(config.server.address(), "127.0.0.1:9000");
        assert_eq!(config.storage.path, PathBuf::from("/var/lib/todokv/todo.db"));
        assert_eq!(config.storage.lock_timeout, Duration::from_millis(250));
        assert_eq!(config.log.level, Level::DEBUG);
        assert_eq!(config.log.format, LogFormat::Json);
        assert_eq!(config.request_timeout, Duration::from_millis(1500));
        assert_eq!(config.ready_timeout, Duration::from_millis(100));
        assert_eq!(config.server.shutdown_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_empty_values_take_defaults() {
        let config = load(&[("PORT", ""), ("DB_PATH", "")]).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.storage.path, PathBuf::from("todo.db"));
    }

    #[test]
    fn test_log_level_aliases_and_fallback() {
        assert_eq!(load(&[("LOG_LEVEL", "warning")]).unwrap().log.level, Level::WARN);

        let config = load(&[("LOG_LEVEL", "verbose")]).unwrap();
        assert_eq!(config.log.level, Level::INFO);
        assert_eq!(config.log.unrecognized_level.as_deref(), Some("verbose"));
    }

    #[test]
    fn test_malformed_values_are_rejected() {
        assert_eq!(
            load(&[("PORT", "eighty")]).unwrap_err(),
            ConfigError::Invalid {
                var: "PORT",
                value: "eighty".to_string()
            }
        );
        assert!(matches!(
            load(&[("LOG_FORMAT", "xml")]),
            Err(ConfigError::Invalid { var: "LOG_FORMAT", .. })
        ));
        assert!(matches!(
            load(&[("REQUEST_TIMEOUT_MS", "-5")]),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn test_validation() {
        assert_eq!(load(&[("PORT", "0")]).unwrap_err(), ConfigError::ZeroPort);
        assert_eq!(
            load(&[("REQUEST_TIMEOUT_MS", "0")]).unwrap_err(),
            ConfigError::ZeroTimeout("REQUEST_TIMEOUT_MS")
        );
        assert_eq!(
            load(&[("SHUTDOWN_TIMEOUT_SECS", "0")]).unwrap_err(),
            ConfigError::ZeroTimeout("SHUTDOWN_TIMEOUT_SECS")
        );

        let mut config = Config::default();
        config.storage.path = PathBuf::new();
        assert_eq!(config.validate().unwrap_err(), ConfigError::EmptyDbPath);
    }
}
