//! Configuration loading from TOML files.

use std::path::Path;

use serde::Deserialize;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::ConfigError;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub windows: WindowsConfig,
    pub rpc: RpcConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

/// Result-set and challenge window durations, in seconds.
///
/// The upstream producer does not emit these per floor, so they are
/// configured here and applied when deriving `t_result_set_max` and
/// `t_result_challenge_max`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WindowsConfig {
    pub result_set_secs: u64,
    pub challenge_secs: u64,
}

/// JSON-RPC endpoint used for first-sighting ERC-20 metadata reads.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
    pub url: String,
}

impl Config {
    /// Load and validate a configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.logging.level.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "logging.level",
                reason: "cannot be empty".into(),
            });
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(ConfigError::InvalidValue {
                field: "logging.format",
                reason: format!("expected \"pretty\" or \"json\", got {:?}", self.logging.format),
            });
        }
        if self.windows.result_set_secs == 0 || self.windows.challenge_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "windows",
                reason: "window durations must be positive".into(),
            });
        }
        if self.rpc.url.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "rpc.url",
                reason: "cannot be empty".into(),
            });
        }
        Ok(())
    }
}

impl LoggingConfig {
    /// Initialize the tracing subscriber with this logging configuration.
    pub fn init(&self) {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level));

        match self.format.as_str() {
            "json" => {
                fmt().json().with_env_filter(filter).init();
            }
            _ => {
                fmt().with_env_filter(filter).init();
            }
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "pretty".into(),
        }
    }
}

impl Default for WindowsConfig {
    fn default() -> Self {
        Self {
            result_set_secs: 60 * 60,
            challenge_secs: 60 * 60,
        }
    }
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8545".into(),
        }
    }
}
