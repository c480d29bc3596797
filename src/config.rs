//! Configuration management for cli-harness.
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Environment variables
//! 2. Configuration file (JSON)
//! 3. Default values

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::logging::DEFAULT_FILTER;

/// Whitespace-separated arguments prefixed to every invoker call.
pub const ENV_PERSISTENT_ARGS: &str = "CLI_HARNESS_PERSISTENT_ARGS";
/// Per-call timeout in seconds; `0` disables it.
pub const ENV_TIMEOUT_SECS: &str = "CLI_HARNESS_TIMEOUT_SECS";
/// Log filter directive.
pub const ENV_LOG_LEVEL: &str = "CLI_HARNESS_LOG_LEVEL";
/// Path of the configuration file read by the demo binary.
pub const ENV_CONFIG_PATH: &str = "CLI_HARNESS_CONFIG";

/// Harness configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Repeatable invoker settings.
    pub invoker: InvokerSection,
    /// Logging configuration.
    pub logging: LoggingSection,
}

/// Repeatable invoker section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvokerSection {
    /// Arguments placed before every call's own arguments.
    pub persistent_args: Vec<String>,
    /// Per-call timeout in seconds.
    pub timeout_secs: Option<u64>,
}

/// Logging configuration section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Filter directive (`info`, `cli_harness=debug`, ...).
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: DEFAULT_FILTER.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Apply environment variable overrides.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides read through `lookup`.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(args) = lookup(ENV_PERSISTENT_ARGS) {
            self.invoker.persistent_args = args.split_whitespace().map(String::from).collect();
        }

        if let Some(secs) = lookup(ENV_TIMEOUT_SECS) {
            if let Ok(secs) = secs.trim().parse() {
                self.invoker.timeout_secs = Some(secs);
            }
        }

        if let Some(level) = lookup(ENV_LOG_LEVEL).or_else(|| lookup("RUST_LOG")) {
            self.logging.level = level;
        }
    }

    /// Load configuration with full priority chain.
    ///
    /// Priority: env vars > config file > defaults
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Per-call timeout, if one is configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.invoker
            .timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    /// Get the log level filter string.
    pub fn log_filter(&self) -> &str {
        &self.logging.level
    }
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// IO error reading config file.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("failed to parse config file: {0}")]
    Json(#[from] serde_json::Error),
}
