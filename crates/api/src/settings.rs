//! Service Configuration
//!
//! Layered with the `config` crate: built-in defaults, then an optional
//! TOML file, then `CDSS__SECTION__KEY` environment variables.

use crate::rate_limit::RateLimitConfig;
use config::{Config, ConfigError, Environment, File};
use request_validator::ValidationConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::Level;

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "cdss";

/// Top-level service settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub rules: RuleSettings,
    pub rate_limit: RateLimitConfig,
    pub validation: ValidationConfig,
    pub history: HistorySettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Listen address
    pub bind_addr: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Max level: trace, debug, info, warn, error
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Where the rule set comes from
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSettings {
    /// JSON rule file; the built-in catalog is used when unset
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistorySettings {
    /// Evaluations kept in the alert log
    pub max_records: usize,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            max_records: 10_000,
        }
    }
}

impl Settings {
    /// Load settings. An explicit `path` must exist; otherwise `cdss.toml`
    /// (or any supported extension) in the working directory is optional.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::with_name(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        Config::builder()
            .add_source(Config::try_from(&Settings::default())?)
            .add_source(file)
            .add_source(
                Environment::with_prefix("CDSS")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<Settings>()?
            .checked()
    }

    fn checked(self) -> Result<Self, ConfigError> {
        if Level::from_str(&self.logging.level).is_err() {
            return Err(ConfigError::Message(format!(
                "logging.level: unknown level '{}'",
                self.logging.level
            )));
        }
        Ok(self)
    }
}
