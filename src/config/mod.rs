//! Configuration module for xpanel.
//!
//! Process configuration covers what must be known before the settings store
//! is opened: log verbosity and the store location. It is loaded from an
//! optional YAML file and then overridden by environment variables. Panel
//! settings (listen port, credentials) live in the store, not here.

mod logging;
mod store;

pub use logging::{LogFormat, LogLevel, LogOutput, LoggingConfig};
pub use store::{StoreConfig, DEFAULT_STORE_PATH};

use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::PanelError;

/// Environment variable naming the configuration file.
pub const ENV_CONFIG_PATH: &str = "XPANEL_CONFIG";

/// Environment variable overriding the log level.
pub const ENV_LOG_LEVEL: &str = "XPANEL_LOG_LEVEL";

/// Environment variable overriding the log format.
pub const ENV_LOG_FORMAT: &str = "XPANEL_LOG_FORMAT";

/// Environment variable overriding the store path.
pub const ENV_DB_PATH: &str = "XPANEL_DB_PATH";

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Settings store configuration.
    pub store: StoreConfig,
}

impl Config {
    /// Loads configuration from an optional path, then applies environment
    /// overrides.
    ///
    /// Without an explicit path, `XPANEL_CONFIG` is consulted, then the
    /// default search paths. Missing files fall back to defaults.
    pub fn load<P: AsRef<Path>>(path: Option<P>) -> Result<Self, PanelError> {
        let mut config = match Self::resolve_path(path) {
            Some(p) => Self::load_from_path(p)?,
            None => Self::default(),
        };

        config.apply_overrides(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    fn resolve_path<P: AsRef<Path>>(path: Option<P>) -> Option<PathBuf> {
        if let Some(p) = path {
            return Some(p.as_ref().to_path_buf());
        }

        if let Ok(p) = env::var(ENV_CONFIG_PATH) {
            return Some(PathBuf::from(p));
        }

        let default_paths = [
            "/etc/xpanel/config.yaml",
            "/etc/xpanel/config.yml",
            "config.yaml",
            "config.yml",
        ];

        default_paths
            .iter()
            .map(PathBuf::from)
            .find(|p| p.exists())
    }

    /// Loads configuration from a YAML file.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, PanelError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            PanelError::config_with_source(
                format!("Failed to read config file '{}'", path.as_ref().display()),
                e,
            )
        })?;

        Self::load_from_str(&content)
    }

    /// Loads configuration from a YAML string.
    pub fn load_from_str(content: &str) -> Result<Self, PanelError> {
        let config: Config = serde_yaml::from_str(content)
            .map_err(|e| PanelError::config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Applies overrides read through `lookup`.
    ///
    /// Unlike the file loader this never silently ignores a value: an
    /// unknown log level or format is a fatal configuration error.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), PanelError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.logging.level = level.parse()?;
        }
        if let Some(format) = lookup(ENV_LOG_FORMAT) {
            self.logging.format = format.parse()?;
        }
        if let Some(path) = lookup(ENV_DB_PATH) {
            self.store.path = PathBuf::from(path);
        }
        Ok(())
    }

    /// Validates configuration.
    fn validate(&self) -> Result<(), PanelError> {
        if self.store.path.as_os_str().is_empty() {
            return Err(PanelError::config("store.path must not be empty"));
        }

        if self.logging.output == LogOutput::File && self.logging.file_path.is_none() {
            return Err(PanelError::config(
                "logging.file_path is required when output is file",
            ));
        }

        Ok(())
    }
}
