//! # API Configuration
//!
//! Production-grade configuration management with:
//!
//! - Environment variable support (12-factor app)
//! - Configuration file loading (YAML)
//! - Comprehensive validation
//! - Sensible defaults
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `MIGRATE_API_ADDR` | HTTP listen address | `127.0.0.1:8080` |
//! | `MIGRATE_REQUEST_TIMEOUT_SECS` | Informational per-request timeout | `30` |
//! | `MIGRATE_TEMP_DIR` | Working-tree root for git clones | `./temp_repos` |
//! | `MIGRATE_LOG_LEVEL` | Log level | `info` |
//! | `MIGRATE_LOG_FORMAT` | Log format (`pretty`/`json`) | `pretty` |
//!
//! ```rust,ignore
//! use migrate_api::config::ApiConfig;
//!
//! let config = ApiConfig::from_env().expect("invalid configuration");
//! config.validate_config().expect("configuration validation failed");
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error("failed to parse environment variable {key}: {message}")]
    EnvParse { key: String, message: String },
    #[error("failed to load configuration file: {0}")]
    FileLoad(String),
    #[error("validation failed: {0}")]
    Validation(String),
}

/// Top-level configuration for the migration API process.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct ApiConfig {
    /// HTTP listen address.
    pub addr: SocketAddr,

    /// Informational per-request timeout; the engine's own provider-adapter
    /// timeout is a fixed constant independent of this value.
    #[validate(range(min = 1, max = 3600))]
    pub request_timeout_secs: u32,

    /// Root directory under which per-job bare clones are created.
    pub temp_dir: PathBuf,

    /// `tracing` filter directive, e.g. `info`, `debug`.
    pub log_level: String,

    /// `pretty` for human-readable output, `json` for structured log lines.
    pub log_format: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:8080".parse().expect("default address is valid"),
            request_timeout_secs: 30,
            temp_dir: PathBuf::from("./temp_repos"),
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
        }
    }
}

impl ApiConfig {
    /// Builds a config from defaults overlaid with whichever environment
    /// variables are set.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.merge_env()?;
        Ok(config)
    }

    /// Loads a config from a YAML file, with no environment overlay.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileLoad(e.to_string()))?;
        serde_yaml::from_str(&content).map_err(|e| ConfigError::FileLoad(e.to_string()))
    }

    /// Overrides `self` with any environment variable that is explicitly set,
    /// leaving fields whose variable is absent untouched.
    pub fn merge_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(addr) = std::env::var("MIGRATE_API_ADDR") {
            self.addr = addr.parse().map_err(|_| ConfigError::EnvParse {
                key: "MIGRATE_API_ADDR".to_string(),
                message: "invalid socket address".to_string(),
            })?;
        }

        if let Ok(timeout) = std::env::var("MIGRATE_REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = timeout.parse().map_err(|_| ConfigError::EnvParse {
                key: "MIGRATE_REQUEST_TIMEOUT_SECS".to_string(),
                message: "invalid timeout value".to_string(),
            })?;
        }

        if let Ok(dir) = std::env::var("MIGRATE_TEMP_DIR") {
            self.temp_dir = PathBuf::from(dir);
        }

        if let Ok(level) = std::env::var("MIGRATE_LOG_LEVEL") {
            self.log_level = level;
        }

        if let Ok(format) = std::env::var("MIGRATE_LOG_FORMAT") {
            self.log_format = format;
        }

        Ok(())
    }

    /// Runs field-level validation plus the checks `validator` can't express
    /// as derive attributes (enum-like string fields).
    pub fn validate_config(&self) -> Result<(), ConfigError> {
        self.validate().map_err(|e| ConfigError::Validation(e.to_string()))?;

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ConfigError::Invalid(format!(
                "invalid log level '{}'. valid values: {:?}",
                self.log_level, valid_levels
            )));
        }

        let valid_formats = ["pretty", "json"];
        if !valid_formats.contains(&self.log_format.to_lowercase().as_str()) {
            return Err(ConfigError::Invalid(format!(
                "invalid log format '{}'. valid values: {:?}",
                self.log_format, valid_formats
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_pass_validation() {
        assert!(ApiConfig::default().validate_config().is_ok());
    }

    #[test]
    fn merge_env_overrides_only_set_variables() {
        std::env::set_var("MIGRATE_LOG_LEVEL", "debug");
        std::env::remove_var("MIGRATE_API_ADDR");

        let config = ApiConfig::from_env().unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.addr, ApiConfig::default().addr);

        std::env::remove_var("MIGRATE_LOG_LEVEL");
    }

    #[test]
    fn rejects_unknown_log_level() {
        let mut config = ApiConfig::default();
        config.log_level = "verbose".to_string();
        assert!(config.validate_config().is_err());
    }

    #[test]
    fn rejects_unknown_log_format() {
        let mut config = ApiConfig::default();
        config.log_format = "xml".to_string();
        assert!(config.validate_config().is_err());
    }

    #[test]
    fn rejects_out_of_range_timeout() {
        let mut config = ApiConfig::default();
        config.request_timeout_secs = 0;
        assert!(config.validate_config().is_err());
    }
}
