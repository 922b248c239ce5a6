//! Main application configuration
//!
//! This module defines the primary configuration structures for the
//! tennis-rating service, including file and environment variable loading
//! and validation.

use crate::error::RatingError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub service: ServiceSettings,
}

/// Service-level settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging and metrics
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Interface the HTTP server binds to
    pub host: String,
    /// Port for the rating API, health and metrics endpoints
    pub http_port: u16,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,
    /// Interval for refreshing graph-size gauges
    pub metrics_refresh_interval_seconds: u64,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "tennis-rating".to_string(),
            log_level: "info".to_string(),
            host: "0.0.0.0".to_string(),
            http_port: 8080,
            shutdown_timeout_seconds: 30,
            metrics_refresh_interval_seconds: 30,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file; missing keys fall back to defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        Self::from_toml_str(&contents)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(name) = env::var("SERVICE_NAME") {
            config.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            config.service.log_level = log_level;
        }
        if let Ok(host) = env::var("HTTP_HOST") {
            config.service.host = host;
        }
        if let Ok(port) = env::var("HTTP_PORT") {
            config.service.http_port = port
                .parse()
                .map_err(|_| config_error(format!("Invalid HTTP_PORT value: {}", port)))?;
        }
        if let Ok(timeout) = env::var("SHUTDOWN_TIMEOUT_SECONDS") {
            config.service.shutdown_timeout_seconds = timeout
                .parse()
                .map_err(|_| {
                    config_error(format!("Invalid SHUTDOWN_TIMEOUT_SECONDS value: {}", timeout))
                })?;
        }
        if let Ok(interval) = env::var("METRICS_REFRESH_INTERVAL_SECONDS") {
            config.service.metrics_refresh_interval_seconds =
                interval.parse().map_err(|_| {
                    config_error(format!(
                        "Invalid METRICS_REFRESH_INTERVAL_SECONDS value: {}",
                        interval
                    ))
                })?;
        }

        validate_config(&config)?;
        Ok(config)
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.service.shutdown_timeout_seconds)
    }

    /// Get metrics refresh interval as Duration
    pub fn metrics_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.service.metrics_refresh_interval_seconds)
    }

    /// Socket address string the HTTP server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.service.host, self.service.http_port)
    }
}

fn config_error(message: impl Into<String>) -> anyhow::Error {
    RatingError::ConfigurationError {
        message: message.into(),
    }
    .into()
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => {
            return Err(config_error(format!(
                "Invalid log level: {}",
                config.service.log_level
            )))
        }
    }

    if config.service.name.is_empty() {
        return Err(config_error("Service name cannot be empty"));
    }
    if config.service.host.is_empty() {
        return Err(config_error("HTTP host cannot be empty"));
    }
    if config.service.http_port == 0 {
        return Err(config_error("HTTP port cannot be 0"));
    }

    if config.service.shutdown_timeout_seconds == 0 {
        return Err(config_error("Shutdown timeout must be greater than 0"));
    }
    if config.service.metrics_refresh_interval_seconds == 0 {
        return Err(config_error("Metrics refresh interval must be greater than 0"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
        assert_eq!(config.service.http_port, 8080);
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_from_toml_partial() {
        let config = AppConfig::from_toml_str(
            r#"
            [service]
            http_port = 9000
            log_level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.service.http_port, 9000);
        assert_eq!(config.service.log_level, "debug");
        // Unset keys keep defaults
        assert_eq!(config.service.name, "tennis-rating");
        assert_eq!(config.service.metrics_refresh_interval_seconds, 30);
    }

    #[test]
    fn test_from_toml_empty() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_from_toml_rejects_invalid_values() {
        let result = AppConfig::from_toml_str(
            r#"
            [service]
            log_level = "verbose"
            "#,
        );
        assert!(result.is_err());

        let result = AppConfig::from_toml_str(
            r#"
            [service]
            http_port = "eighty"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_from_file_missing() {
        let result = AppConfig::from_file("/nonexistent/tennis-rating.toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_errors() {
        let mut config = AppConfig::default();
        config.service.http_port = 0;
        assert!(validate_config(&config).is_err());

        let mut config = AppConfig::default();
        config.service.shutdown_timeout_seconds = 0;
        assert!(validate_config(&config).is_err());

        let mut config = AppConfig::default();
        config.service.metrics_refresh_interval_seconds = 0;
        assert!(validate_config(&config).is_err());

        let mut config = AppConfig::default();
        config.service.host = String::new();
        assert!(validate_config(&config).is_err());

        let mut config = AppConfig::default();
        config.service.log_level = "WARN".to_string();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_kind() {
        let mut config = AppConfig::default();
        config.service.http_port = 0;

        let err = validate_config(&config).unwrap_err();
        assert_eq!(
            err.downcast_ref::<RatingError>(),
            Some(&RatingError::ConfigurationError {
                message: "HTTP port cannot be 0".to_string()
            })
        );
    }
}
