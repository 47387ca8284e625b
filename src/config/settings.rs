//! Configuration settings and validation.

use serde::{Deserialize, Serialize};

use super::MonitorConfig;
use crate::{Error, Result};

/// Upper bound on the periodic report interval (one day).
const MAX_REPORT_INTERVAL_SECS: u64 = 86_400;

/// Main configuration for the codepulse service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines.
    pub log_json: bool,

    /// Seconds between periodic analytics report summaries.
    pub report_interval_secs: u64,

    /// Directory monitor settings.
    pub monitor: MonitorConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_json: false,
            report_interval_secs: 30,
            monitor: MonitorConfig::default(),
        }
    }
}

impl Config {
    /// Create a new configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(Error::config(format!(
                "invalid log level '{}', must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            )));
        }

        if self.report_interval_secs == 0 {
            return Err(Error::config("report_interval_secs cannot be 0"));
        }

        if self.report_interval_secs > MAX_REPORT_INTERVAL_SECS {
            return Err(Error::config(format!(
                "report_interval_secs cannot exceed {MAX_REPORT_INTERVAL_SECS}"
            )));
        }

        self.monitor.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.report_interval_secs, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_new() {
        let config = Config::new();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let config = Config {
            log_level: "invalid".to_string(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log level"));
    }

    #[test]
    fn test_validate_log_level_case_insensitive() {
        let config = Config {
            log_level: "DEBUG".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_report_interval() {
        let config = Config {
            report_interval_secs: 0,
            ..Default::default()
        };
        assert!(config
            .validate()
            .unwrap_err()
            .to_string()
            .contains("report_interval_secs"));

        let config = Config {
            report_interval_secs: 100_000,
            ..Default::default()
        };
        assert!(config.validate().unwrap_err().to_string().contains("86400"));
    }

    #[test]
    fn test_validate_propagates_monitor_errors() {
        let config = Config {
            monitor: MonitorConfig {
                roots: Vec::new(),
                ..Default::default()
            },
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
