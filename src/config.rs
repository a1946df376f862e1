//! Monitor configuration — all tunables as TOML values.
//!
//! Every threshold and window the pipeline uses is a field here, with
//! defaults matching the original deployment (5 s cadence, 28 °C alert
//! threshold, 12-sample window). A missing or unparsable config file is
//! not fatal: the loader warns and falls back to defaults.
//!
//! ## Loading order
//!
//! 1. `$THERMWATCH_CONFIG` environment variable (path to a TOML file)
//! 2. `./thermwatch.toml` in the current working directory
//! 3. Built-in defaults

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::error::ConfigError;

/// Root configuration for a monitor deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Human-readable sensor name, used in logs only.
    pub sensor_name: String,

    /// Seconds between readings.
    pub interval_secs: u64,

    /// Alert threshold in degrees Celsius for the threshold stage.
    pub threshold: f64,

    /// Sliding window size in samples (60 s at the default cadence).
    pub window_size: usize,

    /// Samples looked back by the rate-of-change stage (30 s at the
    /// default cadence).
    pub rate_window: usize,

    /// Minimum rise in degrees over the rate window that triggers the
    /// rapid-increase signal.
    pub rate_delta: f64,

    /// Lower bound of the simulated probe's value range.
    pub min_value: f64,

    /// Upper bound of the simulated probe's value range.
    pub max_value: f64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            sensor_name: "greenhouse".to_string(),
            interval_secs: 5,
            threshold: 28.0,
            window_size: 12,
            rate_window: 6,
            rate_delta: 10.0,
            min_value: 8.0,
            max_value: 34.0,
        }
    }
}

impl MonitorConfig {
    /// Load configuration using the standard search order.
    pub fn load() -> Self {
        if let Ok(path) = std::env::var("THERMWATCH_CONFIG") {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), sensor = %config.sensor_name,
                              "Loaded config from THERMWATCH_CONFIG");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e,
                              "Failed to load config from THERMWATCH_CONFIG, falling back");
                    }
                }
            } else {
                warn!(path = %path, "THERMWATCH_CONFIG points to non-existent file, falling back");
            }
        }

        let local = PathBuf::from("thermwatch.toml");
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!(sensor = %config.sensor_name, "Loaded config from ./thermwatch.toml");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./thermwatch.toml, using defaults");
                }
            }
        }

        info!("No thermwatch.toml found — using built-in defaults");
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_secs == 0 {
            return Err(ConfigError::Invalid("interval_secs must be > 0".into()));
        }
        if self.window_size == 0 {
            return Err(ConfigError::Invalid("window_size must be > 0".into()));
        }
        if self.rate_window == 0 {
            return Err(ConfigError::Invalid("rate_window must be > 0".into()));
        }
        if self.rate_window > self.window_size {
            return Err(ConfigError::Invalid(format!(
                "rate_window ({}) must not exceed window_size ({})",
                self.rate_window, self.window_size
            )));
        }
        if self.min_value >= self.max_value {
            return Err(ConfigError::Invalid(format!(
                "min_value ({}) must be below max_value ({})",
                self.min_value, self.max_value
            )));
        }
        Ok(())
    }

    /// Production interval as a [`Duration`].
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_original_deployment() {
        let config = MonitorConfig::default();
        assert_eq!(config.interval_secs, 5);
        assert_eq!(config.threshold, 28.0);
        assert_eq!(config.window_size, 12);
        assert_eq!(config.rate_window, 6);
        assert_eq!(config.rate_delta, 10.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config: MonitorConfig =
            toml::from_str("threshold = 30.5\ninterval_secs = 1").unwrap();
        assert_eq!(config.threshold, 30.5);
        assert_eq!(config.interval_secs, 1);
        assert_eq!(config.window_size, 12);
        assert_eq!(config.sensor_name, "greenhouse");
    }

    #[test]
    fn rejects_zero_interval() {
        let config = MonitorConfig {
            interval_secs: 0,
            ..MonitorConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_rate_window_larger_than_window() {
        let config = MonitorConfig {
            rate_window: 13,
            ..MonitorConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_inverted_value_range() {
        let config = MonitorConfig {
            min_value: 40.0,
            max_value: 8.0,
            ..MonitorConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
