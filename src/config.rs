//! Runtime tuning for the monitor core
//!
//! This module provides runtime configuration loading from JSON files,
//! enabling timing and threshold tuning without recompilation. Sampling
//! cadence, smoothing depth, and calibration capture lengths can be
//! adjusted via the config file for experimentation.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Complete monitor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    pub sampling: SamplingConfig,
    pub classifier: ClassifierConfig,
    pub calibration: CalibrationConfig,
}

/// Sampling loop timing parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// Interval between frame samples in milliseconds
    pub tick_interval_ms: u64,
    /// Number of recent detections averaged by the smoothing filter
    pub smoothing_window: usize,
    /// Emit a diagnostic observation every N ticks
    pub heartbeat_every_ticks: u64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 100,
            smoothing_window: 5,
            heartbeat_every_ticks: 10,
        }
    }
}

/// Posture classifier parameters not exposed as user settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Consecutive missed detections before the state becomes Away
    pub away_after_misses: u32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            away_after_misses: 3,
        }
    }
}

/// Calibration procedure configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationConfig {
    /// Number of smoothed measurements to capture per posture phase
    pub samples_per_phase: usize,
    /// Minimum distance required between the good and bad thresholds
    pub min_threshold_separation: f64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            // 30 samples at the default 100 ms tick is about 3 seconds of
            // holding each pose
            samples_per_phase: 30,
            min_threshold_separation: 0.02,
        }
    }
}

impl Default for MonitorConfig {
    /// Default configuration values (fallback if config file not found)
    fn default() -> Self {
        Self {
            sampling: SamplingConfig::default(),
            classifier: ClassifierConfig::default(),
            calibration: CalibrationConfig::default(),
        }
    }
}

impl MonitorConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// Loaded configuration, or the default config if the file is missing
    /// or invalid.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Load configuration from the conventional location
    pub fn load() -> Self {
        Self::load_from_file("postured_config.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MonitorConfig::default();
        assert_eq!(config.sampling.tick_interval_ms, 100);
        assert_eq!(config.sampling.smoothing_window, 5);
        assert_eq!(config.sampling.heartbeat_every_ticks, 10);
        assert_eq!(config.classifier.away_after_misses, 3);
        assert_eq!(config.calibration.samples_per_phase, 30);
        assert_eq!(config.calibration.min_threshold_separation, 0.02);
    }

    #[test]
    fn test_json_roundtrip() {
        let config = MonitorConfig::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: MonitorConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(
            parsed.sampling.tick_interval_ms,
            config.sampling.tick_interval_ms
        );
        assert_eq!(
            parsed.calibration.samples_per_phase,
            config.calibration.samples_per_phase
        );
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config = MonitorConfig::load_from_file("/nonexistent/monitor_config.json");
        assert_eq!(config.sampling.tick_interval_ms, 100);
        assert_eq!(config.classifier.away_after_misses, 3);
    }
}
