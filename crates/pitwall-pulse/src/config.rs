//! Pulse configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use pitwall_estimators::{LapPaceConfig, PitLapConfig};
use pitwall_pitlane::CalibratorConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_CONFIG_YAML: &str = include_str!("default_config.yaml");

const MAX_TICK_RATE_HZ: f64 = 1000.0;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Tick rate must be within (0, 1000] Hz, got {0}")]
    InvalidTickRate(f64),

    #[error("History window must hold at least one sample")]
    EmptyHistoryWindow,

    #[error("Outlier threshold must be positive and finite, got {0}")]
    InvalidOutlierThreshold(f64),

    #[error("Pit entry wrap guard must be within [0, 1), got {0}")]
    InvalidWrapGuard(f64),

    #[error("Maximum pit stop duration must be positive and finite, got {0}")]
    InvalidMaxPitStop(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PulseConfig {
    pub tick_rate_hz: f64,
    pub history_window: usize,
    pub outlier_threshold: f64,
    pub pit_entry_wrap_guard: f64,
    pub max_pit_stop_secs: f64,
    pub terminal_session_state: i32,
    pub pit_lane_data_file: Option<PathBuf>,
}

impl Default for PulseConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 10.0,
            history_window: pitwall_estimators::DEFAULT_HISTORY_WINDOW,
            outlier_threshold: pitwall_estimators::DEFAULT_OUTLIER_THRESHOLD,
            pit_entry_wrap_guard: pitwall_pitlane::DEFAULT_PIT_ENTRY_WRAP_GUARD,
            max_pit_stop_secs: pitwall_estimators::DEFAULT_MAX_PIT_STOP_SECS,
            terminal_session_state: pitwall_telemetry::SessionState::TERMINAL_CODE,
            pit_lane_data_file: None,
        }
    }
}

impl PulseConfig {
    /// The embedded default configuration.
    pub fn embedded() -> Result<Self, serde_yaml::Error> {
        Self::from_yaml_str(DEFAULT_CONFIG_YAML)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Read, parse and validate a YAML file. Keys it omits take their defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read pulse config: {path:?}"))?;
        let config = Self::from_yaml_str(&content)
            .with_context(|| format!("Failed to parse pulse config: {path:?}"))?;
        config
            .validate()
            .with_context(|| format!("Invalid pulse config: {path:?}"))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.tick_rate_hz.is_finite()
            || self.tick_rate_hz <= 0.0
            || self.tick_rate_hz > MAX_TICK_RATE_HZ
        {
            return Err(ConfigError::InvalidTickRate(self.tick_rate_hz));
        }
        if self.history_window == 0 {
            return Err(ConfigError::EmptyHistoryWindow);
        }
        if !self.outlier_threshold.is_finite() || self.outlier_threshold <= 0.0 {
            return Err(ConfigError::InvalidOutlierThreshold(self.outlier_threshold));
        }
        if !(0.0..1.0).contains(&self.pit_entry_wrap_guard) {
            return Err(ConfigError::InvalidWrapGuard(self.pit_entry_wrap_guard));
        }
        if !self.max_pit_stop_secs.is_finite() || self.max_pit_stop_secs <= 0.0 {
            return Err(ConfigError::InvalidMaxPitStop(self.max_pit_stop_secs));
        }
        Ok(())
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_rate_hz)
    }

    pub fn lap_pace(&self) -> LapPaceConfig {
        LapPaceConfig {
            history_window: self.history_window,
            outlier_threshold: self.outlier_threshold,
        }
    }

    pub fn pit_lap(&self) -> PitLapConfig {
        PitLapConfig {
            max_pit_stop_secs: self.max_pit_stop_secs,
            terminal_session_state: self.terminal_session_state,
        }
    }

    pub fn calibrator(&self) -> CalibratorConfig {
        CalibratorConfig {
            wrap_guard: self.pit_entry_wrap_guard,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn test_embedded_matches_default() -> TestResult {
        let embedded = PulseConfig::embedded()?;
        assert_eq!(embedded, PulseConfig::default());
        embedded.validate()?;
        assert_eq!(embedded.tick_period(), Duration::from_millis(100));
        Ok(())
    }

    #[test]
    fn test_partial_yaml_uses_defaults() -> TestResult {
        let config = PulseConfig::from_yaml_str("tick_rate_hz: 20.0\npit_entry_wrap_guard: 0.1\n")?;

        assert_eq!(config.tick_period(), Duration::from_millis(50));
        assert_eq!(config.history_window, 5);
        assert!((config.calibrator().wrap_guard - 0.1).abs() < f64::EPSILON);
        Ok(())
    }

    #[test]
    fn test_validation() {
        let bad_rate = PulseConfig {
            tick_rate_hz: 0.0,
            ..PulseConfig::default()
        };
        assert_eq!(bad_rate.validate(), Err(ConfigError::InvalidTickRate(0.0)));

        let bad_window = PulseConfig {
            history_window: 0,
            ..PulseConfig::default()
        };
        assert_eq!(bad_window.validate(), Err(ConfigError::EmptyHistoryWindow));

        let bad_guard = PulseConfig {
            pit_entry_wrap_guard: 1.0,
            ..PulseConfig::default()
        };
        assert_eq!(bad_guard.validate(), Err(ConfigError::InvalidWrapGuard(1.0)));

        let bad_threshold = PulseConfig {
            outlier_threshold: f64::NAN,
            ..PulseConfig::default()
        };
        assert!(matches!(
            bad_threshold.validate(),
            Err(ConfigError::InvalidOutlierThreshold(_))
        ));
    }

    #[test]
    fn test_load_reports_path() -> TestResult {
        let dir = tempfile::TempDir::new()?;
        let path = dir.path().join("pulse.yaml");
        std::fs::write(&path, "tick_rate_hz: -1.0\n")?;

        let err = match PulseConfig::load(&path) {
            Ok(_) => return Err("invalid config accepted".into()),
            Err(e) => e,
        };
        assert!(err.to_string().contains("pulse.yaml"));
        assert!(err.chain().any(|cause| cause.to_string().contains("Tick rate")));

        std::fs::write(&path, "history_window: 3\n")?;
        assert_eq!(PulseConfig::load(&path)?.history_window, 3);
        Ok(())
    }
}
