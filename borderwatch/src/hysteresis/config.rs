//! Hysteresis tuning parameters.

use std::time::Duration;

use thiserror::Error;

/// Default number of readings considered per decision.
pub const DEFAULT_WINDOW_SIZE: usize = 4;

/// Default quorum for a change away from the current country.
pub const DEFAULT_MIN_MATCHES: usize = 3;

/// Default minimum time between two applied changes.
pub const DEFAULT_DWELL_TIME: Duration = Duration::from_secs(60);

/// Default movement required before a new reading is buffered.
pub const DEFAULT_MIN_DISTANCE_M: f64 = 300.0;

/// Invalid hysteresis parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HysteresisConfigError {
    #[error("window_size must be at least 1")]
    EmptyWindow,

    #[error("min_matches must be between 1 and window_size ({window_size}), got {min_matches}")]
    MinMatchesOutOfRange {
        min_matches: usize,
        window_size: usize,
    },

    #[error("min_distance_m must be a finite, non-negative number, got {0}")]
    InvalidMinDistance(f64),
}

impl HysteresisConfigError {
    /// Name of the offending setting.
    pub fn key(&self) -> &'static str {
        match self {
            HysteresisConfigError::EmptyWindow => "window_size",
            HysteresisConfigError::MinMatchesOutOfRange { .. } => "min_matches",
            HysteresisConfigError::InvalidMinDistance(_) => "min_distance_m",
        }
    }

    /// The rejected value, as written in a config file.
    pub fn value(&self) -> String {
        match self {
            HysteresisConfigError::EmptyWindow => "0".to_string(),
            HysteresisConfigError::MinMatchesOutOfRange { min_matches, .. } => {
                min_matches.to_string()
            }
            HysteresisConfigError::InvalidMinDistance(d) => d.to_string(),
        }
    }
}

/// Hysteresis configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct HysteresisConfig {
    pub window_size: usize,
    pub min_matches: usize,
    pub dwell_time: Duration,
    pub min_distance_m: f64,
}

impl Default for HysteresisConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            min_matches: DEFAULT_MIN_MATCHES,
            dwell_time: DEFAULT_DWELL_TIME,
            min_distance_m: DEFAULT_MIN_DISTANCE_M,
        }
    }
}

impl HysteresisConfig {
    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    pub fn with_min_matches(mut self, min_matches: usize) -> Self {
        self.min_matches = min_matches;
        self
    }

    pub fn with_dwell_time(mut self, dwell_time: Duration) -> Self {
        self.dwell_time = dwell_time;
        self
    }

    pub fn with_min_distance_m(mut self, min_distance_m: f64) -> Self {
        self.min_distance_m = min_distance_m;
        self
    }

    /// Check parameter consistency.
    pub fn validate(&self) -> Result<(), HysteresisConfigError> {
        if self.window_size == 0 {
            return Err(HysteresisConfigError::EmptyWindow);
        }
        if self.min_matches == 0 || self.min_matches > self.window_size {
            return Err(HysteresisConfigError::MinMatchesOutOfRange {
                min_matches: self.min_matches,
                window_size: self.window_size,
            });
        }
        if !self.min_distance_m.is_finite() || self.min_distance_m < 0.0 {
            return Err(HysteresisConfigError::InvalidMinDistance(self.min_distance_m));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HysteresisConfig::default();
        assert_eq!(config.window_size, 4);
        assert_eq!(config.min_matches, 3);
        assert_eq!(config.dwell_time, Duration::from_secs(60));
        assert_eq!(config.min_distance_m, 300.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert_eq!(
            HysteresisConfig::default().with_window_size(0).validate(),
            Err(HysteresisConfigError::EmptyWindow)
        );
        assert!(matches!(
            HysteresisConfig::default().with_min_matches(5).validate(),
            Err(HysteresisConfigError::MinMatchesOutOfRange { .. })
        ));
        assert!(matches!(
            HysteresisConfig::default().with_min_distance_m(-1.0).validate(),
            Err(HysteresisConfigError::InvalidMinDistance(_))
        ));
    }

    #[test]
    fn test_error_names_offending_key() {
        let err = HysteresisConfig::default()
            .with_window_size(0)
            .validate()
            .unwrap_err();
        assert_eq!((err.key(), err.value().as_str()), ("window_size", "0"));

        let err = HysteresisConfig::default()
            .with_min_matches(7)
            .validate()
            .unwrap_err();
        assert_eq!((err.key(), err.value().as_str()), ("min_matches", "7"));

        let err = HysteresisConfig::default()
            .with_min_distance_m(f64::NAN)
            .validate()
            .unwrap_err();
        assert_eq!((err.key(), err.value().as_str()), ("min_distance_m", "NaN"));
    }
}
