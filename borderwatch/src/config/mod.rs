//! Configuration.
//!
//! [`DetectorConfig`] is the runtime configuration consumed by the
//! detector. [`ConfigFile`] is the user-editable INI file it is usually
//! built from.

mod file;
mod parser;
mod settings;
mod writer;

pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{
    CacheSettings, ConfigFile, DetectionSettings, LoggingSettings, DEFAULT_LOG_FILE,
    DEFAULT_MIN_ACCURACY_M,
};

use std::time::Duration;

use crate::border::DEFAULT_NEAR_BORDER_THRESHOLD_KM;
use crate::hysteresis::HysteresisConfig;
use crate::resolver::DEFAULT_RESOLVE_TIMEOUT;

/// Per-fix pipeline configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorConfig {
    /// Fixes with a larger accuracy radius are rejected.
    pub min_accuracy_m: f64,
    /// Upper bound on one precise resolution.
    pub resolve_timeout: Duration,
    /// Border proximity threshold for single bbox matches.
    pub near_border_km: f64,
    pub hysteresis: HysteresisConfig,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_accuracy_m: DEFAULT_MIN_ACCURACY_M,
            resolve_timeout: DEFAULT_RESOLVE_TIMEOUT,
            near_border_km: DEFAULT_NEAR_BORDER_THRESHOLD_KM,
            hysteresis: HysteresisConfig::default(),
        }
    }
}

impl DetectorConfig {
    pub fn with_min_accuracy_m(mut self, min_accuracy_m: f64) -> Self {
        self.min_accuracy_m = min_accuracy_m;
        self
    }

    pub fn with_resolve_timeout(mut self, timeout: Duration) -> Self {
        self.resolve_timeout = timeout;
        self
    }

    pub fn with_near_border_km(mut self, km: f64) -> Self {
        self.near_border_km = km;
        self
    }

    pub fn with_hysteresis(mut self, hysteresis: HysteresisConfig) -> Self {
        self.hysteresis = hysteresis;
        self
    }
}

impl From<&ConfigFile> for DetectorConfig {
    fn from(file: &ConfigFile) -> Self {
        Self {
            min_accuracy_m: file.detection.min_accuracy_m,
            resolve_timeout: file.resolver.timeout,
            near_border_km: file.detection.near_border_km,
            hysteresis: file.hysteresis.clone(),
        }
    }
}
