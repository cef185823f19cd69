//! Typed settings loaded from `config.ini`.

use std::path::PathBuf;
use std::time::Duration;

use crate::border::DEFAULT_NEAR_BORDER_THRESHOLD_KM;
use crate::cache::{CacheConfig, DEFAULT_CACHE_TTL, DEFAULT_SWEEP_INTERVAL};
use crate::hysteresis::HysteresisConfig;
use crate::location::WatchOptions;
use crate::resolver::{ResolverConfig, DEFAULT_RESOLVE_TIMEOUT};

/// Default maximum accepted fix accuracy radius.
pub const DEFAULT_MIN_ACCURACY_M: f64 = 100.0;

/// Default log file name.
pub const DEFAULT_LOG_FILE: &str = "borderwatch.log";

/// `[detection]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionSettings {
    /// Fixes with a larger accuracy radius are rejected.
    pub min_accuracy_m: f64,
    /// Edge distance under which a single bbox match is not trusted.
    pub near_border_km: f64,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            min_accuracy_m: DEFAULT_MIN_ACCURACY_M,
            near_border_km: DEFAULT_NEAR_BORDER_THRESHOLD_KM,
        }
    }
}

/// `[cache]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheSettings {
    pub directory: PathBuf,
    pub ttl: Duration,
    pub sweep_interval: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            directory: super::file::config_directory().join("cache"),
            ttl: DEFAULT_CACHE_TTL,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

impl CacheSettings {
    /// Runtime cache settings (the directory is only needed to open the store).
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig::default()
            .with_ttl(self.ttl)
            .with_sweep_interval(self.sweep_interval)
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    pub directory: PathBuf,
    pub file: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            directory: super::file::config_directory().join("logs"),
            file: DEFAULT_LOG_FILE.to_string(),
        }
    }
}

/// Whole configuration file.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    pub detection: DetectionSettings,
    pub hysteresis: HysteresisConfig,
    pub cache: CacheSettings,
    pub resolver: ResolverConfig,
    pub location: WatchOptions,
    pub logging: LoggingSettings,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            detection: DetectionSettings::default(),
            hysteresis: HysteresisConfig::default(),
            cache: CacheSettings::default(),
            resolver: ResolverConfig {
                timeout: DEFAULT_RESOLVE_TIMEOUT,
                ..ResolverConfig::default()
            },
            location: WatchOptions::default(),
            logging: LoggingSettings::default(),
        }
    }
}
