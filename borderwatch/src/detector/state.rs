//! Host-facing detection state.

use std::fmt;

use crate::country::CountryCode;
use crate::hysteresis::Reading;

/// Diagnostics about the most recent fix.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DebugInfo {
    pub last_reading: Option<Reading>,
    pub buffer_size: usize,
    pub cache_hit: bool,
    pub used_precise: bool,
}

/// Snapshot published after every processed fix.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectionState {
    /// Stable (debounced) country.
    pub current_country: Option<CountryCode>,
    pub current_region: Option<String>,
    /// A fix is being processed.
    pub is_detecting: bool,
    /// Message for the last failed fix, cleared by the next good one.
    pub error: Option<String>,
    /// Accuracy radius of the last fix, in meters.
    pub accuracy: Option<f64>,
    pub is_near_border: bool,
    pub debug: DebugInfo,
}

/// How a fix was classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassificationSource {
    Cache,
    BoundingBox,
    Precise,
}

impl fmt::Display for ClassificationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassificationSource::Cache => write!(f, "cache"),
            ClassificationSource::BoundingBox => write!(f, "bbox"),
            ClassificationSource::Precise => write!(f, "precise"),
        }
    }
}
