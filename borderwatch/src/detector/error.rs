//! Detector errors.

use std::time::Duration;

use thiserror::Error;

use crate::coord::CoordError;
use crate::location::LocationError;
use crate::resolver::ResolverError;

/// Errors raised while processing fixes.
///
/// Only `PermissionDenied` ends a session; everything else drops the
/// current fix and waits for the next one.
#[derive(Debug, Error)]
pub enum DetectionError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Low accuracy: {accuracy_m:.0}m")]
    LowAccuracy { accuracy_m: f64, limit_m: f64 },

    #[error("Invalid position: {0}")]
    InvalidPosition(#[from] CoordError),

    #[error("Precise resolution timed out after {}s", .0.as_secs_f64())]
    PreciseResolutionTimeout(Duration),

    #[error("Precise resolution failed: {0}")]
    PreciseResolution(#[from] ResolverError),

    #[error("Location error: {0}")]
    Location(LocationError),
}

impl DetectionError {
    /// Whether the session must stop.
    pub fn is_fatal(&self) -> bool {
        matches!(self, DetectionError::PermissionDenied)
    }
}

impl From<LocationError> for DetectionError {
    fn from(e: LocationError) -> Self {
        match e {
            LocationError::PermissionDenied => DetectionError::PermissionDenied,
            other => DetectionError::Location(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_low_accuracy_message() {
        let err = DetectionError::LowAccuracy {
            accuracy_m: 150.4,
            limit_m: 100.0,
        };
        assert_eq!(err.to_string(), "Low accuracy: 150m");
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_permission_denied_is_fatal() {
        let err = DetectionError::from(LocationError::PermissionDenied);
        assert!(matches!(err, DetectionError::PermissionDenied));
        assert!(err.is_fatal());
        assert_eq!(err.to_string(), "Location permission denied");
    }

    #[test]
    fn test_timeout_message() {
        let err = DetectionError::PreciseResolutionTimeout(Duration::from_secs(5));
        assert_eq!(err.to_string(), "Precise resolution timed out after 5s");
    }
}
