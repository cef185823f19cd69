//! Decision values returned by `should_change_country`.

use std::fmt;

use crate::country::CountryCode;

/// Country (and region) to switch to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryChange {
    pub country: CountryCode,
    pub region: Option<String>,
}

/// Why a decision came out the way it did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecisionReason {
    BufferNotFull { have: usize, need: usize },
    NoMajority,
    InitialDetection,
    SameCountry,
    InsufficientMatches { count: usize, required: usize },
    DwellTimeNotMet { elapsed_ms: i64, required_ms: i64 },
    MajorityWithDwell { count: usize, window: usize },
}

impl fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecisionReason::BufferNotFull { have, need } => {
                write!(f, "Buffer not full ({}/{})", have, need)
            }
            DecisionReason::NoMajority => write!(f, "No majority"),
            DecisionReason::InitialDetection => write!(f, "Initial country detection"),
            DecisionReason::SameCountry => write!(f, "Same country"),
            DecisionReason::InsufficientMatches { count, required } => {
                write!(f, "Insufficient matches ({}/{})", count, required)
            }
            DecisionReason::DwellTimeNotMet {
                elapsed_ms,
                required_ms,
            } => write!(
                f,
                "Dwell time not met ({}s/{}s)",
                elapsed_ms / 1000,
                required_ms / 1000
            ),
            DecisionReason::MajorityWithDwell { count, window } => {
                write!(f, "Majority vote ({}/{}) + dwell time met", count, window)
            }
        }
    }
}

/// Outcome of one hysteresis evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeDecision {
    /// `Some` when the stable country should change.
    pub change: Option<CountryChange>,
    pub reason: DecisionReason,
}

impl ChangeDecision {
    pub(crate) fn hold(reason: DecisionReason) -> Self {
        Self {
            change: None,
            reason,
        }
    }

    pub(crate) fn change(
        country: CountryCode,
        region: Option<String>,
        reason: DecisionReason,
    ) -> Self {
        Self {
            change: Some(CountryChange { country, region }),
            reason,
        }
    }

    pub fn should_change(&self) -> bool {
        self.change.is_some()
    }
}
