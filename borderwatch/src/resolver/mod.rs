//! Precise position resolution.
//!
//! The bounding-box index can only say "probably". When a position is
//! ambiguous the detector asks a [`PreciseResolver`], typically a remote
//! point-in-polygon service, for an authoritative answer.
//!
//! The trait is a single-operation capability so the detector can be driven
//! by the HTTP client in production and by scripted fakes in tests.

mod http;

pub use http::{parse_response, HttpResolver};

use std::time::Duration;

use thiserror::Error;

use crate::country::CountryCode;
use crate::store::BoxFuture;

/// Default upper bound on a single resolution.
pub const DEFAULT_RESOLVE_TIMEOUT: Duration = Duration::from_secs(5);

/// Authoritative classification of a position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub country: CountryCode,
    pub region: Option<String>,
    /// Whether the service answered from its own cache.
    pub cached: bool,
}

/// Resolution failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolverError {
    #[error("Precise resolution timed out")]
    Timeout,

    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The service answered, but the position is not in any country
    /// (open sea, international waters).
    #[error("Position is not inside any country")]
    Unclassified,

    #[error("Precise resolution is not configured")]
    Disabled,
}

/// Resolves a position to a country and optional region.
pub trait PreciseResolver: Send + Sync {
    fn resolve(&self, lat: f64, lng: f64) -> BoxFuture<'_, Result<Resolution, ResolverError>>;
}

/// Resolver configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolverConfig {
    /// Service URL. `None` disables precise resolution.
    pub endpoint: Option<String>,
    /// Sent as a bearer token and `apikey` header when set.
    pub api_key: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            timeout: DEFAULT_RESOLVE_TIMEOUT,
        }
    }
}

/// Resolver that always fails with [`ResolverError::Disabled`].
///
/// Used when no endpoint is configured: ambiguous positions are dropped and
/// only cache hits and cheap classifications reach the hysteresis buffer.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledResolver;

impl PreciseResolver for DisabledResolver {
    fn resolve(&self, _lat: f64, _lng: f64) -> BoxFuture<'_, Result<Resolution, ResolverError>> {
        Box::pin(async { Err(ResolverError::Disabled) })
    }
}

/// Build the resolver described by `config`.
pub fn from_config(config: &ResolverConfig) -> Result<Box<dyn PreciseResolver>, ResolverError> {
    match &config.endpoint {
        Some(endpoint) => Ok(Box::new(HttpResolver::new(
            endpoint,
            config.api_key.clone(),
            config.timeout,
        )?)),
        None => Ok(Box::new(DisabledResolver)),
    }
}
