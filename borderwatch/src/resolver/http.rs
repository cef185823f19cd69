//! HTTP resolver using reqwest.
//!
//! Request:
//!
//! ```text
//! POST {endpoint}
//! {"lat": -33.45, "lng": -70.66, "withRegion": true}
//! ```
//!
//! Response (either field spelling is accepted):
//!
//! ```text
//! {"country": "CL", "region": "RM", "cached": false}
//! {"country_iso": "CL", "region_code": "RM", "cached": true}
//! {"offshore": true}
//! {"error": "Invalid latitude: must be between -90 and 90"}
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{PreciseResolver, Resolution, ResolverError};
use crate::country::CountryCode;
use crate::store::BoxFuture;

#[derive(Debug, Serialize)]
struct ResolveRequest {
    lat: f64,
    lng: f64,
    #[serde(rename = "withRegion")]
    with_region: bool,
}

#[derive(Debug, Deserialize)]
struct ResolveResponse {
    #[serde(default, alias = "country_iso")]
    country: Option<String>,
    #[serde(default, alias = "region_code")]
    region: Option<String>,
    #[serde(default)]
    cached: bool,
    #[serde(default)]
    offshore: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Resolver backed by a remote lookup service.
pub struct HttpResolver {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpResolver {
    /// Create a resolver for `endpoint` with a per-request timeout.
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ResolverError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ResolverError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl PreciseResolver for HttpResolver {
    fn resolve(&self, lat: f64, lng: f64) -> BoxFuture<'_, Result<Resolution, ResolverError>> {
        Box::pin(async move {
            let mut request = self.client.post(&self.endpoint).json(&ResolveRequest {
                lat,
                lng,
                with_region: true,
            });
            if let Some(key) = &self.api_key {
                request = request.bearer_auth(key).header("apikey", key);
            }

            let response = request.send().await.map_err(map_transport_error)?;
            let status = response.status();
            let body = response.text().await.map_err(map_transport_error)?;

            if !status.is_success() {
                return Err(ResolverError::Http {
                    status: status.as_u16(),
                    message: error_message(&body).unwrap_or_else(|| truncate(&body, 200)),
                });
            }

            let resolution = parse_response(&body)?;
            debug!(
                lat,
                lng,
                country = %resolution.country,
                region = ?resolution.region,
                cached = resolution.cached,
                "Precise resolution succeeded"
            );
            Ok(resolution)
        })
    }
}

/// Parse a successful response body.
pub fn parse_response(body: &str) -> Result<Resolution, ResolverError> {
    let response: ResolveResponse = serde_json::from_str(body)
        .map_err(|e| ResolverError::InvalidResponse(e.to_string()))?;

    if let Some(message) = response.error {
        return Err(ResolverError::InvalidResponse(message));
    }
    if response.offshore {
        return Err(ResolverError::Unclassified);
    }

    let country = match response.country.as_deref().map(str::trim) {
        None | Some("") => return Err(ResolverError::Unclassified),
        Some(code) => code
            .parse::<CountryCode>()
            .map_err(|e| ResolverError::InvalidResponse(e.to_string()))?,
    };
    let region = response
        .region
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty());

    Ok(Resolution {
        country,
        region,
        cached: response.cached,
    })
}

fn map_transport_error(e: reqwest::Error) -> ResolverError {
    if e.is_timeout() {
        ResolverError::Timeout
    } else {
        ResolverError::Network(e.to_string())
    }
}

fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ResolveResponse>(body)
        .ok()
        .and_then(|r| r.error)
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}
