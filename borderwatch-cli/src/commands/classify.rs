//! Classify command - run one position through the classification tiers.

use std::sync::Arc;

use clap::Args;
use console::style;

use borderwatch::bbox::BBoxIndex;
use borderwatch::border::BorderPolicy;
use borderwatch::cache::{cache_key, CacheValue, SpatialCache, CACHE_GEOHASH_PRECISION};
use borderwatch::coord::{geohash_encode, GeoPoint};
use borderwatch::resolver::ResolverError;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the classify command.
#[derive(Debug, Args)]
pub struct ClassifyArgs {
    /// Latitude in decimal degrees
    #[arg(long, allow_negative_numbers = true)]
    pub lat: f64,

    /// Longitude in decimal degrees
    #[arg(long, allow_negative_numbers = true)]
    pub lng: f64,

    /// Always ask the precise resolver, even on a cache hit or a clear bbox match
    #[arg(long)]
    pub precise: bool,

    /// Don't write the result to the cache
    #[arg(long)]
    pub no_cache_write: bool,
}

/// Run the classify command.
pub fn run(
    config_path: Option<&std::path::Path>,
    verbose: bool,
    args: ClassifyArgs,
) -> Result<(), CliError> {
    GeoPoint::try_new(args.lat, args.lng).map_err(|e| CliError::InvalidInput(e.to_string()))?;

    let runner = CliRunner::new(config_path, verbose)?;
    runner.log_startup("classify");
    runner.block_on(classify(&runner, &args))
}

async fn classify(runner: &CliRunner, args: &ClassifyArgs) -> Result<(), CliError> {
    let (lat, lng) = (args.lat, args.lng);
    let detector_config = runner.detector_config();
    let policy = BorderPolicy::new(Arc::new(BBoxIndex::builtin()))
        .with_threshold_km(detector_config.near_border_km);

    let geohash = geohash_encode(lat, lng, CACHE_GEOHASH_PRECISION)
        .map_err(|e| CliError::InvalidInput(e.to_string()))?;
    let key = cache_key(lat, lng).map_err(|e| CliError::InvalidInput(e.to_string()))?;

    println!("Position:   {}", GeoPoint::new(lat, lng));
    println!("Geohash:    {} (key {})", geohash, key);

    let candidates = policy.index().candidates(lat, lng);
    if candidates.is_empty() {
        println!("Candidates: {}", style("none").dim());
    } else {
        println!("Candidates:");
        for country in &candidates {
            let edge = policy
                .index()
                .distance_to_edge_km(lat, lng, *country)
                .unwrap_or(0.0);
            println!("  {}  {:>8.1} km to bbox edge", country, edge);
        }
    }

    let near = policy.near_border_countries(lat, lng);
    if !near.is_empty() {
        let list: Vec<String> = near.iter().map(|c| c.to_string()).collect();
        println!(
            "Near border: {} (within {} km)",
            style(list.join(", ")).yellow(),
            policy.threshold_km()
        );
    }
    println!();

    let cache = runner.open_cache().await?;
    if let Some(value) = cached_value(&cache, lat, lng, args.precise).await {
        print_result(&value, "cache");
        return Ok(());
    }

    let needs_precise = policy.needs_precise_resolution(lat, lng, &candidates);
    let value = match candidates.as_slice() {
        [only] if !needs_precise && !args.precise => {
            let value = CacheValue::new(*only, None);
            print_result(&value, "bbox");
            value
        }
        _ => {
            let resolver = runner.resolver()?;
            let timeout = detector_config.resolve_timeout;
            let resolution = tokio::time::timeout(timeout, resolver.resolve(lat, lng))
                .await
                .map_err(|_| CliError::Resolver(ResolverError::Timeout))??;
            let value = CacheValue::new(resolution.country, resolution.region);
            print_result(
                &value,
                if resolution.cached {
                    "precise, server cache"
                } else {
                    "precise"
                },
            );
            value
        }
    };

    if !args.no_cache_write {
        cache.set(lat, lng, value).await;
    }
    Ok(())
}

/// Cache lookup for the classify command.
///
/// Unreadable or corrupt entries count as a miss; `precise` skips the cache.
async fn cached_value(
    cache: &SpatialCache,
    lat: f64,
    lng: f64,
    precise: bool,
) -> Option<CacheValue> {
    if precise {
        return None;
    }
    cache.get(lat, lng).await
}

fn print_result(value: &CacheValue, source: &str) {
    let region = value
        .region
        .as_deref()
        .map(|r| format!(" / {}", r))
        .unwrap_or_default();
    println!(
        "Country:    {}{}  {}",
        style(value.country).bold().green(),
        region,
        style(format!("({})", source)).dim()
    );
}
