//! Replay command - play a recorded GPS track through the detector.
//!
//! Country changes are printed as they happen. Ctrl-C stops playback and
//! prints the state reached so far.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Local};
use clap::Args;
use console::style;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::info;

use borderwatch::cache::CacheSweeper;
use borderwatch::detector::{DetectionState, GeoDetector};
use borderwatch::location::{ReplayProvider, WatchOptions};

use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the replay command.
#[derive(Debug, Args)]
pub struct ReplayArgs {
    /// Track file: timestamp_ms,latitude,longitude[,accuracy_m] per line
    pub track: PathBuf,

    /// Playback speed relative to the recorded timestamps (0 = as fast as possible)
    #[arg(long, default_value = "0")]
    pub speed: f64,

    /// Minimum seconds between delivered fixes (default from config)
    #[arg(long)]
    pub interval: Option<u64>,

    /// Minimum meters between delivered fixes (default from config)
    #[arg(long)]
    pub min_distance: Option<f64>,
}

/// Run the replay command.
pub fn run(config_path: Option<&Path>, verbose: bool, args: ReplayArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(config_path, verbose)?;
    runner.log_startup("replay");
    runner.block_on(replay(&runner, args))
}

async fn replay(runner: &CliRunner, args: ReplayArgs) -> Result<(), CliError> {
    let provider = ReplayProvider::load(&args.track)
        .await
        .map_err(|error| CliError::Track {
            path: args.track.display().to_string(),
            error,
        })?
        .with_speed(args.speed);

    let mut options: WatchOptions = runner.config().location.clone();
    if let Some(secs) = args.interval {
        options = options.with_interval(Duration::from_secs(secs));
    }
    if let Some(meters) = args.min_distance {
        options = options.with_min_distance_m(meters);
    }

    println!(
        "Replaying {} fixes from {}",
        provider.len(),
        args.track.display()
    );
    info!(
        fixes = provider.len(),
        speed = args.speed,
        interval_secs = options.interval.as_secs(),
        min_distance_m = options.min_distance_m,
        "Starting replay"
    );

    let shutdown = CancellationToken::new();
    let ctrlc_token = shutdown.clone();
    ctrlc::set_handler(move || ctrlc_token.cancel())
        .map_err(|e| CliError::Config(format!("Cannot install Ctrl-C handler: {}", e)))?;

    let cache = runner.open_cache().await?;
    let sweeper = CacheSweeper::start(
        cache.clone(),
        runner.config().cache.cache_config().sweep_interval,
        &shutdown,
    );

    let mut detector = GeoDetector::new(
        runner.detector_config(),
        cache,
        runner.resolver()?,
        runner.clock(),
    );

    let printer = tokio::spawn(print_changes(detector.subscribe()));
    let (_commands_tx, commands_rx) = mpsc::channel(1);

    let result = detector
        .run_with_provider(&provider, options, commands_rx, shutdown.clone())
        .await;

    shutdown.cancel();
    sweeper.shutdown().await;
    drop(detector);
    let _ = printer.await;

    result.map_err(CliError::from)
}

/// Print every stable country change, then the final state once the
/// detector goes away.
async fn print_changes(mut updates: watch::Receiver<DetectionState>) {
    let mut last = updates.borrow().clone();

    while updates.changed().await.is_ok() {
        let state = updates.borrow_and_update().clone();
        if state.current_country != last.current_country
            || state.current_region != last.current_region
        {
            let when = state
                .debug
                .last_reading
                .as_ref()
                .and_then(|r| DateTime::from_timestamp_millis(r.timestamp_ms))
                .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "-".to_string());
            println!(
                "{}  {} -> {}{}",
                style(when).dim(),
                describe(last.current_country.map(|c| c.to_string()), None),
                style(describe(
                    state.current_country.map(|c| c.to_string()),
                    state.current_region.as_deref()
                ))
                .bold()
                .green(),
                if state.is_near_border {
                    style(" (near border)").yellow().to_string()
                } else {
                    String::new()
                }
            );
        }
        last = state;
    }

    println!();
    println!(
        "Final country: {}",
        style(describe(
            last.current_country.map(|c| c.to_string()),
            last.current_region.as_deref()
        ))
        .bold()
    );
    if let Some(error) = &last.error {
        println!("Last error:    {}", style(error).red());
    }
    println!("Buffered:      {} readings", last.debug.buffer_size);
}

fn describe(country: Option<String>, region: Option<&str>) -> String {
    match (country, region) {
        (Some(c), Some(r)) => format!("{}/{}", c, r),
        (Some(c), None) => c,
        (None, _) => "unknown".to_string(),
    }
}
