//! borderwatch CLI - Command-line interface
//!
//! This binary provides a command-line interface to the borderwatch library:
//! one-off classification of a position, playback of recorded GPS tracks
//! through the detector, and cache and config maintenance.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::cache::CacheAction;
use commands::classify::ClassifyArgs;
use commands::config::ConfigCommands;
use commands::replay::ReplayArgs;

#[derive(Debug, Parser)]
#[command(name = "borderwatch")]
#[command(version, about = "Debounced country detection from GPS fixes", long_about = None)]
struct Cli {
    /// Config file to use instead of ~/.borderwatch/config.ini
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Classify a single position and show how it was decided
    Classify(ClassifyArgs),

    /// Play a recorded track through the detector
    Replay(ReplayArgs),

    /// Manage the spatial cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    let result = match cli.command {
        Commands::Classify(args) => commands::classify::run(config_path, cli.verbose, args),
        Commands::Replay(args) => commands::replay::run(config_path, cli.verbose, args),
        Commands::Cache { action } => commands::cache::run(config_path, cli.verbose, action),
        Commands::Config { command } => commands::config::run(config_path, command),
    };

    if let Err(e) = result {
        e.exit();
    }
}
