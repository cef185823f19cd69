//! Cache management CLI commands.

use std::path::Path;

use clap::Subcommand;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Cache action subcommands.
#[derive(Debug, Subcommand)]
pub enum CacheAction {
    /// Show cache entry counts and size
    Stats,
    /// Remove expired and unreadable entries
    Sweep,
    /// Remove every cached classification
    Clear,
}

/// Run a cache subcommand.
pub fn run(config_path: Option<&Path>, verbose: bool, action: CacheAction) -> Result<(), CliError> {
    let runner = CliRunner::new(config_path, verbose)?;
    runner.log_startup("cache");
    let cache_dir = runner.config().cache.directory.clone();

    runner.block_on(async {
        let cache = runner.open_cache().await?;

        match action {
            CacheAction::Stats => {
                let stats = cache.stats().await?;
                println!("Cache: {}", cache_dir.display());
                println!("  Entries: {}", stats.total_entries);
                println!("  Valid:   {}", stats.valid_entries);
                println!("  Expired: {}", stats.expired_entries);
                println!("  Size:    {:.1} KB", stats.total_bytes as f64 / 1024.0);
            }
            CacheAction::Sweep => {
                let removed = cache.sweep_expired().await;
                println!("Removed {} expired entries from {}", removed, cache_dir.display());
            }
            CacheAction::Clear => {
                println!("Clearing cache at: {}", cache_dir.display());
                let removed = cache.clear_all().await?;
                println!("Deleted {} entries", removed);
            }
        }

        Ok::<(), CliError>(())
    })
}
