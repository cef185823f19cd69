//! CLI runner for common setup and operations.
//!
//! Encapsulates config loading, logging initialization, the tokio runtime
//! and construction of the cache and resolver shared by command handlers.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::runtime::Runtime;
use tracing::info;

use borderwatch::cache::SpatialCache;
use borderwatch::config::{config_file_path, ConfigFile, DetectorConfig};
use borderwatch::logging::{init_logging, LoggingGuard};
use borderwatch::resolver::{self, PreciseResolver};
use borderwatch::store::DiskStore;
use borderwatch::time::{Clock, SystemClock};

use crate::error::CliError;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    _logging_guard: LoggingGuard,
    config: ConfigFile,
    config_path: PathBuf,
    runtime: Runtime,
}

impl CliRunner {
    /// Load config, initialize logging and start the runtime.
    ///
    /// `config_path` overrides `~/.borderwatch/config.ini`. With `verbose`,
    /// the default log level is `debug` instead of `info`.
    pub fn new(config_path: Option<&Path>, verbose: bool) -> Result<Self, CliError> {
        let config_path = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(config_file_path);
        let config = ConfigFile::load_from(&config_path)?;

        let level = if verbose { "debug" } else { "info" };
        let logging_guard =
            init_logging(&config.logging.directory, &config.logging.file, level)
                .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(CliError::Runtime)?;

        Ok(Self {
            _logging_guard: logging_guard,
            config,
            config_path,
            runtime,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Detector settings derived from the config file.
    pub fn detector_config(&self) -> DetectorConfig {
        DetectorConfig::from(&self.config)
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("borderwatch v{}", borderwatch::VERSION);
        info!(config = %self.config_path.display(), "borderwatch CLI: {} command", command);
    }

    /// Run a future to completion on the runner's runtime.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::new(SystemClock)
    }

    /// Open the on-disk spatial cache from the configured directory.
    pub async fn open_cache(&self) -> Result<SpatialCache, CliError> {
        let store = DiskStore::open(&self.config.cache.directory).await?;
        let cache_config = self.config.cache.cache_config();
        Ok(SpatialCache::new(Arc::new(store), self.clock()).with_ttl(cache_config.ttl))
    }

    /// Build the precise resolver from the `[resolver]` section.
    pub fn resolver(&self) -> Result<Arc<dyn PreciseResolver>, CliError> {
        Ok(Arc::from(resolver::from_config(&self.config.resolver)?))
    }
}
