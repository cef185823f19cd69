//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

use borderwatch::cache::CacheError;
use borderwatch::config::ConfigFileError;
use borderwatch::detector::DetectionError;
use borderwatch::location::LocationError;
use borderwatch::resolver::ResolverError;
use borderwatch::store::StoreError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Failed to start the async runtime
    Runtime(std::io::Error),
    /// Configuration error
    Config(String),
    /// Failed to open the cache store
    Store(StoreError),
    /// Cache operation failed
    Cache(CacheError),
    /// Failed to build or call the precise resolver
    Resolver(ResolverError),
    /// Failed to load a recorded track
    Track { path: String, error: LocationError },
    /// Detection session ended with an error
    Detection(DetectionError),
    /// Invalid command-line input
    InvalidInput(String),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        // Print additional help for specific errors
        match self {
            CliError::Resolver(ResolverError::Disabled) => {
                eprintln!();
                eprintln!("Precise resolution needs a service endpoint:");
                eprintln!("  1. Run 'borderwatch config init' to create a config file");
                eprintln!("  2. Set endpoint (and api_key if required) in the [resolver] section");
            }
            CliError::Detection(DetectionError::PermissionDenied) => {
                eprintln!();
                eprintln!("Location access was refused by the provider.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Runtime(e) => write!(f, "Failed to start async runtime: {}", e),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Store(e) => write!(f, "Failed to open cache store: {}", e),
            CliError::Cache(e) => write!(f, "Cache error: {}", e),
            CliError::Resolver(e) => write!(f, "Resolver error: {}", e),
            CliError::Track { path, error } => {
                write!(f, "Failed to load track '{}': {}", path, error)
            }
            CliError::Detection(e) => write!(f, "Detection failed: {}", e),
            CliError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Runtime(e) => Some(e),
            CliError::Store(e) => Some(e),
            CliError::Cache(e) => Some(e),
            CliError::Resolver(e) => Some(e),
            CliError::Track { error, .. } => Some(error),
            CliError::Detection(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        CliError::Store(e)
    }
}

impl From<CacheError> for CliError {
    fn from(e: CacheError) -> Self {
        CliError::Cache(e)
    }
}

impl From<ResolverError> for CliError {
    fn from(e: ResolverError) -> Self {
        CliError::Resolver(e)
    }
}

impl From<DetectionError> for CliError {
    fn from(e: DetectionError) -> Self {
        CliError::Detection(e)
    }
}
