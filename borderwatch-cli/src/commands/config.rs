//! Configuration management CLI commands.
//!
//! Provides `config init`, `config show` and `config path` for creating and
//! inspecting the INI configuration file.

use std::path::Path;

use borderwatch::config::{config_file_path, ConfigFile};
use clap::Subcommand;

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Write a config file with default settings
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,

    /// Show the configuration file path
    Path,
}

/// Run a config subcommand.
pub fn run(config_path: Option<&Path>, command: ConfigCommands) -> Result<(), CliError> {
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(config_file_path);

    match command {
        ConfigCommands::Init { force } => run_init(&path, force),
        ConfigCommands::Show => run_show(&path),
        ConfigCommands::Path => run_path(&path),
    }
}

/// Create the config file.
fn run_init(path: &Path, force: bool) -> Result<(), CliError> {
    if force {
        ConfigFile::default().save_to(path)?;
        println!("Wrote default configuration to {}", path.display());
    } else if ConfigFile::ensure_exists_at(path)? {
        println!("Created {}", path.display());
    } else {
        println!(
            "{} already exists. Use --force to overwrite it.",
            path.display()
        );
    }
    Ok(())
}

/// Print the effective configuration (file values over defaults).
fn run_show(path: &Path) -> Result<(), CliError> {
    let config = ConfigFile::load_from(path)?;
    if !path.exists() {
        println!("; {} not found, showing defaults", path.display());
        println!();
    }
    print!("{}", config.to_ini_string());
    Ok(())
}

/// Show the configuration file path.
fn run_path(path: &Path) -> Result<(), CliError> {
    println!("{}", path.display());
    Ok(())
}
