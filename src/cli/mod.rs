//! CLI module: Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::Parser;

use crate::config::{default_config_dir, Settings};
use crate::errors::Result;
use crate::logging::LogFormat;
use crate::metadata::JsonHashStore;

/// tarseal CLI: password-based encryption for backup archives.
#[derive(Parser)]
#[command(
    name = "tarseal",
    about = "Password-based AES-256-GCM encryption for backup archives",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory holding tarseal.toml and the hash metadata
    #[arg(long, env = "TARSEAL_CONFIG_DIR", global = true)]
    pub config_dir: Option<PathBuf>,

    /// Log level (overrides tarseal.toml; RUST_LOG overrides both)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format
    #[arg(long, value_enum, global = true)]
    pub log_format: Option<LogFormat>,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Encrypt a file to <FILE>.enc (prompts for a password twice)
    Encrypt {
        /// File to encrypt
        file: PathBuf,
    },

    /// Decrypt a .enc file to <stem>-decrypted
    Decrypt {
        /// Encrypted file
        file: PathBuf,
    },

    /// Check a file against its recorded SHA-256
    Verify {
        /// File to check
        file: PathBuf,
    },
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Resolved configuration directory: `--config-dir`, then
/// `TARSEAL_CONFIG_DIR`, then the platform default.
pub fn config_dir(cli: &Cli) -> PathBuf {
    cli.config_dir.clone().unwrap_or_else(default_config_dir)
}

/// Load `tarseal.toml` and apply command-line overrides.
pub fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = Settings::load(&config_dir(cli))?;
    if let Some(level) = &cli.log_level {
        settings.log_level = level.clone();
    }
    if let Some(format) = cli.log_format {
        settings.log_format = format;
    }
    Ok(settings)
}

/// The hash store configured for this invocation.
pub fn hash_store(cli: &Cli, settings: &Settings) -> JsonHashStore {
    JsonHashStore::new(settings.metadata_path(&config_dir(cli)))
}
