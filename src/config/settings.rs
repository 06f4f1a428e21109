use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{Result, TarSealError};
use crate::logging::LogFormat;

/// User configuration, loaded from `<config_dir>/tarseal.toml`.
///
/// Every field has a sensible default so tarseal works out-of-the-box
/// without any config file at all. Cryptographic parameters are not
/// configurable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// File name of the hash store inside the config directory.
    #[serde(default = "default_metadata_file")]
    pub metadata_file: String,

    /// Default log level (overridden by `RUST_LOG`).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log line format.
    #[serde(default)]
    pub log_format: LogFormat,

    /// Compare decrypted output against the stored hash.
    #[serde(default = "default_true")]
    pub verify_after_decrypt: bool,

    /// Record file hashes after encrypting and decrypting.
    #[serde(default = "default_true")]
    pub record_hashes: bool,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_metadata_file() -> String {
    "metadata.json".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            metadata_file: default_metadata_file(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            verify_after_decrypt: true,
            record_hashes: true,
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the config directory.
    const FILE_NAME: &'static str = "tarseal.toml";

    /// Load settings from `<config_dir>/tarseal.toml`.
    ///
    /// If the file does not exist, sensible defaults are returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(config_dir: &Path) -> Result<Self> {
        let config_path = config_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            TarSealError::ConfigError(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        if settings.metadata_file.trim().is_empty() {
            return Err(TarSealError::ConfigError(
                "metadata_file cannot be empty".into(),
            ));
        }

        Ok(settings)
    }

    /// Full path of the hash store file.
    ///
    /// Example: `~/.config/tarseal/metadata.json`
    pub fn metadata_path(&self, config_dir: &Path) -> PathBuf {
        config_dir.join(&self.metadata_file)
    }
}

/// Platform config directory (`~/.config/tarseal` on Linux), or
/// `.tarseal` in the working directory when no home is known.
pub fn default_config_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "tarseal")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".tarseal"))
}

// ── Tests ────────────────────────────────────────────────────────────
