//! `metadata.json` hash store.
//!
//! ```json
//! {
//!   "metadata_version": "1.0",
//!   "hashes": {
//!     "backup-2026-10-16.tar.xz": { "sha256": "…", "recorded_at": "…" }
//!   }
//! }
//! ```
//!
//! A missing file reads as empty. Writes go through a temp file and a
//! rename so a crash never leaves a truncated `metadata.json`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::HashStore;
use crate::errors::{Result, TarSealError};

/// Current schema version written to `metadata_version`.
pub const METADATA_VERSION: &str = "1.0";

/// One recorded digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashEntry {
    pub sha256: String,
    pub recorded_at: DateTime<Utc>,
}

/// The whole `metadata.json` document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataFile {
    #[serde(default = "default_version")]
    pub metadata_version: String,

    #[serde(default)]
    pub hashes: BTreeMap<String, HashEntry>,
}

fn default_version() -> String {
    METADATA_VERSION.to_string()
}

impl Default for MetadataFile {
    fn default() -> Self {
        Self {
            metadata_version: default_version(),
            hashes: BTreeMap::new(),
        }
    }
}

/// File-backed [`HashStore`].
///
/// Every call re-reads the file, so two stores pointing at the same
/// path see each other's writes (there is no locking).
#[derive(Debug, Clone)]
pub struct JsonHashStore {
    path: PathBuf,
}

impl JsonHashStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the document, or an empty one when the file does not exist.
    pub fn load(&self) -> Result<MetadataFile> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "no metadata file, starting empty");
            return Ok(MetadataFile::default());
        }

        let contents = fs::read_to_string(&self.path).map_err(|e| self.error(e))?;
        let doc: MetadataFile = serde_json::from_str(&contents).map_err(|e| self.error(e))?;

        if doc.metadata_version != METADATA_VERSION {
            tracing::warn!(
                path = %self.path.display(),
                found = %doc.metadata_version,
                expected = METADATA_VERSION,
                "unexpected metadata version, reading anyway"
            );
        }
        Ok(doc)
    }

    /// Write the document atomically (temp file + rename).
    pub fn save(&self, doc: &MetadataFile) -> Result<()> {
        let json = serde_json::to_vec_pretty(doc)
            .map_err(|e| TarSealError::SerializationError(format!("metadata: {e}")))?;

        let parent = self.path.parent().unwrap_or(Path::new("."));
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| self.error(e))?;
        }
        let tmp_path = parent.join(format!(
            ".{}.tmp",
            self.path.file_name().unwrap_or_default().to_string_lossy()
        ));

        fs::write(&tmp_path, &json).map_err(|e| self.error(e))?;
        fs::rename(&tmp_path, &self.path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            self.error(e)
        })?;

        tracing::debug!(path = %self.path.display(), entries = doc.hashes.len(), "saved metadata");
        Ok(())
    }

    fn error(&self, e: impl std::fmt::Display) -> TarSealError {
        TarSealError::MetadataError {
            path: self.path.clone(),
            reason: e.to_string(),
        }
    }
}

impl HashStore for JsonHashStore {
    fn read_stored_hash(&self, filename: &str) -> Result<Option<String>> {
        Ok(self
            .load()?
            .hashes
            .get(filename)
            .map(|entry| entry.sha256.clone()))
    }

    fn write_stored_hash(&mut self, filename: &str, hash: &str) -> Result<()> {
        let mut doc = self.load()?;
        doc.hashes.insert(
            filename.to_string(),
            HashEntry {
                sha256: hash.to_string(),
                recorded_at: Utc::now(),
            },
        );
        self.save(&doc)
    }
}
