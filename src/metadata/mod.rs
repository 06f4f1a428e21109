//! Integrity metadata: filename → SHA-256 hex digest.
//!
//! The engines only see the [`HashStore`] trait. How and where digests
//! are persisted (and how that format evolves) belongs to the store.

mod json;

use std::collections::HashMap;

use crate::errors::Result;

pub use json::{HashEntry, JsonHashStore, MetadataFile, METADATA_VERSION};

/// Lookup and update of stored file digests, keyed by bare file name.
pub trait HashStore {
    /// The stored digest for `filename`, if any.
    fn read_stored_hash(&self, filename: &str) -> Result<Option<String>>;

    /// Record (or replace) the digest for `filename`.
    fn write_stored_hash(&mut self, filename: &str, hash: &str) -> Result<()>;
}

impl<T: HashStore + ?Sized> HashStore for &mut T {
    fn read_stored_hash(&self, filename: &str) -> Result<Option<String>> {
        (**self).read_stored_hash(filename)
    }

    fn write_stored_hash(&mut self, filename: &str, hash: &str) -> Result<()> {
        (**self).write_stored_hash(filename, hash)
    }
}

/// In-process store, lost when dropped.
#[derive(Debug, Default, Clone)]
pub struct MemoryHashStore {
    hashes: HashMap<String, String>,
}

impl MemoryHashStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}

impl HashStore for MemoryHashStore {
    fn read_stored_hash(&self, filename: &str) -> Result<Option<String>> {
        Ok(self.hashes.get(filename).cloned())
    }

    fn write_stored_hash(&mut self, filename: &str, hash: &str) -> Result<()> {
        self.hashes.insert(filename.to_string(), hash.to_string());
        Ok(())
    }
}
