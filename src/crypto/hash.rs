//! SHA-256 file digests for integrity corroboration.
//!
//! Digests are lowercase hex strings, the same representation the hash
//! store persists.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::errors::{Result, TarSealError};

/// Read buffer size for streaming files through the hasher (64 KiB).
const BUFFER_SIZE: usize = 64 * 1024;

/// SHA-256 hex digest of an in-memory buffer.
pub fn sha256_hex(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

/// SHA-256 hex digest of a file, read in 64 KiB chunks.
pub fn sha256_file(path: &Path) -> Result<String> {
    if !path.is_file() {
        return Err(TarSealError::InvalidInput(format!(
            "not a regular file: {}",
            path.display()
        )));
    }

    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; BUFFER_SIZE];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    let digest = format!("{:x}", hasher.finalize());
    tracing::debug!(file = %path.display(), "computed SHA-256");
    Ok(digest)
}

/// Compare two hex digests in constant time (case-insensitive).
pub fn digests_match(a: &str, b: &str) -> bool {
    let a = a.trim().to_ascii_lowercase();
    let b = b.trim().to_ascii_lowercase();
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Check a file against an expected digest and return the digest.
///
/// A differing digest is `IntegrityMismatch`; read errors propagate.
pub fn verify_hash(path: &Path, expected: &str) -> Result<String> {
    let actual = sha256_file(path)?;
    if !digests_match(&actual, expected) {
        tracing::warn!(file = %path.display(), "hash mismatch");
        return Err(TarSealError::IntegrityMismatch {
            file: path
                .file_name()
                .unwrap_or_default()
                .to_string_lossy()
                .into_owned(),
            expected: expected.to_string(),
            actual,
        });
    }

    tracing::info!(file = %path.display(), "hash verification passed");
    Ok(actual)
}
