//! Encryption and decryption of whole files.
//!
//! `EncryptionEngine` and `DecryptionEngine` wrap the crypto layer, the
//! password provider and the hash store so a caller only needs
//! `engine.encrypt(path)` / `engine.decrypt(path)`.

mod decrypt;
mod encrypt;
mod output;

use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{Result, TarSealError};
use crate::redact::sanitize_log;

pub use decrypt::{DecryptReport, DecryptionEngine, IntegrityStatus, RetryPolicy};
pub use encrypt::EncryptionEngine;

/// Suffix appended to encrypted files.
pub const ENCRYPTED_SUFFIX: &str = ".enc";

/// Suffix appended to the stem of decrypted files.
pub const DECRYPTED_SUFFIX: &str = "-decrypted";

/// `<input>.enc`, next to the input.
pub fn encrypted_path_for(input: &Path) -> PathBuf {
    let mut name = input.file_name().unwrap_or_default().to_os_string();
    name.push(ENCRYPTED_SUFFIX);
    input.with_file_name(name)
}

/// The original archive an encrypted file was made from: the encrypted
/// name with its last extension (normally `.enc`) removed.
pub fn original_path_for(encrypted: &Path) -> PathBuf {
    let stem = encrypted.file_stem().unwrap_or_default();
    encrypted.with_file_name(stem)
}

/// `<stem>-decrypted`, next to the encrypted file.
pub fn decrypted_path_for(encrypted: &Path) -> PathBuf {
    let mut name = encrypted.file_stem().unwrap_or_default().to_os_string();
    name.push(DECRYPTED_SUFFIX);
    encrypted.with_file_name(name)
}

/// Bare file name used as the hash store key.
pub(crate) fn store_key(path: &Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .into_owned()
}

/// Check that `path` is an existing regular file and return its size.
pub(crate) fn inspect_input_file(path: &Path) -> Result<u64> {
    let meta = fs::metadata(path).map_err(|_| {
        TarSealError::InvalidInput(format!("file not found: {}", path.display()))
    })?;

    if !meta.is_file() {
        return Err(TarSealError::InvalidInput(format!(
            "not a regular file: {}",
            path.display()
        )));
    }

    Ok(meta.len())
}

/// Like [`inspect_input_file`], but also refuses empty files.
///
/// An empty archive where a backup was expected is treated as a
/// possible tampering signal.
pub(crate) fn validate_input_file(path: &Path) -> Result<u64> {
    let size = inspect_input_file(path)?;
    if size == 0 {
        return Err(TarSealError::InvalidInput(format!(
            "cannot process empty file (potential tampering): {}",
            path.display()
        )));
    }
    Ok(size)
}

/// Log a failed operation at the bool boundary, with error text
/// passed through the redaction filter.
pub(crate) fn log_failure(operation: &str, path: &Path, err: &TarSealError) {
    let message = sanitize_log(&err.to_string());
    match err {
        TarSealError::EmptyPassword
        | TarSealError::ConfirmationMismatch
        | TarSealError::UserCancelled => {
            tracing::error!(file = %path.display(), error = %message, "{operation} aborted due to password issues");
        }
        _ => {
            tracing::error!(file = %path.display(), error = %message, "{operation} failed");
        }
    }
}
