//! AES-256-GCM authenticated encryption.
//!
//! Unlike a self-contained blob format, the nonce is chosen by the
//! caller and stored by the frame layer next to the salt. The returned
//! ciphertext always ends with the 16-byte authentication tag.

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};

use super::kdf::DerivedKey;
use crate::errors::{Result, TarSealError};

/// Size of the AES-256-GCM nonce in bytes.
pub const NONCE_LEN: usize = 12;

/// Size of the GCM authentication tag in bytes.
pub const TAG_LEN: usize = 16;

/// Generate a random 12-byte nonce from the OS RNG.
pub fn generate_nonce() -> [u8; NONCE_LEN] {
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let mut out = [0u8; NONCE_LEN];
    out.copy_from_slice(&nonce);
    out
}

/// Encrypt `plaintext` with `key` and `nonce`, no associated data.
///
/// Returns `ciphertext || tag`, exactly `plaintext.len() + TAG_LEN` bytes.
pub fn seal(key: &DerivedKey, nonce: &[u8; NONCE_LEN], plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| TarSealError::EncryptionFailed(format!("invalid key length: {e}")))?;

    cipher
        .encrypt(Nonce::from_slice(nonce), plaintext)
        .map_err(|e| TarSealError::EncryptionFailed(format!("encryption error: {e}")))
}

/// Decrypt and authenticate `ciphertext || tag`.
///
/// A wrong key and a modified ciphertext are indistinguishable here;
/// both surface as `WrongPasswordOrTampered`.
pub fn open(key: &DerivedKey, nonce: &[u8; NONCE_LEN], ciphertext: &[u8]) -> Result<Vec<u8>> {
    if ciphertext.len() < TAG_LEN {
        return Err(TarSealError::Corrupt(format!(
            "ciphertext shorter than the {TAG_LEN}-byte tag"
        )));
    }

    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|_| TarSealError::WrongPasswordOrTampered)?;

    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| TarSealError::WrongPasswordOrTampered)
}
