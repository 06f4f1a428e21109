//! Password-based key derivation using PBKDF2-HMAC-SHA256.
//!
//! The parameters are a fixed, system-wide policy: every `.enc` file is
//! produced and opened with the same iteration count, so nothing about
//! the KDF needs to be stored in the file besides the salt.

use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;
use zeroize::Zeroize;

use crate::errors::{Result, TarSealError};

/// PBKDF2 iteration count (OWASP guidance for PBKDF2-HMAC-SHA256).
pub const PBKDF2_ITERATIONS: u32 = 600_000;

/// Length of the salt in bytes (128 bits).
pub const SALT_LEN: usize = 16;

/// Length of the derived key in bytes (256 bits, for AES-256).
pub const KEY_LEN: usize = 32;

/// A 32-byte symmetric key that zeroes its memory when dropped.
///
/// Only ever built by [`derive_key`]; it never leaves the encrypt or
/// decrypt call that created it.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct DerivedKey {
    bytes: [u8; KEY_LEN],
}

impl DerivedKey {
    /// Access the raw key bytes (to build the cipher).
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DerivedKey([REDACTED])")
    }
}

/// Derive a key from a password and salt.
///
/// The same password + salt always produce the same key.
pub fn derive_key(password: &[u8], salt: &[u8]) -> Result<DerivedKey> {
    if salt.len() != SALT_LEN {
        return Err(TarSealError::KeyDerivationFailed(format!(
            "salt must be {SALT_LEN} bytes (got {})",
            salt.len()
        )));
    }

    let mut key = DerivedKey {
        bytes: [0u8; KEY_LEN],
    };
    pbkdf2_hmac::<Sha256>(password, salt, PBKDF2_ITERATIONS, &mut key.bytes);
    Ok(key)
}

/// Generate a cryptographically random 16-byte salt.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);
    salt
}
