//! Binary layout of an encrypted `.enc` file.
//!
//! ```text
//! [salt: 16 bytes][nonce: 12 bytes][ciphertext || tag: n + 16 bytes]
//! ```
//!
//! - **Salt**: PBKDF2 salt, fresh per encryption.
//! - **Nonce**: AES-GCM nonce, fresh per encryption.
//! - **Ciphertext || tag**: output of AES-256-GCM; the tag is the last
//!   16 bytes.
//!
//! There is no magic, version byte or length prefix; the layout is fixed.

use super::encryption::{NONCE_LEN, TAG_LEN};
use super::kdf::SALT_LEN;
use crate::errors::{Result, TarSealError};

/// Offset at which the ciphertext starts.
pub const HEADER_LEN: usize = SALT_LEN + NONCE_LEN;

/// Smallest well-formed frame: salt + nonce + an empty ciphertext's tag.
pub const MIN_FRAME_LEN: usize = HEADER_LEN + TAG_LEN;

/// A parsed view over the bytes of an encrypted file.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub salt: &'a [u8; SALT_LEN],
    pub nonce: &'a [u8; NONCE_LEN],
    pub ciphertext: &'a [u8],
}

impl<'a> Frame<'a> {
    /// Split `data` into salt, nonce and ciphertext.
    ///
    /// Anything shorter than [`MIN_FRAME_LEN`] is rejected as `Corrupt`.
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        if data.len() < MIN_FRAME_LEN {
            return Err(TarSealError::Corrupt(format!(
                "{} bytes is below the minimum frame size of {MIN_FRAME_LEN}",
                data.len()
            )));
        }

        let (salt, rest) = data.split_at(SALT_LEN);
        let (nonce, ciphertext) = rest.split_at(NONCE_LEN);

        Ok(Self {
            salt: salt
                .try_into()
                .map_err(|_| TarSealError::Corrupt("bad salt length".into()))?,
            nonce: nonce
                .try_into()
                .map_err(|_| TarSealError::Corrupt("bad nonce length".into()))?,
            ciphertext,
        })
    }

    /// Serialize back to `salt || nonce || ciphertext`.
    pub fn to_bytes(&self) -> Vec<u8> {
        encode(self.salt, self.nonce, self.ciphertext)
    }
}

/// Build the on-disk bytes from the three parts.
pub fn encode(salt: &[u8; SALT_LEN], nonce: &[u8; NONCE_LEN], ciphertext: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_LEN + ciphertext.len());
    buf.extend_from_slice(salt);
    buf.extend_from_slice(nonce);
    buf.extend_from_slice(ciphertext);
    buf
}
