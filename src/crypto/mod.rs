//! Cryptographic primitives for tarseal.
//!
//! This module provides:
//! - AES-256-GCM encryption and decryption (`encryption`)
//! - PBKDF2-HMAC-SHA256 password-based key derivation (`kdf`)
//! - The fixed `salt || nonce || ciphertext` file layout (`frame`)
//! - SHA-256 file digests for integrity checks (`hash`)

pub mod encryption;
pub mod frame;
pub mod hash;
pub mod kdf;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{seal, open, derive_key, Frame, ...};
pub use encryption::{generate_nonce, open, seal, NONCE_LEN, TAG_LEN};
pub use frame::{Frame, HEADER_LEN, MIN_FRAME_LEN};
pub use hash::{digests_match, sha256_file, sha256_hex, verify_hash};
pub use kdf::{derive_key, generate_salt, DerivedKey, KEY_LEN, PBKDF2_ITERATIONS, SALT_LEN};
