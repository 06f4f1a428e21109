use std::path::PathBuf;
use thiserror::Error;

/// All errors that can occur in tarseal.
#[derive(Debug, Error)]
pub enum TarSealError {
    // --- Input errors ---
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Encrypted file is corrupt: {0}")]
    Corrupt(String),

    // --- Password errors ---
    #[error("Password cannot be empty")]
    EmptyPassword,

    #[error("Password mismatch: passwords do not match")]
    ConfirmationMismatch,

    #[error("User cancelled operation")]
    UserCancelled,

    // --- Crypto errors ---
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: wrong password or tampered data")]
    WrongPasswordOrTampered,

    #[error("Maximum password attempts exceeded ({0})")]
    MaxAttemptsExceeded(u32),

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    // --- Integrity errors ---
    #[error("Integrity mismatch for {file}: expected {expected}, got {actual}")]
    IntegrityMismatch {
        file: String,
        expected: String,
        actual: String,
    },

    #[error("No stored hash for {0}")]
    NoBaseline(String),

    // --- Metadata errors ---
    #[error("Metadata store error at {path}: {reason}")]
    MetadataError { path: PathBuf, reason: String },

    // --- Config errors ---
    #[error("Config file error: {0}")]
    ConfigError(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),
}

/// Convenience type alias for tarseal results.
pub type Result<T> = std::result::Result<T, TarSealError>;
