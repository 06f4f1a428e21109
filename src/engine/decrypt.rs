//! `DecryptionEngine`: `<stem>.enc` → `<stem>-decrypted`.
//!
//! Password attempts run through a small state machine:
//!
//! ```text
//! AwaitingPassword(n) → Decrypting(n) → Success
//!                                     → WrongPasswordOrTampered(n) → AwaitingPassword(n+1)
//!                                                                  → MaxAttemptsExceeded
//! ```
//!
//! A frame that is too short fails before the first prompt, and a
//! cancelled or empty prompt ends the loop without using up an attempt.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::output::AtomicOutput;
use super::{
    decrypted_path_for, inspect_input_file, log_failure, original_path_for, store_key,
};
use crate::crypto::{derive_key, digests_match, open, sha256_file, sha256_hex, Frame, MIN_FRAME_LEN};
use crate::errors::{Result, TarSealError};
use crate::metadata::HashStore;
use crate::secret::{PasswordPrompt, Secret, SecretInput};

/// Bounded retry with exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Delay after the `attempt`-th failure (1-based):
    /// `base * 2^(attempt - 1)`, capped at `max_delay`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Outcome of the post-decryption hash comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityStatus {
    /// Decrypted content matches the stored hash of the original.
    Verified,
    /// A stored hash exists and differs.
    Mismatch { expected: String, actual: String },
    /// Nothing recorded for the original file name.
    NoBaseline,
    /// Hashing or the store lookup failed.
    Unavailable,
    /// Verification was turned off.
    Skipped,
}

/// What a successful decryption produced.
#[derive(Debug, Clone)]
pub struct DecryptReport {
    pub output: PathBuf,
    pub attempts: u32,
    pub integrity: IntegrityStatus,
}

enum DecryptState {
    AwaitingPassword { attempt: u32 },
    Decrypting { attempt: u32, secret: Secret },
    WrongPasswordOrTampered { attempt: u32 },
    Success { attempt: u32, plaintext: Vec<u8> },
}

/// Decrypts `.enc` files, retrying the password with backoff.
pub struct DecryptionEngine<P, S> {
    input: SecretInput<P>,
    store: S,
    policy: RetryPolicy,
    sleeper: Box<dyn FnMut(Duration)>,
    verify: bool,
    record_hashes: bool,
}

impl<P: PasswordPrompt, S: HashStore> DecryptionEngine<P, S> {
    pub fn new(prompt: P, store: S) -> Self {
        Self {
            input: SecretInput::new(prompt),
            store,
            policy: RetryPolicy::default(),
            sleeper: Box::new(std::thread::sleep),
            verify: true,
            record_hashes: true,
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replace the backoff sleep (tests record the delays instead).
    pub fn with_sleeper(mut self, sleeper: impl FnMut(Duration) + 'static) -> Self {
        self.sleeper = Box::new(sleeper);
        self
    }

    /// Turn the post-decryption integrity check on or off (on by default).
    pub fn verify_integrity(mut self, enabled: bool) -> Self {
        self.verify = enabled;
        self
    }

    /// Turn recording of the decrypted file's hash on or off.
    pub fn record_hashes(mut self, enabled: bool) -> Self {
        self.record_hashes = enabled;
        self
    }

    /// Decrypt `encrypted_path` to `<stem>-decrypted`.
    ///
    /// Returns `true` once the authentication tag verifies and the
    /// output is written. An integrity mismatch afterwards is logged as
    /// a warning and does not change the result.
    pub fn decrypt(&mut self, encrypted_path: &Path) -> bool {
        match self.try_decrypt(encrypted_path) {
            Ok(report) => {
                tracing::info!(
                    file = %store_key(&report.output),
                    path = %report.output.display(),
                    attempts = report.attempts,
                    "decryption completed"
                );
                true
            }
            Err(e) => {
                log_failure("decryption", encrypted_path, &e);
                false
            }
        }
    }

    /// Like [`decrypt`](Self::decrypt) but returns the typed error, or a
    /// report of what was written.
    pub fn try_decrypt(&mut self, encrypted_path: &Path) -> Result<DecryptReport> {
        tracing::info!(file = %store_key(encrypted_path), "starting decryption");

        // 1. Validate the frame size before prompting: no password can
        //    repair a truncated file, and an empty one is just as short.
        let size = inspect_input_file(encrypted_path)?;
        if size < MIN_FRAME_LEN as u64 {
            return Err(TarSealError::Corrupt(format!(
                "{} is {size} bytes, below the minimum frame size of {MIN_FRAME_LEN}",
                encrypted_path.display()
            )));
        }
        let data = fs::read(encrypted_path)?;
        let frame = Frame::parse(&data)?;
        self.check_recorded_ciphertext(encrypted_path, &data);

        // 2. Password attempts.
        let (attempts, plaintext) = self.run_attempts(&frame)?;

        // Only a verified plaintext ever reaches the disk.
        let output_path = decrypted_path_for(encrypted_path);
        let mut out = AtomicOutput::create(&output_path)?;
        out.write_all(&plaintext)?;
        let output_path = out.commit()?;
        drop(plaintext);

        // 3. Integrity corroboration (never fatal).
        let integrity = if self.verify {
            self.corroborate(encrypted_path, &output_path)
        } else {
            IntegrityStatus::Skipped
        };

        Ok(DecryptReport {
            output: output_path,
            attempts,
            integrity,
        })
    }

    fn run_attempts(&mut self, frame: &Frame<'_>) -> Result<(u32, Vec<u8>)> {
        let max = self.policy.max_attempts.max(1);
        let mut state = DecryptState::AwaitingPassword { attempt: 1 };

        loop {
            state = match state {
                DecryptState::AwaitingPassword { attempt } => {
                    // Cancel or empty entry aborts without using an attempt.
                    let secret = self.input.acquire(false)?;
                    DecryptState::Decrypting { attempt, secret }
                }
                DecryptState::Decrypting { attempt, secret } => {
                    let key = derive_key(secret.as_bytes(), frame.salt)?;
                    drop(secret);
                    match open(&key, frame.nonce, frame.ciphertext) {
                        Ok(plaintext) => DecryptState::Success { attempt, plaintext },
                        Err(TarSealError::WrongPasswordOrTampered) => {
                            DecryptState::WrongPasswordOrTampered { attempt }
                        }
                        Err(e) => return Err(e),
                    }
                }
                DecryptState::WrongPasswordOrTampered { attempt } if attempt < max => {
                    let delay = self.policy.delay_for(attempt);
                    tracing::warn!(
                        attempt,
                        max_attempts = max,
                        delay_ms = delay.as_millis() as u64,
                        "decryption failed (wrong password or tampered file), retrying"
                    );
                    (self.sleeper)(delay);
                    DecryptState::AwaitingPassword {
                        attempt: attempt + 1,
                    }
                }
                DecryptState::WrongPasswordOrTampered { attempt } => {
                    tracing::error!(attempt, "maximum password attempts exceeded");
                    return Err(TarSealError::MaxAttemptsExceeded(attempt));
                }
                DecryptState::Success { attempt, plaintext } => return Ok((attempt, plaintext)),
            };
        }
    }

    /// Warn when the `.enc` file no longer matches the hash recorded at
    /// encryption time. The authentication tag still decides.
    fn check_recorded_ciphertext(&self, encrypted_path: &Path, data: &[u8]) {
        let key = store_key(encrypted_path);
        match self.store.read_stored_hash(&key) {
            Ok(Some(expected)) if !digests_match(&expected, &sha256_hex(data)) => {
                tracing::warn!(
                    file = %key,
                    "encrypted file differs from the hash recorded at encryption time"
                );
            }
            Ok(_) => {}
            Err(e) => tracing::debug!(file = %key, error = %e, "no encrypted-file hash available"),
        }
    }

    fn corroborate(&mut self, encrypted_path: &Path, output_path: &Path) -> IntegrityStatus {
        let original = store_key(&original_path_for(encrypted_path));
        let decrypted = store_key(output_path);

        let actual = match sha256_file(output_path) {
            Ok(hash) => hash,
            Err(e) => {
                tracing::error!(file = %decrypted, error = %e, "could not hash decrypted file");
                return IntegrityStatus::Unavailable;
            }
        };

        let status = match self.store.read_stored_hash(&original) {
            Ok(Some(expected)) if digests_match(&expected, &actual) => {
                tracing::info!(original = %original, "integrity verified: SHA-256 match");
                IntegrityStatus::Verified
            }
            Ok(Some(expected)) => {
                let mismatch = TarSealError::IntegrityMismatch {
                    file: decrypted.clone(),
                    expected: expected.clone(),
                    actual: actual.clone(),
                };
                tracing::warn!(error = %mismatch, "possible corruption or tampering");
                IntegrityStatus::Mismatch {
                    expected,
                    actual: actual.clone(),
                }
            }
            Ok(None) => {
                tracing::info!(original = %original, "no stored hash, integrity not corroborated");
                IntegrityStatus::NoBaseline
            }
            Err(e) => {
                tracing::error!(original = %original, error = %e, "integrity lookup failed");
                IntegrityStatus::Unavailable
            }
        };

        if self.record_hashes {
            if let Err(e) = self.store.write_stored_hash(&decrypted, &actual) {
                tracing::warn!(file = %decrypted, error = %e, "failed to record SHA-256");
            }
        }

        status
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn prompt(&self) -> &P {
        self.input.prompt()
    }
}
