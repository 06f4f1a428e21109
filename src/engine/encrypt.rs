//! `EncryptionEngine`: plaintext file → `<file>.enc`.

use std::fs;
use std::path::{Path, PathBuf};

use super::output::AtomicOutput;
use super::{encrypted_path_for, log_failure, store_key, validate_input_file};
use crate::crypto::{derive_key, frame, generate_nonce, generate_salt, seal, sha256_file, sha256_hex};
use crate::errors::Result;
use crate::metadata::HashStore;
use crate::secret::{PasswordPrompt, SecretInput};

/// Encrypts files with a confirmed password.
///
/// On success the SHA-256 of the original content is recorded in the
/// hash store under the original file name, and the SHA-256 of the
/// `.enc` file under its own name. Store failures are logged only.
pub struct EncryptionEngine<P, S> {
    input: SecretInput<P>,
    store: S,
    record_hashes: bool,
}

impl<P: PasswordPrompt, S: HashStore> EncryptionEngine<P, S> {
    pub fn new(prompt: P, store: S) -> Self {
        Self {
            input: SecretInput::new(prompt),
            store,
            record_hashes: true,
        }
    }

    /// Turn hash recording on or off (on by default).
    pub fn record_hashes(mut self, enabled: bool) -> Self {
        self.record_hashes = enabled;
        self
    }

    /// Encrypt `input_path` to `<input_path>.enc`.
    ///
    /// Every failure is logged and reported as `false`.
    pub fn encrypt(&mut self, input_path: &Path) -> bool {
        match self.try_encrypt(input_path) {
            Ok(output) => {
                tracing::info!(
                    file = %store_key(&output),
                    path = %output.display(),
                    "encryption completed"
                );
                true
            }
            Err(e) => {
                log_failure("encryption", input_path, &e);
                false
            }
        }
    }

    /// Like [`encrypt`](Self::encrypt) but returns the typed error, or
    /// the path of the written `.enc` file.
    pub fn try_encrypt(&mut self, input_path: &Path) -> Result<PathBuf> {
        // 1. Validate before asking for anything.
        let size = validate_input_file(input_path)?;
        tracing::info!(file = %store_key(input_path), bytes = size, "encrypting with AES-256-GCM");

        // 2. Password with confirmation. Nothing has been written yet.
        let secret = self.input.acquire(true)?;

        // 3. Read the plaintext and hash it.
        let plaintext = fs::read(input_path)?;
        let original_hash = sha256_hex(&plaintext);

        // 4-5. Fresh salt and nonce, then the key.
        let salt = generate_salt();
        let nonce = generate_nonce();
        let key = derive_key(secret.as_bytes(), &salt)?;
        drop(secret);
        tracing::debug!("derived key with PBKDF2-HMAC-SHA256");

        // 6. Encrypt.
        let ciphertext = seal(&key, &nonce, &plaintext)?;
        drop(key);
        tracing::debug!(
            plaintext = plaintext.len(),
            ciphertext = ciphertext.len(),
            "encrypted (includes auth tag)"
        );

        // 7. Write salt || nonce || ciphertext atomically.
        let output_path = encrypted_path_for(input_path);
        let mut out = AtomicOutput::create(&output_path)?;
        out.write_all(&frame::encode(&salt, &nonce, &ciphertext))?;
        let output_path = out.commit()?;

        // 8. Integrity records (best effort).
        if self.record_hashes {
            self.record(&store_key(input_path), &original_hash);
            match sha256_file(&output_path) {
                Ok(enc_hash) => self.record(&store_key(&output_path), &enc_hash),
                Err(e) => tracing::warn!(error = %e, "could not hash encrypted file"),
            }
        }

        Ok(output_path)
    }

    fn record(&mut self, filename: &str, hash: &str) {
        match self.store.write_stored_hash(filename, hash) {
            Ok(()) => tracing::debug!(file = %filename, "recorded SHA-256"),
            Err(e) => tracing::warn!(file = %filename, error = %e, "failed to record SHA-256"),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn prompt(&self) -> &P {
        self.input.prompt()
    }
}
