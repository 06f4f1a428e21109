//! Password acquisition with guaranteed memory hygiene.
//!
//! A password lives in a [`Secret`]: an owned byte buffer that is
//! overwritten with zeros when it is dropped. Dropping happens on every
//! exit path, including early returns and panics unwinding through the
//! scope that owns it, so no caller has to remember to wipe anything.

pub mod prompt;

use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::errors::{Result, TarSealError};

pub use prompt::{PasswordPrompt, ScriptedPrompt, TerminalPrompt, PASSWORD_ENV_VAR};

const ENCRYPT_PROMPT: &str = "Enter file encryption password";
const CONFIRM_PROMPT: &str = "Confirm encryption password";
const DECRYPT_PROMPT: &str = "Enter file decryption password";

/// A password held in mutable memory, zeroed on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Secret {
    bytes: Box<[u8]>,
}

impl Secret {
    /// Take ownership of a prompt entry. The entry's own buffer is
    /// wiped when `entry` goes out of scope here.
    fn from_entry(entry: Zeroizing<String>) -> Self {
        Self {
            bytes: entry.as_bytes().to_vec().into_boxed_slice(),
        }
    }

    /// The password bytes, for key derivation only.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    fn matches(&self, other: &Secret) -> bool {
        self.bytes.ct_eq(&other.bytes).into()
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self {
            bytes: value.as_bytes().to_vec().into_boxed_slice(),
        }
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret([REDACTED])")
    }
}

/// Acquires passwords from a [`PasswordPrompt`].
pub struct SecretInput<P> {
    prompt: P,
}

impl<P: PasswordPrompt> SecretInput<P> {
    pub fn new(prompt: P) -> Self {
        Self { prompt }
    }

    /// Prompt for a password, optionally asking for it twice.
    ///
    /// - Empty or whitespace-only entry → `EmptyPassword`.
    /// - Confirmation differs → `ConfirmationMismatch`.
    ///
    /// Neither case is retried here; the caller decides whether to ask
    /// again. Both the primary and the confirmation buffers are wiped
    /// before this returns an error.
    pub fn acquire(&mut self, require_confirmation: bool) -> Result<Secret> {
        let first_prompt = if require_confirmation {
            ENCRYPT_PROMPT
        } else {
            DECRYPT_PROMPT
        };

        let entry = self.prompt.read_password(first_prompt)?;
        if entry.trim().is_empty() {
            tracing::error!("empty password rejected");
            return Err(TarSealError::EmptyPassword);
        }
        let secret = Secret::from_entry(entry);

        if require_confirmation {
            let confirm = Secret::from_entry(self.prompt.read_password(CONFIRM_PROMPT)?);
            if !secret.matches(&confirm) {
                tracing::error!("password confirmation failed");
                return Err(TarSealError::ConfirmationMismatch);
            }
            tracing::info!("password confirmed");
        }

        Ok(secret)
    }

    /// Scoped form of [`acquire`](Self::acquire): the secret is only
    /// reachable inside `f` and is wiped as soon as `f` returns or
    /// unwinds.
    pub fn with_secret<R>(
        &mut self,
        require_confirmation: bool,
        f: impl FnOnce(&Secret) -> R,
    ) -> Result<R> {
        let secret = self.acquire(require_confirmation)?;
        Ok(f(&secret))
    }

    pub fn prompt(&self) -> &P {
        &self.prompt
    }
}
