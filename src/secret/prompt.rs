//! Password sources.
//!
//! `SecretInput` never talks to the terminal directly; it asks a
//! `PasswordPrompt`. The terminal implementation is used by the CLI,
//! the scripted one by automation and tests.

use std::collections::VecDeque;
use std::io::ErrorKind;

use zeroize::Zeroizing;

use crate::errors::{Result, TarSealError};

/// Environment variable consulted before prompting (scripted runs).
pub const PASSWORD_ENV_VAR: &str = "TARSEAL_PASSWORD";

/// Something that can hand out a password for a given prompt text.
///
/// Implementations must not echo the entry and must return it wrapped
/// in `Zeroizing` so the temporary `String` is wiped on drop.
pub trait PasswordPrompt {
    fn read_password(&mut self, prompt: &str) -> Result<Zeroizing<String>>;
}

impl<T: PasswordPrompt + ?Sized> PasswordPrompt for &mut T {
    fn read_password(&mut self, prompt: &str) -> Result<Zeroizing<String>> {
        (**self).read_password(prompt)
    }
}

/// Non-echoing terminal prompt.
///
/// Checks `TARSEAL_PASSWORD` first (CI/cron friendly), then falls back
/// to an interactive `dialoguer` prompt.
#[derive(Debug, Clone, Default)]
pub struct TerminalPrompt;

impl PasswordPrompt for TerminalPrompt {
    fn read_password(&mut self, prompt: &str) -> Result<Zeroizing<String>> {
        // 1. Check the environment variable first.
        if let Ok(pw) = std::env::var(PASSWORD_ENV_VAR) {
            if !pw.is_empty() {
                return Ok(Zeroizing::new(pw));
            }
        }

        // 2. Fall back to the interactive prompt. Empty input is allowed
        //    through so the caller can reject it with a proper error.
        let pw = dialoguer::Password::new()
            .with_prompt(prompt)
            .allow_empty_password(true)
            .interact()
            .map_err(|e| match e {
                dialoguer::Error::IO(io)
                    if matches!(io.kind(), ErrorKind::Interrupted | ErrorKind::UnexpectedEof) =>
                {
                    TarSealError::UserCancelled
                }
                other => TarSealError::CommandFailed(format!("password prompt: {other}")),
            })?;
        Ok(Zeroizing::new(pw))
    }
}

/// Answers prompts from a fixed queue.
///
/// Once the queue is empty every further prompt is treated as the
/// user cancelling.
#[derive(Default)]
pub struct ScriptedPrompt {
    answers: VecDeque<Zeroizing<String>>,
    asked: Vec<String>,
}

impl ScriptedPrompt {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers
                .into_iter()
                .map(|s| Zeroizing::new(s.into()))
                .collect(),
            asked: Vec::new(),
        }
    }

    /// Prompt texts shown so far, in order.
    pub fn prompts(&self) -> &[String] {
        &self.asked
    }

    /// Number of answers not yet consumed.
    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl PasswordPrompt for ScriptedPrompt {
    fn read_password(&mut self, prompt: &str) -> Result<Zeroizing<String>> {
        self.asked.push(prompt.to_string());
        self.answers.pop_front().ok_or(TarSealError::UserCancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_prompt_yields_answers_in_order() {
        let mut p = ScriptedPrompt::new(["one", "two"]);
        assert_eq!(p.read_password("a").unwrap().as_str(), "one");
        assert_eq!(p.read_password("b").unwrap().as_str(), "two");
        assert_eq!(p.prompts(), ["a", "b"]);
        assert_eq!(p.remaining(), 0);
    }

    #[test]
    fn scripted_prompt_exhausted_is_cancel() {
        let mut p = ScriptedPrompt::new(Vec::<String>::new());
        assert!(matches!(
            p.read_password("x"),
            Err(TarSealError::UserCancelled)
        ));
    }

    #[test]
    fn mut_ref_forwards() {
        fn ask(mut source: impl PasswordPrompt) -> String {
            source.read_password("x").unwrap().to_string()
        }

        let mut p = ScriptedPrompt::new(["pw"]);
        assert_eq!(ask(&mut p), "pw");
        assert_eq!(p.prompts().len(), 1);
    }
}
