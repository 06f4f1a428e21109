//! `tarseal decrypt`: recover `<stem>-decrypted` from a `.enc` file.

use std::path::Path;

use crate::cli::output;
use crate::cli::{hash_store, Cli};
use crate::config::Settings;
use crate::engine::{decrypted_path_for, DecryptionEngine};
use crate::errors::{Result, TarSealError};
use crate::secret::TerminalPrompt;

/// Execute the `decrypt` command.
pub fn execute(cli: &Cli, settings: &Settings, file: &Path) -> Result<()> {
    let store = hash_store(cli, settings);

    let mut engine = DecryptionEngine::new(TerminalPrompt, store)
        .verify_integrity(settings.verify_after_decrypt)
        .record_hashes(settings.record_hashes);

    if !engine.decrypt(file) {
        return Err(TarSealError::CommandFailed(format!(
            "could not decrypt {} (see log output above)",
            file.display()
        )));
    }

    output::success(&format!(
        "Decrypted file saved as: {}",
        decrypted_path_for(file).display()
    ));
    Ok(())
}
