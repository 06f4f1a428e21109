//! `tarseal encrypt`: encrypt a backup archive to `<file>.enc`.

use std::path::Path;

use crate::cli::output;
use crate::cli::{hash_store, Cli};
use crate::config::Settings;
use crate::engine::{encrypted_path_for, EncryptionEngine};
use crate::errors::{Result, TarSealError};
use crate::secret::TerminalPrompt;

/// Execute the `encrypt` command.
pub fn execute(cli: &Cli, settings: &Settings, file: &Path) -> Result<()> {
    let store = hash_store(cli, settings);

    let mut engine = EncryptionEngine::new(TerminalPrompt, store)
        .record_hashes(settings.record_hashes);

    if !engine.encrypt(file) {
        return Err(TarSealError::CommandFailed(format!(
            "could not encrypt {} (see log output above)",
            file.display()
        )));
    }

    output::success(&format!(
        "Encrypted file created: {}",
        encrypted_path_for(file).display()
    ));
    Ok(())
}
