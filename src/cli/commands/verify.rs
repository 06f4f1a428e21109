//! `tarseal verify`: compare a file with its recorded SHA-256.

use std::path::Path;

use crate::cli::output;
use crate::cli::{hash_store, Cli};
use crate::config::Settings;
use crate::crypto::verify_hash;
use crate::engine::store_key;
use crate::errors::{Result, TarSealError};
use crate::metadata::HashStore;

/// Execute the `verify` command.
pub fn execute(cli: &Cli, settings: &Settings, file: &Path) -> Result<()> {
    let store = hash_store(cli, settings);
    let name = store_key(file);

    let Some(expected) = store.read_stored_hash(&name)? else {
        output::warning("No hash has been recorded for this file.");
        return Err(TarSealError::NoBaseline(name));
    };

    let actual = verify_hash(file, &expected)?;

    output::success(&format!("{name}: SHA-256 matches the recorded hash"));
    output::info(&format!("sha256 {actual}"));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::fs;
    use tempfile::TempDir;

    use crate::crypto::sha256_hex;
    use crate::metadata::JsonHashStore;

    fn cli_for(config: &Path) -> Cli {
        let dir = config.to_string_lossy().into_owned();
        Cli::try_parse_from(["tarseal", "--config-dir", dir.as_str(), "verify", "x"]).unwrap()
    }

    #[test]
    fn uses_the_settings_it_is_given() {
        let config = TempDir::new().unwrap();
        let work = TempDir::new().unwrap();
        let file = work.path().join("nightly.tar");
        fs::write(&file, b"nightly").unwrap();

        // No tarseal.toml on disk: only the passed-in settings name this store.
        let settings = Settings {
            metadata_file: "custom.json".into(),
            ..Settings::default()
        };
        let mut store = JsonHashStore::new(config.path().join("custom.json"));
        store
            .write_stored_hash("nightly.tar", &sha256_hex(b"nightly"))
            .unwrap();

        let cli = cli_for(config.path());
        assert!(execute(&cli, &settings, &file).is_ok());
        assert!(matches!(
            execute(&cli, &Settings::default(), &file),
            Err(TarSealError::NoBaseline(_))
        ));
    }

    #[test]
    fn changed_file_is_an_integrity_mismatch() {
        let config = TempDir::new().unwrap();
        let work = TempDir::new().unwrap();
        let file = work.path().join("a.tar");
        fs::write(&file, b"changed").unwrap();

        let settings = Settings::default();
        let mut store = JsonHashStore::new(settings.metadata_path(config.path()));
        store.write_stored_hash("a.tar", &sha256_hex(b"original")).unwrap();

        assert!(matches!(
            execute(&cli_for(config.path()), &settings, &file),
            Err(TarSealError::IntegrityMismatch { .. })
        ));
    }
}
