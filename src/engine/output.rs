//! Scoped, atomic output files.
//!
//! Bytes are written to a hidden temp file next to the target and only
//! renamed into place on [`AtomicOutput::commit`]. If the guard is
//! dropped without committing (error, early return, panic) the temp
//! file is removed, so callers never see a half-written output.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::errors::Result;

pub(crate) struct AtomicOutput {
    target: PathBuf,
    tmp_path: PathBuf,
    file: Option<File>,
    committed: bool,
}

impl AtomicOutput {
    /// Open a temp file for `target` in the same directory, so the
    /// final rename stays on one filesystem.
    pub(crate) fn create(target: &Path) -> Result<Self> {
        let parent = target.parent().unwrap_or(Path::new("."));
        let tmp_path = parent.join(format!(
            ".{}.tmp",
            target.file_name().unwrap_or_default().to_string_lossy()
        ));

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);

        // Owner-only: the output is either ciphertext or a recovered backup.
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let file = options.open(&tmp_path)?;
        Ok(Self {
            target: target.to_path_buf(),
            tmp_path,
            file: Some(file),
            committed: false,
        })
    }

    pub(crate) fn write_all(&mut self, data: &[u8]) -> Result<()> {
        if let Some(file) = self.file.as_mut() {
            file.write_all(data)?;
        }
        Ok(())
    }

    /// Flush to disk and move the temp file over the target.
    pub(crate) fn commit(mut self) -> Result<PathBuf> {
        if let Some(file) = self.file.take() {
            file.sync_all()?;
        }
        fs::rename(&self.tmp_path, &self.target)?;
        self.committed = true;
        Ok(self.target.clone())
    }
}

impl Drop for AtomicOutput {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        self.file.take();
        match fs::remove_file(&self.tmp_path) {
            Ok(()) => tracing::info!(file = %self.target.display(), "cleaned up partial output"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::error!(
                file = %self.tmp_path.display(),
                error = %e,
                "failed to clean up partial output"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn commit_moves_bytes_into_place() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("out.enc");

        let mut out = AtomicOutput::create(&target).unwrap();
        out.write_all(b"abc").unwrap();
        out.write_all(b"def").unwrap();
        let written = out.commit().unwrap();

        assert_eq!(written, target);
        assert_eq!(fs::read(&target).unwrap(), b"abcdef");
        assert_eq!(entries(dir.path()), ["out.enc"]);
    }

    #[test]
    fn drop_without_commit_leaves_nothing() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("out.enc");

        {
            let mut out = AtomicOutput::create(&target).unwrap();
            out.write_all(b"partial").unwrap();
        }

        assert!(!target.exists());
        assert!(entries(dir.path()).is_empty());
    }

    #[test]
    fn commit_replaces_existing_target() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("out");
        fs::write(&target, b"old").unwrap();

        let mut out = AtomicOutput::create(&target).unwrap();
        out.write_all(b"new").unwrap();
        out.commit().unwrap();

        assert_eq!(fs::read(&target).unwrap(), b"new");
    }

    #[cfg(unix)]
    #[test]
    fn output_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let target = dir.path().join("out");
        let mut out = AtomicOutput::create(&target).unwrap();
        out.write_all(b"x").unwrap();
        out.commit().unwrap();

        let mode = fs::metadata(&target).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
