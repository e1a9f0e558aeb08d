//! Single-instance ownership through an advisory lock file.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;
use tracing::debug;

const LOCK_FILE_NAME: &str = "mediagrab.lock";

/// Default lock path in the system temp directory.
pub(crate) fn default_lock_path() -> PathBuf {
    std::env::temp_dir().join(LOCK_FILE_NAME)
}

/// Held lock; released when dropped.
#[derive(Debug)]
pub(crate) struct InstanceLock {
    file: File,
    path: PathBuf,
}

impl InstanceLock {
    /// Takes the lock at `path`. `Ok(None)` means another process holds it.
    pub(crate) fn try_acquire(path: &Path) -> Result<Option<Self>> {
        let mut file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(path)
            .with_context(|| format!("cannot open lock file {}", path.display()))?;

        match file.try_lock_exclusive() {
            Ok(()) => {}
            Err(e) if is_contended(&e) => return Ok(None),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("cannot lock {}", path.display()));
            }
        }

        file.set_len(0)?;
        writeln!(file, "{}", std::process::id())?;
        debug!(path = %path.display(), "instance lock acquired");
        Ok(Some(Self {
            file,
            path: path.to_path_buf(),
        }))
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

fn is_contended(error: &io::Error) -> bool {
    error.kind() == fs2::lock_contended_error().kind() || error.kind() == io::ErrorKind::WouldBlock
}
