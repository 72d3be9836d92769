//! Advisory lock held while a snapshot file is read, changed, and written.

use crate::error::ErrorCode;
use fs2::FileExt;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

/// How long [`SnapshotLock::acquire_default`] waits before giving up.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("lock timed out after {waited:?} at {}", path.display())]
    Timeout { path: PathBuf, waited: Duration },

    #[error("lock I/O error: {0}")]
    Io(#[from] io::Error),
}

impl LockError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Timeout { .. } => ErrorCode::LockContention,
            Self::Io(_) => ErrorCode::LockFailed,
        }
    }
}

/// Lock file used for `snapshot`: the same path with `.lock` appended.
#[must_use]
pub fn lock_path(snapshot: &Path) -> PathBuf {
    let mut name: OsString = snapshot.file_name().map(OsString::from).unwrap_or_default();
    name.push(".lock");
    snapshot.with_file_name(name)
}

/// Exclusive lock on a snapshot's lock file. Released on drop.
#[derive(Debug)]
pub struct SnapshotLock {
    file: File,
    path: PathBuf,
}

impl SnapshotLock {
    /// Take the lock for `snapshot`, polling until `timeout` elapses.
    ///
    /// # Errors
    ///
    /// [`LockError::Timeout`] if another holder keeps the lock, or
    /// [`LockError::Io`] if the lock file cannot be opened.
    pub fn acquire(snapshot: &Path, timeout: Duration) -> Result<Self, LockError> {
        let path = lock_path(snapshot);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let start = Instant::now();
        loop {
            let file = OpenOptions::new()
                .create(true)
                .read(true)
                .write(true)
                .truncate(false)
                .open(&path)?;

            if file.try_lock_exclusive().is_ok() {
                tracing::trace!(path = %path.display(), "snapshot lock acquired");
                return Ok(Self { file, path });
            }

            if start.elapsed() >= timeout {
                return Err(LockError::Timeout {
                    path,
                    waited: start.elapsed(),
                });
            }
            thread::sleep(Duration::from_millis(10));
        }
    }

    /// [`acquire`](Self::acquire) with [`DEFAULT_LOCK_TIMEOUT`].
    ///
    /// # Errors
    ///
    /// As for [`acquire`](Self::acquire).
    pub fn acquire_default(snapshot: &Path) -> Result<Self, LockError> {
        Self::acquire(snapshot, DEFAULT_LOCK_TIMEOUT)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for SnapshotLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}
