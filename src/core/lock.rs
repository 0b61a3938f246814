//! Cross-process run lock.
//!
//! One lock guards one whole invocation of one operation over one input set.
//! The lock is an OS-level exclusive advisory lock (via [`fs4`]) on a file
//! named after the [`LockKey`]; the operating system drops it when the owning
//! process exits, so a crashed build never leaves a stale lock behind.

use crate::constants::{MAX_BACKOFF_DELAY_MS, STARTING_BACKOFF_DELAY_MS};
use crate::models::LockKey;
use fs4::fs_std::FileExt;
use log::{debug, trace};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LockError {
    #[error("Another instance of ttbuild is still running after {} sec", .timeout.as_secs())]
    Timeout { key: LockKey, timeout: Duration },
    #[error("Could not open lock file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A held run lock. The lock is released when this value is dropped.
#[derive(Debug)]
pub struct RunLock {
    file: File,
    key: LockKey,
    path: PathBuf,
}

impl RunLock {
    /// Acquires the lock for `key`, waiting at most `timeout`.
    ///
    /// Attempts are non-blocking and retried with exponential backoff
    /// (10ms, 20ms, 40ms... capped at 500ms). A zero timeout makes exactly one
    /// attempt.
    ///
    /// # Errors
    ///
    /// - [`LockError::Io`] if the lock directory or file cannot be created.
    /// - [`LockError::Timeout`] if another holder kept the lock for the whole
    ///   timeout.
    pub fn acquire(lock_dir: &Path, key: &LockKey, timeout: Duration) -> Result<Self, LockError> {
        fs::create_dir_all(lock_dir).map_err(|source| LockError::Io {
            path: lock_dir.to_path_buf(),
            source,
        })?;

        let path = lock_dir.join(key.file_name());
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|source| LockError::Io {
                path: path.clone(),
                source,
            })?;

        debug!("Waiting for {} lock '{}'", key.operation, path.display());
        let start = Instant::now();
        let mut delay = Duration::from_millis(STARTING_BACKOFF_DELAY_MS);
        let max_delay = Duration::from_millis(MAX_BACKOFF_DELAY_MS);

        loop {
            match FileExt::try_lock_exclusive(&file) {
                Ok(true) => {
                    debug!(
                        "Acquired {} lock after {} ms",
                        key.operation,
                        start.elapsed().as_millis()
                    );
                    return Ok(Self {
                        file,
                        key: key.clone(),
                        path,
                    });
                }
                Ok(false) => trace!("Lock '{}' is busy", path.display()),
                Err(e) => trace!("Lock attempt on '{}' failed: {}", path.display(), e),
            }

            let remaining = timeout.saturating_sub(start.elapsed());
            if remaining.is_zero() {
                return Err(LockError::Timeout {
                    key: key.clone(),
                    timeout,
                });
            }
            std::thread::sleep(delay.min(remaining));
            delay = (delay * 2).min(max_delay);
        }
    }

    pub fn key(&self) -> &LockKey {
        &self.key
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        // The lock file stays on disk: removing it would let a waiter holding
        // the old inode and a newcomer creating a fresh one both "own" the lock.
        if let Err(e) = FileExt::unlock(&self.file) {
            debug!("Failed to unlock '{}': {}", self.path.display(), e);
        } else {
            debug!("Released {} lock", self.key.operation);
        }
    }
}
