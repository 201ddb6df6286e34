//! Advisory marker-file locking.
//!
//! A ledger file `<path>` is locked by creating `<path>.lock` with
//! `create_new`, which fails if the marker already exists. The marker's
//! existence is the lock; its content (the holder's process and thread id)
//! is diagnostic only.
//!
//! ```text
//! <data_dir>/
//! ├─ Users_Accounts_Information.csv
//! ├─ Users_Accounts_Information.csv.lock   # present only while held
//! └─ ...
//! ```
//!
//! There is no owner-liveness check: a process that dies while holding a
//! marker leaves it behind, and it must be removed out of band (see
//! [`LockManager::clear_stale`]).

use crate::error::{StorageError, StorageResult};
use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

/// Suffix appended to a ledger path to form its lock marker.
pub const LOCK_SUFFIX: &str = ".lock";

/// Retry policy for lock acquisition.
///
/// Acquisition makes at most `max_retries` attempts and sleeps `delay`
/// after each failed one. There is no backoff and no jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockOptions {
    /// Maximum number of acquisition attempts.
    pub max_retries: u32,
    /// Fixed wait after each failed attempt.
    pub delay: Duration,
}

impl Default for LockOptions {
    fn default() -> Self {
        Self {
            max_retries: 50,
            delay: Duration::from_millis(100),
        }
    }
}

impl LockOptions {
    /// Creates lock options.
    #[must_use]
    pub const fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }
}

/// Serializes mutating access to ledger files.
///
/// The manager is stateless apart from its retry policy; all state lives in
/// the marker files, so separate processes sharing a data directory exclude
/// each other too.
#[derive(Debug, Clone, Default)]
pub struct LockManager {
    options: LockOptions,
}

impl LockManager {
    /// Creates a lock manager with the given retry policy.
    #[must_use]
    pub fn new(options: LockOptions) -> Self {
        Self { options }
    }

    /// Returns the retry policy.
    #[must_use]
    pub fn options(&self) -> LockOptions {
        self.options
    }

    /// Returns the marker path for a ledger file.
    #[must_use]
    pub fn marker_path(path: &Path) -> PathBuf {
        let mut marker = OsString::from(path.as_os_str());
        marker.push(LOCK_SUFFIX);
        PathBuf::from(marker)
    }

    /// Acquires the lock for `path`, retrying while it is held elsewhere.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::LockTimeout`] once the retry budget is spent,
    /// or an I/O error if the marker cannot be created for any reason other
    /// than already existing. No marker is left behind on failure.
    pub fn acquire(&self, path: &Path) -> StorageResult<LockGuard> {
        let attempts = self.options.max_retries;
        for attempt in 1..=attempts {
            if let Some(guard) = Self::try_acquire(path)? {
                debug!(path = %path.display(), attempt, "lock acquired");
                return Ok(guard);
            }
            debug!(path = %path.display(), attempt, "lock busy, retrying");
            thread::sleep(self.options.delay);
        }
        Err(StorageError::lock_timeout(path, attempts))
    }

    /// Makes a single acquisition attempt.
    ///
    /// Returns `Ok(None)` if another holder owns the marker.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the marker cannot be created or written.
    pub fn try_acquire(path: &Path) -> StorageResult<Option<LockGuard>> {
        let marker = Self::marker_path(path);
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&marker) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        // From here on the marker is ours; dropping the guard removes it
        // if writing the holder id fails.
        let guard = LockGuard {
            marker,
            released: false,
        };
        file.write_all(holder_id().as_bytes())?;
        file.sync_all()?;
        Ok(Some(guard))
    }

    /// Runs `f` while holding the lock for `path`.
    ///
    /// The lock is released on every exit path, including when `f` fails.
    ///
    /// # Errors
    ///
    /// Returns the acquisition error, or whatever `f` returns.
    pub fn with_lock<T, E, F>(&self, path: &Path, f: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: From<StorageError>,
    {
        let guard = self.acquire(path)?;
        let result = f();
        guard.release();
        result
    }

    /// Returns true if a marker currently exists for `path`.
    #[must_use]
    pub fn is_locked(path: &Path) -> bool {
        Self::marker_path(path).exists()
    }

    /// Returns the holder id recorded in the marker, if any.
    #[must_use]
    pub fn holder(path: &Path) -> Option<String> {
        fs::read_to_string(Self::marker_path(path)).ok()
    }

    /// Removes a marker left behind by a crashed holder.
    ///
    /// Returns true if a marker was removed. Only call this when no live
    /// process can be holding the lock.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the marker exists but cannot be removed.
    pub fn clear_stale(path: &Path) -> StorageResult<bool> {
        match fs::remove_file(Self::marker_path(path)) {
            Ok(()) => {
                warn!(path = %path.display(), "cleared stale lock marker");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// Proof of holding a ledger lock.
///
/// Dropping the guard releases the lock. Release never fails: a missing
/// marker is fine and any other removal error is logged.
#[derive(Debug)]
pub struct LockGuard {
    marker: PathBuf,
    released: bool,
}

impl LockGuard {
    /// Returns the path of the marker file this guard owns.
    #[must_use]
    pub fn marker_path(&self) -> &Path {
        &self.marker
    }

    /// Releases the lock now.
    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        match fs::remove_file(&self.marker) {
            Ok(()) => debug!(marker = %self.marker.display(), "lock released"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                marker = %self.marker.display(),
                error = %e,
                "failed to remove lock marker"
            ),
        }
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        self.release_inner();
    }
}

fn holder_id() -> String {
    format!("{}:{:?}", std::process::id(), thread::current().id())
}
