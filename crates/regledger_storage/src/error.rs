//! Error types for storage operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The lock marker stayed held for the whole retry budget.
    #[error("timed out acquiring lock on {} after {attempts} attempts", path.display())]
    LockTimeout {
        /// The ledger file that could not be locked.
        path: PathBuf,
        /// Number of attempts made.
        attempts: u32,
    },
}

impl StorageError {
    /// Creates a lock timeout error.
    pub fn lock_timeout(path: impl Into<PathBuf>, attempts: u32) -> Self {
        Self::LockTimeout {
            path: path.into(),
            attempts,
        }
    }

    /// Returns true if this is a [`StorageError::LockTimeout`].
    #[must_use]
    pub fn is_lock_timeout(&self) -> bool {
        matches!(self, Self::LockTimeout { .. })
    }
}
