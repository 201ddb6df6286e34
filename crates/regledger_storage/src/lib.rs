//! # regledger Storage
//!
//! File-level services underneath regledger ledgers.
//!
//! This crate knows nothing about rows or schemas; it moves bytes and
//! coordinates writers:
//!
//! - [`LockManager`] - advisory, exclusive, per-file marker locks with
//!   bounded retry
//! - [`BackupManager`] - best-effort, timestamped pre-mutation snapshots
//! - [`read_all`], [`write_atomic`], [`append_row`] - whole-file I/O
//!
//! ## Mutation protocol
//!
//! Every mutation of a ledger file follows the same shape:
//!
//! ```no_run
//! use regledger_storage::{write_atomic, BackupManager, LockManager, StorageError};
//! use std::path::Path;
//!
//! let path = Path::new("db/Birth_Records.csv");
//! let locks = LockManager::default();
//! let backups = BackupManager::new("db/backups");
//!
//! locks.with_lock(path, || {
//!     backups.snapshot(path);
//!     write_atomic(path, b"ID,STATUS\n")?;
//!     Ok::<_, StorageError>(())
//! })?;
//! # Ok::<(), StorageError>(())
//! ```
//!
//! Reads never take the lock.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backup;
mod error;
mod file;
mod lock;

pub use backup::{BackupManager, BACKUP_EXTENSION};
pub use error::{StorageError, StorageResult};
pub use file::{append_row, read_all, write_atomic};
pub use lock::{LockGuard, LockManager, LockOptions, LOCK_SUFFIX};
