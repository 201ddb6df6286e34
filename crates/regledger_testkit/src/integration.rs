//! Cross-crate integration scenarios.
//!
//! Exercises the codec, the lock and backup managers and the ledgers
//! together, against real files in a temporary directory.

use regledger_codec::{parse_all, Record, Schema};
use regledger_storage::{read_all, BackupManager, LockGuard, LockManager};
use std::path::Path;

/// Takes a ledger's lock out of band, as a competing writer would.
pub fn hold_lock(ledger_path: &Path) -> LockGuard {
    LockManager::try_acquire(ledger_path)
        .expect("Failed to create lock marker")
        .expect("Ledger is already locked")
}

/// Decodes a ledger file straight from disk.
pub fn read_ledger(ledger_path: &Path) -> (Schema, Vec<Record>) {
    match read_all(ledger_path).expect("Failed to read ledger") {
        Some(bytes) => parse_all(&bytes).expect("Ledger is malformed"),
        None => (Schema::empty(), Vec::new()),
    }
}

/// Number of snapshots taken of a ledger so far.
pub fn backup_count(backups: &BackupManager, ledger_path: &Path) -> usize {
    backups
        .list(ledger_path)
        .expect("Failed to list backups")
        .len()
}
