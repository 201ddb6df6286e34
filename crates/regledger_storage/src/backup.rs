//! Pre-mutation ledger snapshots.
//!
//! Before a ledger file is mutated, its current bytes are copied verbatim
//! into the backup directory:
//!
//! ```text
//! <backup_dir>/
//! ├─ Birth_Records.csv.2026-03-01T09-15-02-481Z.bak
//! ├─ Birth_Records.csv.2026-03-01T09-17-40-007Z.bak
//! └─ Users_Accounts_Information.csv.2026-03-01T09-16-11-930Z.bak
//! ```
//!
//! Snapshots are best-effort. A snapshot that cannot be taken is logged and
//! skipped; it never blocks the mutation it precedes. Snapshots are never
//! evicted.

use crate::error::StorageResult;
use crate::file::remove_on_error;
use chrono::{DateTime, SecondsFormat, Utc};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Extension given to snapshot files.
pub const BACKUP_EXTENSION: &str = "bak";

/// Upper bound on name-collision suffixes tried within one millisecond.
const MAX_COLLISION_SUFFIX: u32 = 100;

/// Takes and lists timestamped snapshots of ledger files.
#[derive(Debug, Clone)]
pub struct BackupManager {
    backup_dir: PathBuf,
}

impl BackupManager {
    /// Creates a backup manager writing into `backup_dir`.
    ///
    /// The directory is created on first snapshot.
    #[must_use]
    pub fn new(backup_dir: impl Into<PathBuf>) -> Self {
        Self {
            backup_dir: backup_dir.into(),
        }
    }

    /// Returns the backup directory.
    #[must_use]
    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Snapshots `path`, swallowing any failure.
    ///
    /// Returns `None` if the file does not exist yet or the snapshot could
    /// not be taken (the reason is logged).
    pub fn snapshot(&self, path: &Path) -> Option<PathBuf> {
        match self.try_snapshot(path) {
            Ok(created) => created,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "backup failed, continuing without it");
                None
            }
        }
    }

    /// Snapshots `path`, reporting failures.
    ///
    /// Returns `Ok(None)` if the file does not exist, or if the backup volume
    /// lacks space for the copy.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if reading the source or writing the copy fails.
    pub fn try_snapshot(&self, path: &Path) -> StorageResult<Option<PathBuf>> {
        let data = match fs::read(path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        fs::create_dir_all(&self.backup_dir)?;

        if let Ok(available) = fs2::available_space(&self.backup_dir) {
            if available < data.len() as u64 {
                warn!(
                    path = %path.display(),
                    needed = data.len(),
                    available,
                    "not enough space for backup, skipping"
                );
                return Ok(None);
            }
        }

        let base = file_name(path);
        let stamp = timestamp_component(Utc::now());
        let (target, mut file) = self.create_unique(&base, &stamp)?;
        let written = file.write_all(&data).and_then(|()| file.sync_all());
        drop(file);
        remove_on_error(&target, written)?;

        info!(path = %path.display(), backup = %target.display(), bytes = data.len(), "backup created");
        Ok(Some(target))
    }

    /// Lists snapshots of `path`, oldest first.
    ///
    /// Snapshots from the same millisecond order by collision suffix, with
    /// the unsuffixed one first.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the backup directory cannot be read.
    pub fn list(&self, path: &Path) -> StorageResult<Vec<PathBuf>> {
        let entries = match fs::read_dir(&self.backup_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let prefix = format!("{}.", file_name(path));
        let suffix = format!(".{BACKUP_EXTENSION}");

        let mut backups = Vec::new();
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            let stamp = name
                .strip_prefix(&prefix)
                .and_then(|rest| rest.strip_suffix(&suffix))
                .filter(|stamp| stamp.starts_with(|c: char| c.is_ascii_digit()));
            if let Some(stamp) = stamp {
                let (at, collision) = snapshot_order(stamp);
                backups.push(((at.to_string(), collision), entry.path()));
            }
        }
        backups.sort();
        Ok(backups.into_iter().map(|(_, path)| path).collect())
    }

    /// Returns the snapshot file name for `file_name` taken at `at`.
    #[must_use]
    pub fn backup_file_name(file_name: &str, at: DateTime<Utc>) -> String {
        format!("{file_name}.{}.{BACKUP_EXTENSION}", timestamp_component(at))
    }

    fn create_unique(&self, base: &str, stamp: &str) -> StorageResult<(PathBuf, fs::File)> {
        let mut attempt = 0;
        loop {
            let name = if attempt == 0 {
                format!("{base}.{stamp}.{BACKUP_EXTENSION}")
            } else {
                format!("{base}.{stamp}-{attempt}.{BACKUP_EXTENSION}")
            };
            let target = self.backup_dir.join(name);
            match OpenOptions::new().write(true).create_new(true).open(&target) {
                Ok(file) => return Ok((target, file)),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists && attempt < MAX_COLLISION_SUFFIX => {
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// ISO-8601 UTC timestamp with `:` and `.` replaced so it is filename-safe.
fn timestamp_component(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-")
}

/// Splits `<stamp>[-<n>]` into the timestamp and the collision suffix.
fn snapshot_order(stamp: &str) -> (&str, u32) {
    match stamp.rsplit_once('-') {
        Some((at, n)) if at.ends_with('Z') => (at, n.parse().unwrap_or(u32::MAX)),
        _ => (stamp, 0),
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "ledger".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    #[test]
    fn file_name_is_filesystem_safe() {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 9, 15, 2).unwrap();
        let name = BackupManager::backup_file_name("Birth_Records.csv", at);
        assert_eq!(name, "Birth_Records.csv.2026-03-01T09-15-02-000Z.bak");
    }

    #[test]
    fn missing_source_is_noop() {
        let dir = tempdir().unwrap();
        let manager = BackupManager::new(dir.path().join("backups"));

        assert_eq!(manager.snapshot(&dir.path().join("absent.csv")), None);
        assert!(!dir.path().join("backups").exists());
    }

    #[test]
    fn snapshot_copies_bytes_verbatim() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("ledger.csv");
        fs::write(&source, b"ID,NAME\n1,\"a,b\"\n").unwrap();

        let manager = BackupManager::new(dir.path().join("backups"));
        let backup = manager.snapshot(&source).unwrap();

        assert_eq!(fs::read(&backup).unwrap(), fs::read(&source).unwrap());
        assert!(backup.starts_with(manager.backup_dir()));
    }

    #[test]
    fn rapid_snapshots_do_not_overwrite() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("ledger.csv");
        let manager = BackupManager::new(dir.path().join("backups"));

        for i in 0..5 {
            fs::write(&source, format!("ID\n{i}\n")).unwrap();
            manager.snapshot(&source).unwrap();
        }

        let backups = manager.list(&source).unwrap();
        assert_eq!(backups.len(), 5);
        let mut contents: Vec<_> = backups
            .iter()
            .map(|p| fs::read_to_string(p).unwrap())
            .collect();
        contents.sort();
        contents.dedup();
        assert_eq!(contents.len(), 5);
    }

    #[test]
    fn unwritable_backup_dir_is_swallowed() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("ledger.csv");
        fs::write(&source, b"ID\n1\n").unwrap();

        // A regular file where the directory should be.
        let blocker = dir.path().join("backups");
        fs::write(&blocker, b"not a directory").unwrap();

        let manager = BackupManager::new(&blocker);
        assert!(manager.try_snapshot(&source).is_err());
        assert_eq!(manager.snapshot(&source), None);
    }

    #[test]
    fn list_only_matches_own_ledger() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.csv");
        let b = dir.path().join("a.csv.old");
        fs::write(&a, b"X\n").unwrap();
        fs::write(&b, b"Y\n").unwrap();

        let manager = BackupManager::new(dir.path().join("backups"));
        manager.snapshot(&a).unwrap();
        manager.snapshot(&b).unwrap();

        assert_eq!(manager.list(&a).unwrap().len(), 1);
        assert_eq!(manager.list(&b).unwrap().len(), 1);
    }

    #[test]
    fn list_orders_same_millisecond_by_suffix() {
        let dir = tempdir().unwrap();
        let backup_dir = dir.path().join("backups");
        fs::create_dir_all(&backup_dir).unwrap();
        let names = [
            "a.csv.2026-03-01T09-15-02-482Z.bak",
            "a.csv.2026-03-01T09-15-02-481Z-10.bak",
            "a.csv.2026-03-01T09-15-02-481Z-2.bak",
            "a.csv.2026-03-01T09-15-02-481Z.bak",
            "a.csv.2026-03-01T09-15-02-481Z-1.bak",
        ];
        for name in names {
            fs::write(backup_dir.join(name), b"X\n").unwrap();
        }

        let manager = BackupManager::new(&backup_dir);
        let listed: Vec<_> = manager
            .list(&dir.path().join("a.csv"))
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            listed,
            [
                "a.csv.2026-03-01T09-15-02-481Z.bak",
                "a.csv.2026-03-01T09-15-02-481Z-1.bak",
                "a.csv.2026-03-01T09-15-02-481Z-2.bak",
                "a.csv.2026-03-01T09-15-02-481Z-10.bak",
                "a.csv.2026-03-01T09-15-02-482Z.bak",
            ]
        );
    }

    #[test]
    fn interrupted_snapshot_is_not_listed() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("ledger.csv");
        let manager = BackupManager::new(dir.path().join("backups"));
        fs::create_dir_all(manager.backup_dir()).unwrap();

        let partial = manager
            .backup_dir()
            .join(BackupManager::backup_file_name("ledger.csv", Utc::now()));
        fs::write(&partial, b"ID,NA").unwrap();
        let failed: StorageResult<()> = remove_on_error(&partial, Err(io::Error::other("no space left")));

        assert!(failed.is_err());
        assert!(manager.list(&source).unwrap().is_empty());
    }
}
