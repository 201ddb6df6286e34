//! Whole-file ledger I/O.
//!
//! Ledgers are read in full, appended to one row at a time, and rewritten
//! in full. A rewrite goes through a temporary sibling file that is renamed
//! over the original, so readers observe either the old or the new content
//! and never a partial write.

use crate::error::StorageResult;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Suffix of the temporary file used by [`write_atomic`].
const TEMP_SUFFIX: &str = ".tmp";

/// Reads the whole file, or `None` if it does not exist.
///
/// # Errors
///
/// Returns an I/O error for any failure other than the file being absent.
pub fn read_all(path: &Path) -> StorageResult<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(data) => Ok(Some(data)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Replaces the file's entire content.
///
/// Uses write-then-rename:
/// 1. Write to `<path>.tmp`
/// 2. Sync the temporary file
/// 3. Rename it over `path`
/// 4. Sync the parent directory so the rename is durable
///
/// # Errors
///
/// Returns an I/O error if any step fails. The original file is left
/// untouched if the failure happens before the rename.
pub fn write_atomic(path: &Path, data: &[u8]) -> StorageResult<()> {
    let temp_path = temp_path(path);

    let mut file = File::create(&temp_path)?;
    let written = file.write_all(data).and_then(|()| file.sync_all());
    drop(file);
    remove_on_error(&temp_path, written)?;
    remove_on_error(&temp_path, fs::rename(&temp_path, path))?;

    sync_parent(path)?;
    Ok(())
}

/// Appends `row` to the file, writing `header` first if the file is new
/// or empty.
///
/// If the existing content does not end with a line feed, one is written
/// before `row` so it cannot merge into the last field of the previous row.
///
/// Returns true if the file was created by this call.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be opened, written or synced.
pub fn append_row(path: &Path, header: &[u8], row: &[u8]) -> StorageResult<bool> {
    let mut options = OpenOptions::new();
    options.read(true).append(true);
    let (mut file, created) = match options.clone().create_new(true).open(path) {
        Ok(file) => (file, true),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => (options.open(path)?, false),
        Err(e) => return Err(e.into()),
    };

    if file.metadata()?.len() == 0 {
        file.write_all(header)?;
    } else if !ends_with_line_feed(&mut file)? {
        file.write_all(b"\n")?;
    }
    file.write_all(row)?;
    file.sync_all()?;

    if created {
        sync_parent(path)?;
    }
    Ok(created)
}

/// Removes `path` if `result` failed, then passes the result on.
///
/// Used for files that are worthless once a write into them fails part way.
pub(crate) fn remove_on_error<T>(path: &Path, result: io::Result<T>) -> StorageResult<T> {
    result.map_err(|e| {
        let _ = fs::remove_file(path);
        e.into()
    })
}

/// Checks the last byte of a non-empty file. Appends are unaffected by the
/// seek because the file is opened in append mode.
fn ends_with_line_feed(file: &mut File) -> io::Result<bool> {
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

fn temp_path(path: &Path) -> PathBuf {
    let mut temp = OsString::from(path.as_os_str());
    temp.push(TEMP_SUFFIX);
    PathBuf::from(temp)
}

/// Syncs the parent directory so that creates and renames are durable.
///
/// Directory fsync is not supported on Windows; NTFS journals metadata
/// updates instead.
#[cfg(unix)]
fn sync_parent(path: &Path) -> StorageResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        File::open(parent)?.sync_all()?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn sync_parent(_path: &Path) -> StorageResult<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn read_missing_is_none() {
        let dir = tempdir().unwrap();
        assert!(read_all(&dir.path().join("absent.csv")).unwrap().is_none());
    }

    #[test]
    fn append_writes_header_once() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.csv");

        assert!(append_row(&path, b"ID,NAME\n", b"1,a\n").unwrap());
        assert!(!append_row(&path, b"ID,NAME\n", b"2,b\n").unwrap());

        let data = read_all(&path).unwrap().unwrap();
        assert_eq!(&data, b"ID,NAME\n1,a\n2,b\n");
    }

    #[test]
    fn write_atomic_replaces_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.csv");
        fs::write(&path, b"old content that is longer").unwrap();

        write_atomic(&path, b"new").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"new");
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn write_atomic_creates_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fresh.csv");

        write_atomic(&path, b"ID\n").unwrap();
        assert_eq!(read_all(&path).unwrap().unwrap(), b"ID\n");
    }

    #[test]
    fn write_atomic_into_missing_dir_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("ledger.csv");
        assert!(write_atomic(&path, b"x").is_err());
    }

    #[test]
    fn append_terminates_unfinished_last_row() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.csv");
        fs::write(&path, b"ID,NAME\n1,a").unwrap();

        assert!(!append_row(&path, b"ID,NAME\n", b"2,b\n").unwrap());
        assert_eq!(fs::read(&path).unwrap(), b"ID,NAME\n1,a\n2,b\n");
    }

    #[test]
    fn append_to_empty_file_writes_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.csv");
        fs::write(&path, b"").unwrap();

        append_row(&path, b"ID,NAME\n", b"1,a\n").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"ID,NAME\n1,a\n");
    }

    #[test]
    fn failed_write_removes_partial_file() {
        let dir = tempdir().unwrap();
        let path = temp_path(&dir.path().join("ledger.csv"));
        fs::write(&path, b"ID,NA").unwrap();

        let result: StorageResult<()> = remove_on_error(&path, Err(io::Error::other("disk full")));
        assert!(result.is_err());
        assert!(!path.exists());

        fs::write(&path, b"ID\n").unwrap();
        remove_on_error(&path, Ok(())).unwrap();
        assert!(path.exists());
    }
}
