//! Ledger: one record collection backed by one flat file.
//!
//! A ledger composes the codec, the lock manager and the backup manager:
//!
//! - Reads ([`Ledger::load_all`], [`Ledger::find_by_key`]) never lock. They
//!   may see the file just before or just after a concurrent mutation.
//! - Mutations ([`Ledger::append`], [`Ledger::insert`],
//!   [`Ledger::rewrite_all`], [`Ledger::update_by_key`]) run as
//!   acquire, backup, write, release. The lock guard is dropped on every
//!   exit path, so a failed mutation never leaves the marker behind.
//!
//! Updates are read-modify-write over the whole file. They are only safe
//! because the read happens under the same lock as the write.

use crate::error::{CoreError, CoreResult};
use regledger_codec::{encode_header, encode_row, parse_all, parse_schema, serialize_all};
use regledger_codec::{Record, Schema};
use regledger_storage::{append_row, read_all, write_atomic, BackupManager, LockManager};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Per-entity behaviour plugged into a [`Ledger`].
pub trait LedgerKind: Send + Sync {
    /// Short name used in errors and logs.
    fn name(&self) -> &'static str;

    /// Schema written when the ledger file is first created.
    fn schema(&self) -> Schema;

    /// Fills identity and default fields of a record about to be appended.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be completed.
    fn prepare(&self, record: &mut Record) -> CoreResult<()>;

    /// Columns [`Ledger::insert`] keeps unique.
    fn unique_keys(&self) -> &'static [&'static str] {
        &[]
    }

    /// Draws a fresh value for a unique column that [`LedgerKind::prepare`]
    /// generated, or `None` if this kind never generates `column`.
    ///
    /// [`Ledger::insert`] calls this under the lock when a generated value
    /// collides with a stored record.
    fn regenerate(&self, _column: &str, _record: &Record) -> Option<String> {
        None
    }
}

/// Fresh draws tried for one generated key before giving up.
const MAX_REGENERATE_ATTEMPTS: u32 = 64;

/// A record collection stored in one file.
#[derive(Clone)]
pub struct Ledger<K> {
    kind: K,
    path: PathBuf,
    locks: LockManager,
    backups: BackupManager,
}

impl<K: LedgerKind> Ledger<K> {
    /// Creates a ledger over `path`. Nothing is touched on disk.
    pub fn new(kind: K, path: impl Into<PathBuf>, locks: LockManager, backups: BackupManager) -> Self {
        Self {
            kind,
            path: path.into(),
            locks,
            backups,
        }
    }

    /// Returns the ledger name.
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// Returns the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the entity behaviour.
    pub fn kind(&self) -> &K {
        &self.kind
    }

    /// Returns the backup manager used before mutations.
    pub fn backups(&self) -> &BackupManager {
        &self.backups
    }

    /// Reads and decodes the whole ledger without locking.
    ///
    /// A missing file is an empty ledger: empty schema, no records.
    ///
    /// # Errors
    ///
    /// Returns an I/O error, or a codec error if a row's quoting is broken.
    pub fn load_all(&self) -> CoreResult<(Schema, Vec<Record>)> {
        match read_all(&self.path)? {
            Some(bytes) => Ok(parse_all(&bytes)?),
            None => Ok((Schema::empty(), Vec::new())),
        }
    }

    /// Returns all records.
    ///
    /// # Errors
    ///
    /// See [`Ledger::load_all`].
    pub fn records(&self) -> CoreResult<Vec<Record>> {
        Ok(self.load_all()?.1)
    }

    /// Returns the first record whose `column` matches `value`.
    ///
    /// Email-like columns compare trimmed and case-insensitively; all other
    /// columns compare exactly.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if nothing matches.
    pub fn find_by_key(&self, column: &str, value: &str) -> CoreResult<Record> {
        self.records()?
            .into_iter()
            .find(|r| key_matches(column, r.get_or_empty(column), value))
            .ok_or_else(|| CoreError::not_found(self.name(), column, value))
    }

    /// Returns every record whose `column` matches `value`.
    ///
    /// # Errors
    ///
    /// See [`Ledger::load_all`].
    pub fn find_all_by_key(&self, column: &str, value: &str) -> CoreResult<Vec<Record>> {
        Ok(self
            .records()?
            .into_iter()
            .filter(|r| key_matches(column, r.get_or_empty(column), value))
            .collect())
    }

    /// Appends a record without any uniqueness check.
    ///
    /// Missing identity fields are generated first. The file and its header
    /// are created if absent. Returns the record as stored.
    ///
    /// # Errors
    ///
    /// Returns a lock timeout, or an I/O or codec error.
    pub fn append(&self, fields: Record) -> CoreResult<Record> {
        self.append_inner(fields, false)
    }

    /// Appends a record after checking the kind's unique columns.
    ///
    /// The check runs under the lock, right before the write, so two
    /// concurrent inserts of the same key cannot both succeed.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DuplicateKey`] if a unique column collides, or
    /// any error [`Ledger::append`] can return.
    pub fn insert(&self, fields: Record) -> CoreResult<Record> {
        self.append_inner(fields, true)
    }

    /// Replaces the whole ledger with `records` under `schema`.
    ///
    /// Schema column order is preserved. Records missing a column write it
    /// empty; columns that records carry but the schema lacks are added at
    /// the schema's tail.
    ///
    /// # Errors
    ///
    /// Returns a lock timeout or an I/O error.
    pub fn rewrite_all(&self, records: &[Record], schema: &Schema) -> CoreResult<()> {
        let _guard = self.locks.acquire(&self.path)?;
        self.write_locked(schema, records)
    }

    /// Updates every record whose `column` matches `value`.
    ///
    /// Loads the ledger, applies `mutate` to each match, and rewrites the
    /// whole file, all under the lock. Returns the first updated record.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if nothing matches (the file is not
    /// rewritten), or whatever `mutate` returns.
    pub fn update_by_key<F>(&self, column: &str, value: &str, mut mutate: F) -> CoreResult<Record>
    where
        F: FnMut(&mut Record) -> CoreResult<()>,
    {
        let _guard = self.locks.acquire(&self.path)?;
        let (schema, mut records) = self.load_all()?;

        let mut first = None;
        for record in records
            .iter_mut()
            .filter(|r| key_matches(column, r.get_or_empty(column), value))
        {
            mutate(record)?;
            if first.is_none() {
                first = Some(record.clone());
            }
        }

        let updated = first.ok_or_else(|| CoreError::not_found(self.name(), column, value))?;
        self.write_locked(&schema, &records)?;
        Ok(updated)
    }

    fn append_inner(&self, mut fields: Record, check_unique: bool) -> CoreResult<Record> {
        let generated: Vec<&str> = self
            .kind
            .unique_keys()
            .iter()
            .copied()
            .filter(|column| fields.get_or_empty(column).is_empty())
            .collect();
        self.kind.prepare(&mut fields)?;

        let _guard = self.locks.acquire(&self.path)?;
        let existing = read_all(&self.path)?;

        let schema = match &existing {
            Some(bytes) if check_unique => {
                let (schema, records) = parse_all(bytes)?;
                self.check_unique(&records, &mut fields, &generated)?;
                schema
            }
            Some(bytes) => parse_schema(bytes)?,
            None => Schema::empty(),
        };

        self.backups.snapshot(&self.path);

        if schema.is_empty() {
            // New or zero-length file: write header and row in one go.
            let schema = self.kind.schema();
            let record = fields.conform(&schema);
            let mut data = encode_header(&schema);
            data.push_str(&encode_row(&schema, &record));
            write_atomic(&self.path, data.as_bytes())?;
            info!(ledger = self.name(), path = %self.path.display(), "ledger created");
            return Ok(record);
        }

        let record = fields.conform(&schema);
        append_row(
            &self.path,
            encode_header(&schema).as_bytes(),
            encode_row(&schema, &record).as_bytes(),
        )?;
        debug!(ledger = self.name(), "record appended");
        Ok(record)
    }

    /// Rejects a candidate whose unique columns collide with `records`.
    ///
    /// Columns listed in `generated` were filled by the kind, not the
    /// caller, so a collision there draws a new value instead of failing.
    fn check_unique(&self, records: &[Record], candidate: &mut Record, generated: &[&str]) -> CoreResult<()> {
        for &column in self.kind.unique_keys() {
            let mut attempts = 0;
            loop {
                let wanted = candidate.get_or_empty(column);
                if wanted.is_empty()
                    || !records
                        .iter()
                        .any(|r| key_matches(column, r.get_or_empty(column), wanted))
                {
                    break;
                }

                let fresh = if generated.contains(&column) && attempts < MAX_REGENERATE_ATTEMPTS {
                    self.kind.regenerate(column, candidate)
                } else {
                    None
                };
                match fresh {
                    Some(value) => {
                        debug!(ledger = self.name(), column, taken = wanted, "generated key collided, redrawing");
                        candidate.set(column, value);
                        attempts += 1;
                    }
                    None => return Err(CoreError::duplicate_key(self.name(), column, wanted)),
                }
            }
        }
        Ok(())
    }

    /// Rewrites the file; the caller must hold the lock.
    fn write_locked(&self, schema: &Schema, records: &[Record]) -> CoreResult<()> {
        let mut schema = if schema.is_empty() {
            self.kind.schema()
        } else {
            schema.clone()
        };
        for record in records {
            for column in record.columns() {
                if schema.extend(column) {
                    info!(ledger = self.name(), column, "schema extended");
                }
            }
        }

        self.backups.snapshot(&self.path);
        write_atomic(&self.path, &serialize_all(&schema, records))?;
        debug!(ledger = self.name(), rows = records.len(), "ledger rewritten");
        Ok(())
    }
}

impl<K: LedgerKind> fmt::Debug for Ledger<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ledger")
            .field("name", &self.kind.name())
            .field("path", &self.path)
            .finish()
    }
}

/// Returns true for columns holding email addresses.
pub fn is_email_column(column: &str) -> bool {
    column.to_ascii_uppercase().contains("EMAIL")
}

/// Compares a stored key against a wanted one.
pub fn key_matches(column: &str, stored: &str, wanted: &str) -> bool {
    if is_email_column(column) {
        stored.trim().to_lowercase() == wanted.trim().to_lowercase()
    } else {
        stored == wanted
    }
}
