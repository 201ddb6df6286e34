//! Birth-record ledger.
//!
//! Records are keyed by `ID` and `CERTIFICATE_NO`. Each carries a review
//! [`Status`]; `REJECT_REASON` is only non-empty while the record is
//! rejected.

use crate::error::CoreResult;
use crate::id;
use crate::ledger::{Ledger, LedgerKind};
use crate::matcher::{Match, Matcher};
use crate::types::{Query, Status};
use chrono::{SecondsFormat, Utc};
use regledger_codec::{Record, Schema};
use regledger_storage::{BackupManager, LockManager};
use std::path::PathBuf;
use tracing::info;

/// Birth-record ledger column names.
pub mod columns {
    #![allow(missing_docs)]

    pub const ID: &str = "ID";
    pub const CERTIFICATE_NO: &str = "CERTIFICATE_NO";
    pub const CHILD_FIRST_NAME: &str = "CHILD_FIRST_NAME";
    pub const CHILD_MIDDLE_NAME: &str = "CHILD_MIDDLE_NAME";
    pub const CHILD_LAST_NAME: &str = "CHILD_LAST_NAME";
    pub const GENDER: &str = "GENDER";
    pub const DATE_OF_BIRTH: &str = "DATE_OF_BIRTH";
    pub const NEPALI_DOB: &str = "NEPALI_DOB";
    pub const PLACE_OF_BIRTH: &str = "PLACE_OF_BIRTH";
    pub const PROVINCE: &str = "PROVINCE";
    pub const DISTRICT: &str = "DISTRICT";
    pub const MUNICIPALITY: &str = "MUNICIPALITY";
    pub const WARD: &str = "WARD";
    pub const FATHER_FIRST_NAME: &str = "FATHER_FIRST_NAME";
    pub const FATHER_MIDDLE_NAME: &str = "FATHER_MIDDLE_NAME";
    pub const FATHER_LAST_NAME: &str = "FATHER_LAST_NAME";
    pub const FATHER_CITIZENSHIP_NO: &str = "FATHER_CITIZENSHIP_NO";
    pub const MOTHER_FIRST_NAME: &str = "MOTHER_FIRST_NAME";
    pub const MOTHER_MIDDLE_NAME: &str = "MOTHER_MIDDLE_NAME";
    pub const MOTHER_LAST_NAME: &str = "MOTHER_LAST_NAME";
    pub const MOTHER_CITIZENSHIP_NO: &str = "MOTHER_CITIZENSHIP_NO";
    pub const PERMANENT_ADDRESS: &str = "PERMANENT_ADDRESS";
    pub const CONTACT_NUMBER: &str = "CONTACT_NUMBER";
    pub const REMARKS: &str = "REMARKS";
    pub const REGISTERED_BY: &str = "REGISTERED_BY";
    pub const REGISTERED_AT: &str = "REGISTERED_AT";
    pub const REJECT_REASON: &str = "REJECT_REASON";
    pub const STATUS: &str = "STATUS";
}

use columns::*;

/// Column order of a newly created birth-record ledger.
pub const BIRTH_COLUMNS: [&str; 28] = [
    ID,
    CERTIFICATE_NO,
    CHILD_FIRST_NAME,
    CHILD_MIDDLE_NAME,
    CHILD_LAST_NAME,
    GENDER,
    DATE_OF_BIRTH,
    NEPALI_DOB,
    PLACE_OF_BIRTH,
    PROVINCE,
    DISTRICT,
    MUNICIPALITY,
    WARD,
    FATHER_FIRST_NAME,
    FATHER_MIDDLE_NAME,
    FATHER_LAST_NAME,
    FATHER_CITIZENSHIP_NO,
    MOTHER_FIRST_NAME,
    MOTHER_MIDDLE_NAME,
    MOTHER_LAST_NAME,
    MOTHER_CITIZENSHIP_NO,
    PERMANENT_ADDRESS,
    CONTACT_NUMBER,
    REMARKS,
    REGISTERED_BY,
    REGISTERED_AT,
    REJECT_REASON,
    STATUS,
];

/// Birth-record ledger behaviour.
#[derive(Debug, Clone, Copy, Default)]
pub struct BirthKind;

impl LedgerKind for BirthKind {
    fn name(&self) -> &'static str {
        "birth_records"
    }

    fn schema(&self) -> Schema {
        Schema::new(BIRTH_COLUMNS)
    }

    fn prepare(&self, record: &mut Record) -> CoreResult<()> {
        let now = Utc::now();
        let mut rng = rand::thread_rng();

        if record.get_or_empty(ID).is_empty() {
            record.set(ID, id::birth_record_id(now, &mut rng));
        }
        if record.get_or_empty(CERTIFICATE_NO).is_empty() {
            record.set(CERTIFICATE_NO, id::certificate_no(now, &mut rng));
        }
        record.set_if_empty(
            REGISTERED_AT,
            now.to_rfc3339_opts(SecondsFormat::Millis, true),
        );
        record.set(STATUS, Status::Pending.as_str());
        record.set(REJECT_REASON, "");
        Ok(())
    }

    fn unique_keys(&self) -> &'static [&'static str] {
        &[ID, CERTIFICATE_NO]
    }

    fn regenerate(&self, column: &str, _record: &Record) -> Option<String> {
        let mut rng = rand::thread_rng();
        match column {
            ID => Some(id::birth_record_id(Utc::now(), &mut rng)),
            CERTIFICATE_NO => Some(id::certificate_no(Utc::now(), &mut rng)),
            _ => None,
        }
    }
}

/// The birth-record ledger.
#[derive(Debug, Clone)]
pub struct BirthRecords {
    ledger: Ledger<BirthKind>,
    matcher: Matcher,
}

impl BirthRecords {
    /// Creates the birth-record ledger over `path`.
    pub fn new(path: impl Into<PathBuf>, locks: LockManager, backups: BackupManager) -> Self {
        Self {
            ledger: Ledger::new(BirthKind, path, locks, backups),
            matcher: Matcher::default(),
        }
    }

    /// Uses `matcher` for [`BirthRecords::search`].
    #[must_use]
    pub fn with_matcher(mut self, matcher: Matcher) -> Self {
        self.matcher = matcher;
        self
    }

    /// Returns the underlying ledger.
    pub fn ledger(&self) -> &Ledger<BirthKind> {
        &self.ledger
    }

    /// Registers a new birth as pending review.
    ///
    /// `ID`, `CERTIFICATE_NO` and `REGISTERED_AT` are generated when absent.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DuplicateKey`](crate::CoreError::DuplicateKey) if
    /// the ID or certificate number is already registered.
    pub fn register(&self, fields: Record) -> CoreResult<Record> {
        let stored = self.ledger.insert(fields)?;
        info!(
            id = stored.get_or_empty(ID),
            certificate = stored.get_or_empty(CERTIFICATE_NO),
            "birth registered"
        );
        Ok(stored)
    }

    /// Looks a record up by ID.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`](crate::CoreError::NotFound).
    pub fn find_by_id(&self, id: &str) -> CoreResult<Record> {
        self.ledger.find_by_key(ID, id)
    }

    /// Looks a record up by certificate number.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`](crate::CoreError::NotFound).
    pub fn find_by_certificate(&self, certificate_no: &str) -> CoreResult<Record> {
        self.ledger.find_by_key(CERTIFICATE_NO, certificate_no)
    }

    /// Records registered by `registered_by`, in ledger order.
    ///
    /// # Errors
    ///
    /// Returns an I/O or codec error.
    pub fn list_by_registrar(&self, registered_by: &str) -> CoreResult<Vec<Record>> {
        self.ledger.find_all_by_key(REGISTERED_BY, registered_by)
    }

    /// Records currently in `status`. Rows with an empty or unreadable
    /// status are treated as pending and skipped respectively.
    ///
    /// # Errors
    ///
    /// Returns an I/O or codec error.
    pub fn list_by_status(&self, status: Status) -> CoreResult<Vec<Record>> {
        Ok(self
            .ledger
            .records()?
            .into_iter()
            .filter(|r| Status::from_field(r.get_or_empty(STATUS)).ok() == Some(status))
            .collect())
    }

    /// Returns the status of the record with `id`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`](crate::CoreError::NotFound), or
    /// [`CoreError::InvalidStatus`](crate::CoreError::InvalidStatus) if the
    /// stored value is unrecognised.
    pub fn status_of(&self, id: &str) -> CoreResult<Status> {
        Status::from_field(self.find_by_id(id)?.get_or_empty(STATUS))
    }

    /// Moves the record with `id` to `status`.
    ///
    /// A rejection stores `reason`; every other status clears
    /// `REJECT_REASON`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`](crate::CoreError::NotFound) or a lock
    /// timeout.
    pub fn set_status(&self, id: &str, status: Status, reason: Option<&str>) -> CoreResult<Record> {
        let reason = match status {
            Status::Rejected => reason.unwrap_or_default().trim(),
            Status::Pending | Status::Approved => "",
        };
        let updated = self.ledger.update_by_key(ID, id, |record| {
            record.set(STATUS, status.as_str());
            record.set(REJECT_REASON, reason);
            Ok(())
        })?;
        info!(id, %status, "birth record status changed");
        Ok(updated)
    }

    /// Fuzzy search by child name and optional date of birth.
    ///
    /// # Errors
    ///
    /// Returns an I/O or codec error.
    pub fn search(&self, query: &Query) -> CoreResult<Vec<Match>> {
        Ok(self.matcher.search(query, self.ledger.records()?))
    }

    /// Returns every record.
    ///
    /// # Errors
    ///
    /// Returns an I/O or codec error.
    pub fn all(&self) -> CoreResult<Vec<Record>> {
        self.ledger.records()
    }
}
