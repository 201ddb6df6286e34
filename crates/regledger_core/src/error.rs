//! Error types for regledger core.

use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in ledger operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage error, including lock timeouts.
    #[error("storage error: {0}")]
    Storage(#[from] regledger_storage::StorageError),

    /// Ledger bytes could not be decoded.
    #[error("codec error: {0}")]
    Codec(#[from] regledger_codec::CodecError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// No record matched the lookup.
    #[error("no record in {ledger} with {key} = {value:?}")]
    NotFound {
        /// Ledger that was searched.
        ledger: String,
        /// Column used for the lookup.
        key: String,
        /// Value looked up.
        value: String,
    },

    /// An insert would duplicate a unique column.
    #[error("{ledger} already has a record with {key} = {value:?}")]
    DuplicateKey {
        /// Ledger being written.
        ledger: String,
        /// Unique column.
        key: String,
        /// Duplicated value.
        value: String,
    },

    /// A status value outside pending, approved and rejected.
    #[error("invalid status: {value:?}")]
    InvalidStatus {
        /// The rejected text.
        value: String,
    },

    /// A field required to build a record was empty.
    #[error("missing required field: {field}")]
    MissingField {
        /// Column name.
        field: String,
    },
}

impl CoreError {
    /// Creates a not found error.
    pub fn not_found(
        ledger: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::NotFound {
            ledger: ledger.into(),
            key: key.into(),
            value: value.into(),
        }
    }

    /// Creates a duplicate key error.
    pub fn duplicate_key(
        ledger: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::DuplicateKey {
            ledger: ledger.into(),
            key: key.into(),
            value: value.into(),
        }
    }

    /// Creates an invalid status error.
    pub fn invalid_status(value: impl Into<String>) -> Self {
        Self::InvalidStatus {
            value: value.into(),
        }
    }

    /// Creates a missing field error.
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Returns true if the lock could not be acquired in time.
    #[must_use]
    pub fn is_lock_timeout(&self) -> bool {
        matches!(self, Self::Storage(e) if e.is_lock_timeout())
    }

    /// Returns true for a failed lookup.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns true for a duplicate unique key.
    #[must_use]
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, Self::DuplicateKey { .. })
    }

    /// Returns true if the ledger file failed to decode.
    #[must_use]
    pub fn is_malformed_row(&self) -> bool {
        matches!(self, Self::Codec(e) if e.is_malformed_row())
    }
}
