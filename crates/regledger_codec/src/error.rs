//! Error types for the codec crate.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while decoding ledger bytes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// A quoted field was still open when the input ended.
    #[error("malformed row at line {line}: {message}")]
    MalformedRow {
        /// 1-based line number where the offending row starts.
        line: usize,
        /// Description of the problem.
        message: String,
    },

    /// The ledger bytes are not valid UTF-8.
    #[error("invalid UTF-8 in ledger data at byte {offset}")]
    InvalidUtf8 {
        /// Byte offset of the first invalid sequence.
        offset: usize,
    },
}

impl CodecError {
    /// Create a malformed row error.
    pub fn malformed_row(line: usize, message: impl Into<String>) -> Self {
        Self::MalformedRow {
            line,
            message: message.into(),
        }
    }

    /// Returns true if this is a [`CodecError::MalformedRow`].
    #[must_use]
    pub fn is_malformed_row(&self) -> bool {
        matches!(self, Self::MalformedRow { .. })
    }
}
