//! Core type definitions.

use crate::error::{CoreError, CoreResult};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Review state of a birth record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Submitted, not yet reviewed.
    #[default]
    Pending,
    /// Accepted by a reviewer.
    Approved,
    /// Refused by a reviewer; carries a reason.
    Rejected,
}

impl Status {
    /// All statuses, in review order.
    pub const ALL: [Status; 3] = [Status::Pending, Status::Approved, Status::Rejected];

    /// The stored text form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Approved => "approved",
            Status::Rejected => "rejected",
        }
    }

    /// Parses a stored value; an empty field reads as pending.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidStatus`] for unrecognised text.
    pub fn from_field(value: &str) -> CoreResult<Self> {
        if value.trim().is_empty() {
            return Ok(Status::Pending);
        }
        value.parse()
    }
}

impl FromStr for Status {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CoreError::invalid_status(s))
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fuzzy lookup over birth records: a free-text name and an optional
/// date of birth (`YYYY-MM-DD`, empty for none).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    /// Name to match against child full names and surnames.
    pub name: String,
    /// Exact date-of-birth bonus; empty disables it.
    pub dob: String,
}

impl Query {
    /// Creates a name-only query.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dob: String::new(),
        }
    }

    /// Adds a date of birth.
    #[must_use]
    pub fn with_dob(mut self, dob: impl Into<String>) -> Self {
        self.dob = dob.into();
        self
    }
}
