//! # regledger core
//!
//! Ledgers for the civil registry flat-file store.
//!
//! This crate provides:
//! - [`Ledger`]: a record collection over one file, mutated under an
//!   exclusive lock with a best-effort backup before every write
//! - [`Accounts`] and [`BirthRecords`]: the two concrete ledgers
//! - [`Matcher`]: fuzzy name and date-of-birth search
//! - [`Registry`]: both ledgers of one data directory
//!
//! ## Consistency
//!
//! Mutations on the same ledger are serialized; reads take no lock and may
//! observe the file just before or just after a concurrent write. There is
//! no transaction spanning the two ledgers.
//!
//! ## Stale locks
//!
//! A process that dies while holding a ledger lock leaves its marker file
//! behind. Markers carry no lease; they must be removed by an operator
//! (`regledger unlock`) before the ledger can be mutated again.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod accounts;
pub mod births;
mod config;
mod error;
pub mod id;
mod ledger;
pub mod matcher;
mod registry;
mod types;

pub use accounts::{AccountKind, AccountView, Accounts, NewAccount, ProfileUpdate};
pub use births::{BirthKind, BirthRecords};
pub use config::Config;
pub use error::{CoreError, CoreResult};
pub use ledger::{is_email_column, key_matches, Ledger, LedgerKind};
pub use matcher::{edit_distance, similarity, Match, Matcher};
pub use registry::Registry;
pub use types::{Query, Status};

pub use regledger_codec::{Record, Schema};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
