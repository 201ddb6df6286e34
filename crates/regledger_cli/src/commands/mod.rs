//! CLI command implementations.

pub mod backups;
pub mod inspect;
pub mod search;
pub mod unlock;
pub mod verify;
