//! # regledger testkit
//!
//! Test utilities for regledger.
//!
//! This crate provides:
//! - Temporary registries and sample records
//! - Property-based generators for schemas and records
//! - Concurrent writer stress helpers
//! - Cross-crate integration scenarios
//!
//! ## Usage
//!
//! ```rust
//! use regledger_testkit::prelude::*;
//!
//! let registry = TestRegistry::seeded();
//! assert_eq!(registry.births().all().unwrap().len(), 3);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod integration;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::stress::*;
}

pub use fixtures::*;
pub use generators::*;
pub use stress::*;
