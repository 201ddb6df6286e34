//! Registry configuration.

use regledger_storage::LockOptions;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration for opening a registry.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the ledger files.
    pub data_dir: PathBuf,

    /// File name of the account ledger inside `data_dir`.
    pub accounts_file: String,

    /// File name of the birth-record ledger inside `data_dir`.
    pub births_file: String,

    /// Snapshot directory; `<data_dir>/backups` when unset.
    pub backup_dir: Option<PathBuf>,

    /// Maximum lock acquisition attempts per mutation.
    pub lock_retries: u32,

    /// Fixed wait between lock attempts.
    pub lock_delay: Duration,

    /// Matches must score strictly above this to be returned.
    pub search_threshold: f64,

    /// Maximum number of search results.
    pub search_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("db"),
            accounts_file: "Users_Accounts_Information.csv".to_string(),
            births_file: "Birth_Records.csv".to_string(),
            backup_dir: None,
            lock_retries: 50,
            lock_delay: Duration::from_millis(100),
            search_threshold: 0.45,
            search_limit: 10,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the data directory.
    #[must_use]
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    /// Sets the account ledger file name.
    #[must_use]
    pub fn with_accounts_file(mut self, name: impl Into<String>) -> Self {
        self.accounts_file = name.into();
        self
    }

    /// Sets the birth-record ledger file name.
    #[must_use]
    pub fn with_births_file(mut self, name: impl Into<String>) -> Self {
        self.births_file = name.into();
        self
    }

    /// Sets the snapshot directory.
    #[must_use]
    pub fn with_backup_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.backup_dir = Some(dir.into());
        self
    }

    /// Sets the lock retry budget.
    #[must_use]
    pub fn with_lock_retries(mut self, retries: u32, delay: Duration) -> Self {
        self.lock_retries = retries;
        self.lock_delay = delay;
        self
    }

    /// Sets the search threshold and result limit.
    #[must_use]
    pub fn with_search(mut self, threshold: f64, limit: usize) -> Self {
        self.search_threshold = threshold;
        self.search_limit = limit;
        self
    }

    /// Path of the account ledger.
    #[must_use]
    pub fn accounts_path(&self) -> PathBuf {
        self.data_dir.join(&self.accounts_file)
    }

    /// Path of the birth-record ledger.
    #[must_use]
    pub fn births_path(&self) -> PathBuf {
        self.data_dir.join(&self.births_file)
    }

    /// Effective snapshot directory.
    #[must_use]
    pub fn backup_path(&self) -> PathBuf {
        self.backup_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("backups"))
    }

    /// Lock retry policy derived from this configuration.
    #[must_use]
    pub fn lock_options(&self) -> LockOptions {
        LockOptions::new(self.lock_retries, self.lock_delay)
    }

    /// Returns the data directory.
    #[must_use]
    pub fn data_path(&self) -> &Path {
        &self.data_dir
    }
}
