//! Registry: the two ledgers of one data directory.

use crate::accounts::Accounts;
use crate::births::BirthRecords;
use crate::config::Config;
use crate::error::CoreResult;
use crate::matcher::Matcher;
use regledger_storage::{BackupManager, LockManager};
use std::fs;
use tracing::info;

/// An opened registry.
///
/// The account and birth-record ledgers lock independently; a mutation of
/// one never waits on the other, and no operation spans both atomically.
#[derive(Debug, Clone)]
pub struct Registry {
    config: Config,
    accounts: Accounts,
    births: BirthRecords,
}

impl Registry {
    /// Opens the registry described by `config`.
    ///
    /// Creates the data and backup directories if missing. Ledger files are
    /// created lazily by the first append.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if a directory cannot be created.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use regledger_core::{Config, Query, Registry};
    ///
    /// let registry = Registry::open(Config::default().with_data_dir("db"))?;
    /// for hit in registry.births().search(&Query::new("Sharma"))? {
    ///     println!("{:.2} {}", hit.score, hit.record.get_or_empty("ID"));
    /// }
    /// # Ok::<(), regledger_core::CoreError>(())
    /// ```
    pub fn open(config: Config) -> CoreResult<Self> {
        let backup_dir = config.backup_path();
        fs::create_dir_all(&config.data_dir)?;
        fs::create_dir_all(&backup_dir)?;

        let locks = LockManager::new(config.lock_options());
        let backups = BackupManager::new(&backup_dir);

        let accounts = Accounts::new(config.accounts_path(), locks.clone(), backups.clone());
        let births = BirthRecords::new(config.births_path(), locks, backups)
            .with_matcher(Matcher::new(config.search_threshold, config.search_limit));

        info!(
            data_dir = %config.data_dir.display(),
            backups = %backup_dir.display(),
            "registry opened"
        );

        Ok(Self {
            config,
            accounts,
            births,
        })
    }

    /// Returns the configuration the registry was opened with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the account ledger.
    pub fn accounts(&self) -> &Accounts {
        &self.accounts
    }

    /// Returns the birth-record ledger.
    pub fn births(&self) -> &BirthRecords {
        &self.births
    }
}
