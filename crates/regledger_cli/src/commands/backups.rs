//! Backups command implementation.

use crate::LedgerName;
use regledger_core::Config;
use regledger_storage::BackupManager;
use std::fs;

/// Lists snapshots of the selected ledgers, oldest first.
pub fn run(config: &Config, ledger: Option<LedgerName>) -> Result<(), Box<dyn std::error::Error>> {
    let manager = BackupManager::new(config.backup_path());
    println!("Backups in {}", manager.backup_dir().display());

    for ledger in LedgerName::selected(ledger) {
        let snapshots = manager.list(&ledger.path(config))?;
        println!();
        println!("{} ({} snapshots)", ledger.label(), snapshots.len());
        for snapshot in snapshots {
            let size = fs::metadata(&snapshot).map(|m| m.len()).unwrap_or(0);
            let name = snapshot
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            println!("  {name}  {size} bytes");
        }
    }

    Ok(())
}
