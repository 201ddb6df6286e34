//! Unlock command implementation.
//!
//! Lock markers carry no lease, so a writer that crashed mid-mutation leaves
//! its ledger locked until the marker is removed here. Only run this when no
//! writer is active.

use crate::LedgerName;
use regledger_core::Config;
use regledger_storage::LockManager;
use tracing::info;

/// Removes lock markers of the selected ledgers.
pub fn run(config: &Config, ledger: Option<LedgerName>) -> Result<(), Box<dyn std::error::Error>> {
    for ledger in LedgerName::selected(ledger) {
        let path = ledger.path(config);
        let holder = LockManager::holder(&path);
        if LockManager::clear_stale(&path)? {
            info!(ledger = ledger.label(), "lock marker removed");
            match holder {
                Some(holder) => println!("✓ {}: removed lock held by {}", ledger.label(), holder.trim()),
                None => println!("✓ {}: removed lock", ledger.label()),
            }
        } else {
            println!("{}: not locked", ledger.label());
        }
    }
    Ok(())
}
