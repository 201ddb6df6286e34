//! Search command implementation.

use crate::Format;
use regledger_core::births::columns::{CERTIFICATE_NO, DATE_OF_BIRTH, ID, STATUS};
use regledger_core::matcher::full_name;
use regledger_core::{BirthRecords, Config, Matcher, Query};
use regledger_storage::{BackupManager, LockManager};
use tracing::debug;

/// Runs the search command.
pub fn run(
    config: &Config,
    name: &str,
    dob: Option<&str>,
    format: Format,
) -> Result<(), Box<dyn std::error::Error>> {
    let births = BirthRecords::new(
        config.births_path(),
        LockManager::new(config.lock_options()),
        BackupManager::new(config.backup_path()),
    )
    .with_matcher(Matcher::new(config.search_threshold, config.search_limit));

    let mut query = Query::new(name);
    if let Some(dob) = dob {
        query = query.with_dob(dob);
    }

    let matches = births.search(&query)?;
    debug!(query = name, hits = matches.len(), "search finished");

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&matches)?),
        Format::Text => {
            if matches.is_empty() {
                println!("No matches for {name:?}");
            }
            for hit in &matches {
                println!(
                    "{:.3}  {:<24} {:<28} {:<10} {:<10} {}",
                    hit.score,
                    hit.record.get_or_empty(ID),
                    full_name(&hit.record),
                    hit.record.get_or_empty(DATE_OF_BIRTH),
                    hit.record.get_or_empty(STATUS),
                    hit.record.get_or_empty(CERTIFICATE_NO),
                );
            }
        }
    }

    Ok(())
}
