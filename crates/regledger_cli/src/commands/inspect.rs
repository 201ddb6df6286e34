//! Inspect command implementation.

use crate::{Format, LedgerName};
use regledger_codec::parse_all;
use regledger_core::Config;
use regledger_storage::{read_all, LockManager};
use serde::Serialize;
use std::path::Path;

/// Inspection result for one ledger.
#[derive(Debug, Serialize)]
pub struct LedgerReport {
    /// Ledger label.
    pub ledger: &'static str,
    /// Ledger file path.
    pub path: String,
    /// Whether the file exists.
    pub exists: bool,
    /// File size in bytes.
    pub size: u64,
    /// Header columns, in file order.
    pub columns: Vec<String>,
    /// Number of data rows.
    pub rows: usize,
    /// Whether a lock marker is present.
    pub locked: bool,
    /// Contents of the lock marker, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lock_holder: Option<String>,
}

/// Runs the inspect command.
pub fn run(config: &Config, format: Format) -> Result<(), Box<dyn std::error::Error>> {
    let reports = LedgerName::ALL
        .iter()
        .map(|ledger| inspect(*ledger, &ledger.path(config)))
        .collect::<Result<Vec<_>, _>>()?;

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&reports)?),
        Format::Text => print_text_output(config, &reports),
    }

    Ok(())
}

fn inspect(ledger: LedgerName, path: &Path) -> Result<LedgerReport, Box<dyn std::error::Error>> {
    let mut report = LedgerReport {
        ledger: ledger.label(),
        path: path.display().to_string(),
        exists: false,
        size: 0,
        columns: Vec::new(),
        rows: 0,
        locked: LockManager::is_locked(path),
        lock_holder: LockManager::holder(path),
    };

    if let Some(bytes) = read_all(path)? {
        let (schema, records) = parse_all(&bytes)?;
        report.exists = true;
        report.size = bytes.len() as u64;
        report.columns = schema.columns().to_vec();
        report.rows = records.len();
    }

    Ok(report)
}

fn print_text_output(config: &Config, reports: &[LedgerReport]) {
    println!("regledger Data Directory Inspection");
    println!("===================================");
    println!();
    println!("Data dir: {}", config.data_dir.display());
    println!("Backups:  {}", config.backup_path().display());

    for report in reports {
        println!();
        println!("[{}] {}", report.ledger, report.path);
        if !report.exists {
            println!("  (not created yet)");
        } else {
            println!("  Size:    {}", format_size(report.size));
            println!("  Rows:    {}", report.rows);
            println!("  Columns: {}", report.columns.len());
            for column in &report.columns {
                println!("    - {column}");
            }
        }
        match &report.lock_holder {
            Some(holder) => println!("  Lock:    held by {}", holder.trim()),
            None if report.locked => println!("  Lock:    held"),
            None => println!("  Lock:    free"),
        }
    }
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} bytes", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
