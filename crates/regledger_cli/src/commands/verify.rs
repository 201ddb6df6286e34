//! Verify command implementation.

use crate::LedgerName;
use regledger_codec::{decode_utf8, RowReader};
use regledger_core::{is_email_column, AccountKind, BirthKind, Config, LedgerKind};
use regledger_storage::read_all;
use std::collections::HashMap;
use std::path::Path;

/// Verification result.
#[derive(Debug, Default)]
pub struct VerifyResult {
    /// Number of data rows checked.
    pub rows_checked: usize,
    /// Rows whose field count differs from the header.
    pub drifted_rows: usize,
    /// Problems that make the ledger unreadable.
    pub errors: Vec<String>,
    /// Problems that leave the ledger readable.
    pub warnings: Vec<String>,
}

impl VerifyResult {
    fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Runs the verify command.
pub fn run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("Verifying data directory {:?}", config.data_dir);
    println!();

    let mut ok = true;
    for ledger in LedgerName::ALL {
        let path = ledger.path(config);
        let unique_keys = match ledger {
            LedgerName::Accounts => AccountKind.unique_keys(),
            LedgerName::Births => BirthKind.unique_keys(),
        };
        match verify_ledger(&path, unique_keys)? {
            Some(result) => {
                print_result(ledger.label(), &result);
                ok &= result.is_ok();
            }
            None => println!("{}: file not found (created on first write)", ledger.label()),
        }
    }

    println!();
    if ok {
        println!("✓ Verification passed");
        Ok(())
    } else {
        println!("✗ Verification failed");
        Err("Verification failed".into())
    }
}

/// Checks one ledger file; `None` if it does not exist.
pub fn verify_ledger(
    path: &Path,
    unique_keys: &[&str],
) -> Result<Option<VerifyResult>, Box<dyn std::error::Error>> {
    let Some(bytes) = read_all(path)? else {
        return Ok(None);
    };
    let mut result = VerifyResult::default();

    let text = match decode_utf8(&bytes) {
        Ok(text) => text,
        Err(e) => {
            result.errors.push(e.to_string());
            return Ok(Some(result));
        }
    };

    let mut reader = RowReader::new(text);
    let header = match reader.next_row() {
        Ok(Some(header)) => header,
        Ok(None) => {
            result.warnings.push("empty file, no header".to_string());
            return Ok(Some(result));
        }
        Err(e) => {
            result.errors.push(e.to_string());
            return Ok(Some(result));
        }
    };

    let key_positions: Vec<(&str, usize)> = unique_keys
        .iter()
        .filter_map(|key| header.iter().position(|c| c == key).map(|i| (*key, i)))
        .collect();
    let mut seen: HashMap<(&str, String), usize> = HashMap::new();

    loop {
        let line = reader.line();
        let fields = match reader.next_row() {
            Ok(Some(fields)) => fields,
            Ok(None) => break,
            Err(e) => {
                result.errors.push(e.to_string());
                break;
            }
        };
        result.rows_checked += 1;

        if fields.len() != header.len() {
            result.drifted_rows += 1;
            result.warnings.push(format!(
                "line {line}: {} fields, header has {}",
                fields.len(),
                header.len()
            ));
        }

        for &(key, position) in &key_positions {
            let Some(value) = fields.get(position).map(|v| v.trim()) else {
                continue;
            };
            let value = if is_email_column(key) {
                value.to_lowercase()
            } else {
                value.to_string()
            };
            if value.is_empty() {
                continue;
            }
            if let Some(first) = seen.insert((key, value.clone()), line) {
                result.warnings.push(format!(
                    "line {line}: duplicate {key} {value:?} (first seen on line {first})"
                ));
            }
        }
    }

    Ok(Some(result))
}

fn print_result(name: &str, result: &VerifyResult) {
    println!("{name}:");
    println!("  Rows checked:  {}", result.rows_checked);
    println!("  Drifted rows:  {}", result.drifted_rows);

    for warning in &result.warnings {
        println!("  warning: {warning}");
    }
    for error in &result.errors {
        println!("  error: {error}");
    }
}
