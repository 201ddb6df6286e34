//! Benchmark utilities.

#![warn(missing_docs)]

use rand::seq::SliceRandom;
use rand::Rng;
use regledger_core::births::columns::{
    CHILD_FIRST_NAME, CHILD_LAST_NAME, CHILD_MIDDLE_NAME, DATE_OF_BIRTH, ID, PLACE_OF_BIRTH,
    REMARKS,
};
use regledger_core::{BirthKind, LedgerKind, Record, Schema};

const FIRST_NAMES: &[&str] = &["Arjun", "Maya", "Rajesh", "Sita", "Hari", "Gita", "Bikash", "Anita"];
const MIDDLE_NAMES: &[&str] = &["", "", "Kumar", "Bahadur", "Kumari", "Prasad"];
const LAST_NAMES: &[&str] = &["Sharma", "Rai", "Tamang", "Gurung", "Thapa", "Magar", "Shrestha", "Karki"];

/// Schema of a freshly created birth-record ledger.
pub fn birth_schema() -> Schema {
    BirthKind.schema()
}

/// Generates `count` birth records with random names and dates.
///
/// Some remarks contain commas and quotes so that encoding takes the
/// quoting path.
pub fn generate_births(count: usize) -> Vec<Record> {
    let mut rng = rand::thread_rng();
    let schema = birth_schema();
    (0..count)
        .map(|i| {
            let remarks = if rng.gen_bool(0.2) {
                "late registration, \"verified\" by ward office"
            } else {
                ""
            };
            Record::from_pairs([
                (ID, format!("BR-{i:08}")),
                (CHILD_FIRST_NAME, pick(FIRST_NAMES, &mut rng).to_string()),
                (CHILD_MIDDLE_NAME, pick(MIDDLE_NAMES, &mut rng).to_string()),
                (CHILD_LAST_NAME, pick(LAST_NAMES, &mut rng).to_string()),
                (DATE_OF_BIRTH, random_date(&mut rng)),
                (PLACE_OF_BIRTH, "Kathmandu".to_string()),
                (REMARKS, remarks.to_string()),
            ])
            .conform(&schema)
        })
        .collect()
}

fn pick<R: Rng>(names: &[&'static str], rng: &mut R) -> &'static str {
    names.choose(rng).copied().unwrap_or("")
}

fn random_date<R: Rng>(rng: &mut R) -> String {
    format!(
        "20{:02}-{:02}-{:02}",
        rng.gen_range(10..25),
        rng.gen_range(1..13),
        rng.gen_range(1..29)
    )
}
