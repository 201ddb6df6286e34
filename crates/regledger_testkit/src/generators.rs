//! Property-based test generators using proptest.
//!
//! Provides strategies for ledgers, records and names that respect the
//! ledger invariants: unique column names and one value per column.

use proptest::prelude::*;
use regledger_codec::{Record, Schema};
use regledger_core::births::columns::{
    CHILD_FIRST_NAME, CHILD_LAST_NAME, CHILD_MIDDLE_NAME, DATE_OF_BIRTH, REMARKS,
};

/// Strategy for generating schemas of distinct upper-case column names.
pub fn schema_strategy() -> impl Strategy<Value = Schema> {
    prop::collection::hash_set("[A-Z][A-Z_]{0,15}", 1..10)
        .prop_map(|columns| Schema::new(columns.into_iter()))
}

/// Strategy for field values, biased towards text that needs quoting.
pub fn field_value_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        2 => Just(String::new()),
        4 => "[a-zA-Z0-9 ]{1,16}",
        3 => "[a-z ,\"\r\n]{1,16}",
        1 => any::<String>(),
    ]
}

/// Strategy for a schema and rows that conform to it.
pub fn ledger_strategy(max_rows: usize) -> impl Strategy<Value = (Schema, Vec<Record>)> {
    schema_strategy().prop_flat_map(move |schema| {
        let width = schema.len();
        let rows = prop::collection::vec(
            prop::collection::vec(field_value_strategy(), width),
            0..=max_rows,
        );
        (Just(schema), rows).prop_map(|(schema, rows)| {
            let records = rows
                .into_iter()
                .map(|values| Record::from_pairs(schema.columns().iter().cloned().zip(values)))
                .collect();
            (schema, records)
        })
    })
}

/// Strategy for personal names: one capitalised ASCII word.
pub fn name_strategy() -> impl Strategy<Value = String> {
    "[A-Z][a-z]{1,9}"
}

/// Strategy for `YYYY-MM-DD` dates.
pub fn date_strategy() -> impl Strategy<Value = String> {
    (2000u32..2030, 1u32..=12, 1u32..=28)
        .prop_map(|(y, m, d)| format!("{y:04}-{m:02}-{d:02}"))
}

/// Strategy for birth submissions with names, a date and free-text remarks.
pub fn birth_strategy() -> impl Strategy<Value = Record> {
    (
        name_strategy(),
        prop::option::of(name_strategy()),
        name_strategy(),
        date_strategy(),
        field_value_strategy(),
    )
        .prop_map(|(first, middle, last, dob, remarks)| {
            Record::from_pairs([
                (CHILD_FIRST_NAME, first),
                (CHILD_MIDDLE_NAME, middle.unwrap_or_default()),
                (CHILD_LAST_NAME, last),
                (DATE_OF_BIRTH, dob),
                (REMARKS, remarks),
            ])
        })
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Creates a configuration for tests that touch the filesystem.
    #[must_use]
    pub fn filesystem() -> Self {
        Self {
            cases: 16,
            max_shrink_iters: 50,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}
