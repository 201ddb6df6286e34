//! Fuzzy name search over birth records.
//!
//! Each record is scored against a [`Query`] two ways and the better one
//! wins:
//!
//! ```text
//! full    = 0.8 * similarity(query, full name)  + 0.2 * dob_hit
//! surname = 0.9 * similarity(query, last token) + 0.1 * dob_hit
//! score   = max(full, surname)
//! ```
//!
//! `dob_hit` is 1 when the query's date equals the first ten characters of
//! the record's `DATE_OF_BIRTH`. Records scoring above the threshold are
//! returned best first, up to the limit.

use crate::births::columns::{CHILD_FIRST_NAME, CHILD_LAST_NAME, CHILD_MIDDLE_NAME, DATE_OF_BIRTH};
use crate::types::Query;
use regledger_codec::Record;
use serde::Serialize;

/// Characters of `DATE_OF_BIRTH` compared against the query date.
const DOB_PREFIX_LEN: usize = 10;

/// Default minimum score (exclusive).
pub const DEFAULT_THRESHOLD: f64 = 0.45;

/// Default maximum number of results.
pub const DEFAULT_LIMIT: usize = 10;

/// A scored search hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Match {
    /// The matching record.
    pub record: Record,
    /// Similarity score in `[0, 1]`.
    pub score: f64,
}

/// Ranks records against queries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matcher {
    threshold: f64,
    limit: usize,
}

impl Default for Matcher {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD, DEFAULT_LIMIT)
    }
}

impl Matcher {
    /// Creates a matcher keeping scores above `threshold`, at most `limit`.
    #[must_use]
    pub const fn new(threshold: f64, limit: usize) -> Self {
        Self { threshold, limit }
    }

    /// Scores a single record.
    #[must_use]
    pub fn score(&self, query: &Query, record: &Record) -> f64 {
        let name = full_name(record);
        let full_sim = similarity(&query.name, &name);
        let last_sim = similarity(&query.name, last_token(&name));

        let wanted_dob = query.dob.trim();
        let dob_hit = if !wanted_dob.is_empty() && dob_prefix(record) == wanted_dob {
            1.0
        } else {
            0.0
        };

        f64::max(0.8 * full_sim + 0.2 * dob_hit, 0.9 * last_sim + 0.1 * dob_hit)
    }

    /// Returns the best matches, highest score first.
    ///
    /// Ties keep ledger order.
    pub fn search<I>(&self, query: &Query, records: I) -> Vec<Match>
    where
        I: IntoIterator<Item = Record>,
    {
        let mut matches: Vec<Match> = records
            .into_iter()
            .filter_map(|record| {
                let score = self.score(query, &record);
                (score > self.threshold).then_some(Match { record, score })
            })
            .collect();

        matches.sort_by(|a, b| b.score.total_cmp(&a.score));
        matches.truncate(self.limit);
        matches
    }
}

/// Edit distance between two names after trimming and lowercasing.
///
/// Insertions, deletions and substitutions each cost 1; lengths are counted
/// in characters.
#[must_use]
pub fn edit_distance(a: &str, b: &str) -> usize {
    strsim::levenshtein(&normalize(a), &normalize(b))
}

/// Similarity in `[0, 1]`: `1 - distance / longer length`.
///
/// Two empty names are identical (1); one empty name matches nothing (0).
#[must_use]
pub fn similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(&normalize(a), &normalize(b))
}

/// Child full name: first, middle and last name joined, empties skipped.
#[must_use]
pub fn full_name(record: &Record) -> String {
    [CHILD_FIRST_NAME, CHILD_MIDDLE_NAME, CHILD_LAST_NAME]
        .iter()
        .map(|c| record.get_or_empty(c).trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Last whitespace-separated token, or `""`.
#[must_use]
pub fn last_token(name: &str) -> &str {
    name.split_whitespace().last().unwrap_or("")
}

fn dob_prefix(record: &Record) -> String {
    record
        .get_or_empty(DATE_OF_BIRTH)
        .trim()
        .chars()
        .take(DOB_PREFIX_LEN)
        .collect()
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn child(first: &str, middle: &str, last: &str, dob: &str) -> Record {
        Record::from_pairs([
            (CHILD_FIRST_NAME, first),
            (CHILD_MIDDLE_NAME, middle),
            (CHILD_LAST_NAME, last),
            (DATE_OF_BIRTH, dob),
        ])
    }

    #[test]
    fn distance_basics() {
        assert_eq!(edit_distance("kitten", "sitting"), 3);
        assert_eq!(edit_distance("", "abc"), 3);
        assert_eq!(edit_distance("  Sharma ", "sharma"), 0);
        assert_eq!(edit_distance("flaw", "lawn"), 2);
    }

    #[test]
    fn similarity_edge_cases() {
        assert_eq!(similarity("", ""), 1.0);
        assert_eq!(similarity("", "x"), 0.0);
        assert_eq!(similarity("x", "   "), 0.0);
        assert_eq!(similarity("Rai", "rai"), 1.0);
        assert!((similarity("abcd", "abce") - 0.75).abs() < 1e-12);
    }

    #[test]
    fn full_name_skips_empty_parts() {
        assert_eq!(full_name(&child("Maya", "", "Rai", "")), "Maya Rai");
        assert_eq!(last_token("Arjun Kumar Sharma"), "Sharma");
        assert_eq!(last_token("   "), "");
    }

    #[test]
    fn surname_query_ranks_exact_surname() {
        let records = vec![
            child("Maya", "", "Rai", "2023-06-22"),
            child("Arjun", "Kumar", "Sharma", "2023-05-15"),
        ];
        let results = Matcher::default().search(&Query::new("Sharma"), records);

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].record.get(CHILD_LAST_NAME), Some("Sharma"));
        assert!((results[0].score - 0.9).abs() < 1e-12);
    }

    #[test]
    fn dob_bonus_applies_to_prefix() {
        let record = child("Rajesh", "", "Tamang", "2023-07-10T00:00:00Z");
        let matcher = Matcher::default();

        let without = matcher.score(&Query::new("Rajesh Tamang"), &record);
        let with = matcher.score(&Query::new("Rajesh Tamang").with_dob("2023-07-10"), &record);
        assert!((without - 0.8).abs() < 1e-12);
        assert!((with - 1.0).abs() < 1e-12);
    }

    #[test]
    fn wrong_dob_gives_no_bonus() {
        let record = child("Rajesh", "", "Tamang", "2023-07-10");
        let matcher = Matcher::default();
        let a = matcher.score(&Query::new("Tamang"), &record);
        let b = matcher.score(&Query::new("Tamang").with_dob("2023-07-11"), &record);
        assert_eq!(a, b);
    }

    #[test]
    fn results_are_sorted_and_limited() {
        let records: Vec<_> = ["Sharma", "Sharmo", "Sherma", "Sharma", "Shama"]
            .iter()
            .map(|last| child("A", "", last, ""))
            .collect();

        let results = Matcher::new(0.45, 3).search(&Query::new("Sharma"), records);
        assert_eq!(results.len(), 3);
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
        assert_eq!(results[0].record.get(CHILD_LAST_NAME), Some("Sharma"));
        assert_eq!(results[1].record.get(CHILD_LAST_NAME), Some("Sharma"));
    }

    #[test]
    fn threshold_is_exclusive() {
        let record = child("", "", "ab", "");
        // similarity("a", "ab") = 0.5, so both formulas give 0.4 and 0.45.
        let matcher = Matcher::new(0.45, 10);
        assert!(matcher.search(&Query::new("a"), vec![record]).is_empty());
    }

    proptest! {
        #[test]
        fn similarity_is_symmetric(a in "[a-zA-Z ]{0,12}", b in "[a-zA-Z ]{0,12}") {
            prop_assert_eq!(similarity(&a, &b), similarity(&b, &a));
        }

        #[test]
        fn similarity_in_unit_interval(a in ".{0,12}", b in ".{0,12}") {
            let s = similarity(&a, &b);
            prop_assert!((0.0..=1.0).contains(&s));
        }

        #[test]
        fn self_similarity_is_one(a in ".{0,12}") {
            prop_assert_eq!(similarity(&a, &a), 1.0);
        }
    }
}
