//! Stress helpers for concurrent ledger writers.
//!
//! Writers are plain OS threads sharing one registry; the ledger lock is the
//! only thing serializing them.

use crate::fixtures::{account, birth};
use regledger_core::births::columns::ID;
use regledger_core::Registry;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

/// Outcome of one stress run.
#[derive(Debug, Clone, Default)]
pub struct StressReport {
    /// Operations that returned `Ok`.
    pub succeeded: usize,
    /// Error messages of the operations that failed.
    pub errors: Vec<String>,
    /// Wall-clock time of the concurrent phase.
    pub elapsed: Duration,
}

impl StressReport {
    /// Number of failed operations.
    pub fn failed(&self) -> usize {
        self.errors.len()
    }
}

impl fmt::Display for StressReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ok, {} failed in {:?}", self.succeeded, self.failed(), self.elapsed)?;
        if let Some(first) = self.errors.first() {
            write!(f, " (first error: {first})")?;
        }
        Ok(())
    }
}

/// Collects per-operation results from writer threads.
#[derive(Default)]
struct Tally {
    succeeded: AtomicUsize,
    errors: Mutex<Vec<String>>,
}

impl Tally {
    fn record<T, E: fmt::Display>(&self, result: Result<T, E>) {
        match result {
            Ok(_) => {
                self.succeeded.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => self
                .errors
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(e.to_string()),
        }
    }

    fn finish(self, elapsed: Duration) -> StressReport {
        StressReport {
            succeeded: self.succeeded.into_inner(),
            errors: self.errors.into_inner().unwrap_or_else(PoisonError::into_inner),
            elapsed,
        }
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of concurrent writer threads.
    pub threads: usize,
    /// Appends performed by each thread.
    pub appends_per_thread: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            threads: 8,
            appends_per_thread: 10,
        }
    }
}

/// The ID given to append `i` of thread `t`.
pub fn stress_record_id(thread: usize, i: usize) -> String {
    format!("T{thread:02}-{i:04}")
}

/// Appends birth records from many threads at once.
///
/// Every append carries a distinct ID from [`stress_record_id`], so the
/// ledger should end up with exactly `threads * appends_per_thread` rows.
pub fn stress_concurrent_appends(registry: &Registry, config: &StressConfig) -> StressReport {
    let tally = Tally::default();
    let start = Instant::now();

    thread::scope(|scope| {
        for t in 0..config.threads {
            let tally = &tally;
            let births = registry.births();
            let count = config.appends_per_thread;

            scope.spawn(move || {
                for i in 0..count {
                    let mut record = birth("Stress", "", &format!("Writer{t}"), "2024-01-01", "");
                    record.set(ID, stress_record_id(t, i));
                    tally.record(births.ledger().append(record));
                }
            });
        }
    });

    tally.finish(start.elapsed())
}

/// Registers accounts from many threads at once, letting the ledger
/// generate every ID.
///
/// Emails are distinct, so every registration should succeed even when two
/// threads draw the same generated ID in the same millisecond.
pub fn stress_concurrent_registrations(registry: &Registry, config: &StressConfig) -> StressReport {
    let tally = Tally::default();
    let start = Instant::now();

    thread::scope(|scope| {
        for t in 0..config.threads {
            let tally = &tally;
            let accounts = registry.accounts();
            let count = config.appends_per_thread;

            scope.spawn(move || {
                for i in 0..count {
                    let email = format!("writer{t}-{i}@example.com");
                    tally.record(accounts.register(account("Stress Writer", &email, "user")));
                }
            });
        }
    });

    tally.finish(start.elapsed())
}

/// Runs status changes from many threads against distinct records.
///
/// Each thread flips its own record between rejected and approved
/// `appends_per_thread` times. Lost updates show up as a record whose final
/// status is not the one its thread wrote last.
pub fn stress_concurrent_updates(registry: &Registry, config: &StressConfig) -> StressReport {
    use regledger_core::Status;

    let ids: Vec<String> = (0..config.threads)
        .map(|t| {
            let mut record = birth("Update", "", &format!("Writer{t}"), "2024-01-01", "");
            record.set(ID, stress_record_id(t, 0));
            registry
                .births()
                .register(record)
                .map(|stored| stored.get_or_empty(ID).to_string())
                .unwrap_or_default()
        })
        .collect();

    let tally = Tally::default();
    let start = Instant::now();

    thread::scope(|scope| {
        for id in &ids {
            let tally = &tally;
            let births = registry.births();
            let count = config.appends_per_thread;

            scope.spawn(move || {
                for i in 0..count {
                    let (status, reason) = if i % 2 == 0 {
                        (Status::Rejected, Some("unreadable scan"))
                    } else {
                        (Status::Approved, None)
                    };
                    tally.record(births.set_status(id, status, reason));
                }
            });
        }
    });

    tally.finish(start.elapsed())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::TestRegistry;
    use regledger_core::Status;
    use std::collections::HashSet;

    #[test]
    fn test_concurrent_appends_lose_nothing() {
        let registry = TestRegistry::new();
        let config = StressConfig {
            threads: 8,
            appends_per_thread: 10,
        };

        let report = stress_concurrent_appends(&registry, &config);
        assert_eq!(report.failed(), 0, "{report}");
        assert_eq!(report.succeeded, 80);

        let records = registry.births().all().unwrap();
        assert_eq!(records.len(), 80);
        let ids: HashSet<_> = records.iter().map(|r| r.get_or_empty(ID).to_string()).collect();
        assert_eq!(ids.len(), 80);
        for t in 0..8 {
            for i in 0..10 {
                assert!(ids.contains(&stress_record_id(t, i)));
            }
        }
    }

    #[test]
    fn test_concurrent_updates_keep_every_write() {
        let registry = TestRegistry::new();
        let config = StressConfig {
            threads: 4,
            appends_per_thread: 5,
        };

        let report = stress_concurrent_updates(&registry, &config);
        assert_eq!(report.failed(), 0, "{report}");
        assert_eq!(report.succeeded, 20);

        // Five flips end on a rejection (i = 4).
        for t in 0..4 {
            let id = stress_record_id(t, 0);
            assert_eq!(registry.births().status_of(&id).unwrap(), Status::Rejected);
            let record = registry.births().find_by_id(&id).unwrap();
            assert_eq!(record.get("REJECT_REASON"), Some("unreadable scan"));
        }
        assert_eq!(registry.births().all().unwrap().len(), 4);
    }

    #[test]
    fn test_concurrent_registrations_with_generated_ids() {
        let config = StressConfig {
            threads: 8,
            appends_per_thread: 5,
        };

        for _ in 0..3 {
            let registry = TestRegistry::new();
            let report = stress_concurrent_registrations(&registry, &config);
            assert_eq!(report.failed(), 0, "{report}");
            assert_eq!(report.succeeded, 40);

            let records = registry.accounts().all().unwrap();
            assert_eq!(records.len(), 40);
            let ids: HashSet<_> = records.iter().map(|r| r.get_or_empty(ID).to_string()).collect();
            assert_eq!(ids.len(), 40);
        }
    }

    #[test]
    fn test_report_display_names_first_error() {
        let tally = Tally::default();
        tally.record::<(), &str>(Ok(()));
        tally.record::<(), _>(Err("lock timed out"));
        let report = tally.finish(Duration::from_millis(5));

        assert_eq!(report.failed(), 1);
        assert_eq!(report.to_string(), "1 ok, 1 failed in 5ms (first error: lock timed out)");
    }
}
