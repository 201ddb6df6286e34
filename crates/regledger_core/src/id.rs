//! Record identity generation.
//!
//! Identifiers combine a type tag, the wall-clock time in milliseconds and a
//! random tie-breaker. They are unique in practice without a prior scan of
//! the ledger, but not guaranteed unique: two appenders in the same
//! millisecond can draw the same tie-breaker. Ledgers that need a hard
//! guarantee check their unique columns under the lock.

use chrono::{DateTime, Datelike, Utc};
use rand::Rng;

/// Prefix of birth record identifiers.
pub const BIRTH_ID_PREFIX: &str = "BR";

/// Prefix of certificate numbers.
pub const CERTIFICATE_PREFIX: &str = "BC";

/// Account identifier: `<role>-<millis>-<digit>`, role lowercased.
pub fn account_id<R: Rng>(role: &str, now: DateTime<Utc>, rng: &mut R) -> String {
    format!(
        "{}-{}-{}",
        role.trim().to_lowercase(),
        now.timestamp_millis(),
        rng.gen_range(0..10)
    )
}

/// Birth record identifier: `BR-<millis>-<4 digits>`.
pub fn birth_record_id<R: Rng>(now: DateTime<Utc>, rng: &mut R) -> String {
    format!(
        "{BIRTH_ID_PREFIX}-{}-{:04}",
        now.timestamp_millis(),
        rng.gen_range(0..10_000)
    )
}

/// Certificate number: `BC-<year>-<last 6 digits of millis>-<3 digits>`.
pub fn certificate_no<R: Rng>(now: DateTime<Utc>, rng: &mut R) -> String {
    format!(
        "{CERTIFICATE_PREFIX}-{}-{:06}-{:03}",
        now.year(),
        now.timestamp_millis().rem_euclid(1_000_000),
        rng.gen_range(0..1_000)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn fixed_time() -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_700_000_123_456).unwrap()
    }

    #[test]
    fn account_id_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        let id = account_id(" Administrator ", fixed_time(), &mut rng);

        let parts: Vec<_> = id.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "administrator");
        assert_eq!(parts[1], "1700000123456");
        assert_eq!(parts[2].len(), 1);
    }

    #[test]
    fn birth_id_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        let id = birth_record_id(fixed_time(), &mut rng);
        assert!(id.starts_with("BR-1700000123456-"));
        assert_eq!(id.len(), "BR-1700000123456-0000".len());
    }

    #[test]
    fn certificate_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        let cert = certificate_no(fixed_time(), &mut rng);
        assert!(cert.starts_with("BC-2023-123456-"));
        assert_eq!(cert.len(), "BC-2023-123456-000".len());
    }

    #[test]
    fn ids_differ_across_draws() {
        let mut rng = rand::thread_rng();
        let now = Utc::now();
        let ids: std::collections::HashSet<_> =
            (0..50).map(|_| birth_record_id(now, &mut rng)).collect();
        assert!(ids.len() > 1);
    }
}
