//! Test fixtures and registry helpers.
//!
//! Provides temporary registries and the sample people used across tests.

use regledger_core::births::columns::{
    CHILD_FIRST_NAME, CHILD_LAST_NAME, CHILD_MIDDLE_NAME, DATE_OF_BIRTH, DISTRICT, GENDER,
    PLACE_OF_BIRTH, REGISTERED_BY,
};
use regledger_core::{Config, NewAccount, Record, Registry};
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

/// Lock retry count used by test registries.
pub const TEST_LOCK_RETRIES: u32 = 5_000;

/// Lock retry delay used by test registries.
pub const TEST_LOCK_DELAY: Duration = Duration::from_millis(2);

/// A registry in a temporary directory, removed on drop.
pub struct TestRegistry {
    /// The registry instance.
    pub registry: Registry,
    /// The temporary directory (kept alive to prevent cleanup).
    _temp_dir: TempDir,
}

impl TestRegistry {
    /// Creates an empty registry with short lock delays.
    pub fn new() -> Self {
        Self::with_config(|config| config)
    }

    /// Creates an empty registry, letting `configure` adjust the config.
    pub fn with_config(configure: impl FnOnce(Config) -> Config) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config = Config::default()
            .with_data_dir(temp_dir.path().join("db"))
            .with_lock_retries(TEST_LOCK_RETRIES, TEST_LOCK_DELAY);
        let registry = Registry::open(configure(config)).expect("Failed to open registry");

        Self {
            registry,
            _temp_dir: temp_dir,
        }
    }

    /// Creates a registry holding [`sample_births`].
    pub fn seeded() -> Self {
        let test = Self::new();
        for record in sample_births() {
            test.births()
                .register(record)
                .expect("Failed to register sample birth");
        }
        test
    }

    /// Returns the data directory.
    pub fn data_dir(&self) -> &Path {
        self.registry.config().data_path()
    }
}

impl Default for TestRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for TestRegistry {
    type Target = Registry;

    fn deref(&self) -> &Self::Target {
        &self.registry
    }
}

/// Builds a birth submission for a child.
pub fn birth(first: &str, middle: &str, last: &str, dob: &str, gender: &str) -> Record {
    Record::from_pairs([
        (CHILD_FIRST_NAME, first),
        (CHILD_MIDDLE_NAME, middle),
        (CHILD_LAST_NAME, last),
        (GENDER, gender),
        (DATE_OF_BIRTH, dob),
        (PLACE_OF_BIRTH, "Paropakar Maternity Hospital, Thapathali"),
        (DISTRICT, "Kathmandu"),
        (REGISTERED_BY, "registrar-1700000000000-1"),
    ])
}

/// Three registrations: Arjun Kumar Sharma, Maya Rai and Rajesh Tamang.
pub fn sample_births() -> Vec<Record> {
    vec![
        birth("Arjun", "Kumar", "Sharma", "2023-05-15", "Male"),
        birth("Maya", "", "Rai", "2023-06-22", "Female"),
        birth("Rajesh", "", "Tamang", "2023-07-10", "Male"),
    ]
}

/// Builds an account registration with precomputed credentials.
pub fn account(name: &str, email: &str, role: &str) -> NewAccount {
    NewAccount {
        name: name.to_string(),
        email: email.to_string(),
        password_hash: format!("hash-of-{email}"),
        salt: format!("salt-of-{email}"),
        phone: "9841000000".to_string(),
        address: "Kathmandu-10, Baneshwor".to_string(),
        role: role.to_string(),
        secret_code: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_is_empty() {
        let registry = TestRegistry::new();
        assert!(registry.data_dir().is_dir());
        assert!(registry.accounts().all().unwrap().is_empty());
    }

    #[test]
    fn test_seeded_registry() {
        let registry = TestRegistry::seeded();
        let births = registry.births().all().unwrap();
        assert_eq!(births.len(), 3);
        assert_eq!(births[0].get(CHILD_LAST_NAME), Some("Sharma"));
    }

    #[test]
    fn test_account_builder() {
        let registry = TestRegistry::new();
        let stored = registry
            .accounts()
            .register(account("Hari Thapa", "hari@example.com", "user"))
            .unwrap();
        assert!(stored.get_or_empty("ID").starts_with("user-"));
    }
}
