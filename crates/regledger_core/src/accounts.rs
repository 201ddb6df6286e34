//! Account ledger.
//!
//! Accounts are keyed by `ID` and, case-insensitively, by `EMAIL`. Password
//! hashes and salts arrive already computed and are stored verbatim.

use crate::error::{CoreError, CoreResult};
use crate::id;
use crate::ledger::{Ledger, LedgerKind};
use chrono::Utc;
use regledger_codec::{Record, Schema};
use regledger_storage::{BackupManager, LockManager};
use serde::Serialize;
use std::path::PathBuf;

/// Account ledger column names.
pub mod columns {
    /// Identity column.
    pub const ID: &str = "ID";
    /// Display name.
    pub const NAME: &str = "NAME";
    /// Login email, unique case-insensitively.
    pub const EMAIL: &str = "EMAIL";
    /// Password hash.
    pub const PASSWORD_HASH: &str = "PASSWORD_hash";
    /// Password salt.
    pub const SALT: &str = "SALT";
    /// Phone number.
    pub const PHONE: &str = "PHONE";
    /// Postal address.
    pub const ADDRESS: &str = "ADDRESS";
    /// Role, e.g. `administrator` or `registrar`.
    pub const ROLE: &str = "ROLE";
    /// Administrator secret code; `0` for other roles.
    pub const SECRET_CODE: &str = "SECRET_CODE";
}

use columns::*;

/// Column order of a newly created account ledger.
pub const ACCOUNT_COLUMNS: [&str; 9] = [
    ID,
    NAME,
    EMAIL,
    PASSWORD_HASH,
    SALT,
    PHONE,
    ADDRESS,
    ROLE,
    SECRET_CODE,
];

/// Role whose accounts keep their secret code.
pub const ADMINISTRATOR_ROLE: &str = "administrator";

/// Stored in place of a secret code for non-administrators.
const NO_SECRET_CODE: &str = "0";

/// Columns never returned to clients.
const SENSITIVE_COLUMNS: [&str; 2] = [PASSWORD_HASH, SALT];

/// Account ledger behaviour.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccountKind;

impl LedgerKind for AccountKind {
    fn name(&self) -> &'static str {
        "accounts"
    }

    fn schema(&self) -> Schema {
        Schema::new(ACCOUNT_COLUMNS)
    }

    fn prepare(&self, record: &mut Record) -> CoreResult<()> {
        let role = record.get_or_empty(ROLE).trim().to_string();
        if role.is_empty() {
            return Err(CoreError::missing_field(ROLE));
        }
        if record.get_or_empty(ID).is_empty() {
            record.set(ID, id::account_id(&role, Utc::now(), &mut rand::thread_rng()));
        }
        if !role.eq_ignore_ascii_case(ADMINISTRATOR_ROLE) {
            record.set(SECRET_CODE, NO_SECRET_CODE);
        }
        Ok(())
    }

    fn unique_keys(&self) -> &'static [&'static str] {
        &[ID, EMAIL]
    }

    fn regenerate(&self, column: &str, record: &Record) -> Option<String> {
        (column == ID).then(|| id::account_id(record.get_or_empty(ROLE), Utc::now(), &mut rand::thread_rng()))
    }
}

/// Fields of a new account, as validated by the transport layer.
#[derive(Debug, Clone, Default)]
pub struct NewAccount {
    /// Display name.
    pub name: String,
    /// Login email.
    pub email: String,
    /// Precomputed password hash.
    pub password_hash: String,
    /// Salt used for the hash.
    pub salt: String,
    /// Optional phone number.
    pub phone: String,
    /// Optional address.
    pub address: String,
    /// Account role.
    pub role: String,
    /// Secret code; only kept for administrators.
    pub secret_code: Option<String>,
}

impl NewAccount {
    fn into_record(self) -> Record {
        Record::from_pairs([
            (NAME, self.name),
            (EMAIL, self.email.trim().to_string()),
            (PASSWORD_HASH, self.password_hash),
            (SALT, self.salt),
            (PHONE, self.phone),
            (ADDRESS, self.address),
            (ROLE, self.role),
            (SECRET_CODE, self.secret_code.unwrap_or_default()),
        ])
    }
}

/// Profile fields an account holder may change; `None` leaves a field as is.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    /// New display name.
    pub name: Option<String>,
    /// New phone number.
    pub phone: Option<String>,
    /// New address.
    pub address: Option<String>,
}

/// An account with its password hash and salt removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AccountView(Record);

impl AccountView {
    /// Projects a stored account.
    #[must_use]
    pub fn from_record(record: &Record) -> Self {
        Self(record.without(&SENSITIVE_COLUMNS))
    }

    /// Returns the visible fields.
    #[must_use]
    pub fn record(&self) -> &Record {
        &self.0
    }
}

/// The account ledger.
#[derive(Debug, Clone)]
pub struct Accounts {
    ledger: Ledger<AccountKind>,
}

impl Accounts {
    /// Creates the account ledger over `path`.
    pub fn new(path: impl Into<PathBuf>, locks: LockManager, backups: BackupManager) -> Self {
        Self {
            ledger: Ledger::new(AccountKind, path, locks, backups),
        }
    }

    /// Returns the underlying ledger.
    pub fn ledger(&self) -> &Ledger<AccountKind> {
        &self.ledger
    }

    /// Registers a new account.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DuplicateKey`] if the email is taken, or
    /// [`CoreError::MissingField`] if the role is empty.
    pub fn register(&self, account: NewAccount) -> CoreResult<Record> {
        if account.email.trim().is_empty() {
            return Err(CoreError::missing_field(EMAIL));
        }
        self.ledger.insert(account.into_record())
    }

    /// Looks an account up by email, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if no account has that email.
    pub fn find_by_email(&self, email: &str) -> CoreResult<Record> {
        self.ledger.find_by_key(EMAIL, email)
    }

    /// Looks an account up by ID.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if no account has that ID.
    pub fn find_by_id(&self, id: &str) -> CoreResult<Record> {
        self.ledger.find_by_key(ID, id)
    }

    /// Replaces the password hash and salt of the account with `email`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if no account has that email.
    pub fn reset_password(&self, email: &str, password_hash: &str, salt: &str) -> CoreResult<()> {
        self.ledger.update_by_key(EMAIL, email, |record| {
            record.set(PASSWORD_HASH, password_hash);
            record.set(SALT, salt);
            Ok(())
        })?;
        Ok(())
    }

    /// Applies a profile update to the account with `id`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if no account has that ID.
    pub fn update_profile(&self, id: &str, update: &ProfileUpdate) -> CoreResult<Record> {
        self.ledger.update_by_key(ID, id, |record| {
            let changes = [
                (NAME, &update.name),
                (PHONE, &update.phone),
                (ADDRESS, &update.address),
            ];
            for (column, value) in changes {
                if let Some(value) = value {
                    record.set(column, value.as_str());
                }
            }
            Ok(())
        })
    }

    /// Returns every account.
    ///
    /// # Errors
    ///
    /// Returns an I/O or codec error.
    pub fn all(&self) -> CoreResult<Vec<Record>> {
        self.ledger.records()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regledger_storage::LockOptions;
    use std::time::Duration;
    use tempfile::{tempdir, TempDir};

    fn accounts(dir: &TempDir) -> Accounts {
        Accounts::new(
            dir.path().join("users.csv"),
            LockManager::new(LockOptions::new(3, Duration::from_millis(5))),
            BackupManager::new(dir.path().join("backups")),
        )
    }

    fn new_account(email: &str, role: &str) -> NewAccount {
        NewAccount {
            name: "Sita Sharma".into(),
            email: email.into(),
            password_hash: "$2a$10$hash".into(),
            salt: "$2a$10$salt".into(),
            phone: "9800000000".into(),
            address: "Lalitpur, Ward 3".into(),
            role: role.into(),
            secret_code: Some("4321".into()),
        }
    }

    #[test]
    fn register_generates_role_tagged_id() {
        let dir = tempdir().unwrap();
        let stored = accounts(&dir)
            .register(new_account("sita@example.com", "Registrar"))
            .unwrap();

        assert!(stored.get_or_empty(ID).starts_with("registrar-"));
        assert_eq!(stored.get(SECRET_CODE), Some("0"));
        assert_eq!(stored.columns().collect::<Vec<_>>(), ACCOUNT_COLUMNS);
    }

    #[test]
    fn administrator_keeps_secret_code() {
        let dir = tempdir().unwrap();
        let stored = accounts(&dir)
            .register(new_account("admin@example.com", "administrator"))
            .unwrap();
        assert_eq!(stored.get(SECRET_CODE), Some("4321"));
    }

    #[test]
    fn duplicate_email_rejected() {
        let dir = tempdir().unwrap();
        let accounts = accounts(&dir);
        accounts.register(new_account("sita@example.com", "user")).unwrap();

        let err = accounts
            .register(new_account("SITA@example.com", "user"))
            .unwrap_err();
        assert!(err.is_duplicate_key());
    }

    #[test]
    fn missing_role_rejected() {
        let dir = tempdir().unwrap();
        let err = accounts(&dir)
            .register(new_account("x@example.com", " "))
            .unwrap_err();
        assert!(matches!(err, CoreError::MissingField { .. }));
    }

    #[test]
    fn reset_password_changes_only_credentials() {
        let dir = tempdir().unwrap();
        let accounts = accounts(&dir);
        let before = accounts.register(new_account("sita@example.com", "user")).unwrap();

        accounts
            .reset_password("Sita@Example.com", "newhash", "newsalt")
            .unwrap();

        let after = accounts.find_by_email("sita@example.com").unwrap();
        assert_eq!(after.get(PASSWORD_HASH), Some("newhash"));
        assert_eq!(after.get(SALT), Some("newsalt"));
        assert_eq!(after.get(NAME), before.get(NAME));
        assert_eq!(after.get(ID), before.get(ID));
    }

    #[test]
    fn reset_password_unknown_email() {
        let dir = tempdir().unwrap();
        let err = accounts(&dir)
            .reset_password("ghost@example.com", "h", "s")
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn profile_update_applies_given_fields() {
        let dir = tempdir().unwrap();
        let accounts = accounts(&dir);
        let stored = accounts.register(new_account("sita@example.com", "user")).unwrap();
        let id = stored.get_or_empty(ID).to_string();

        let update = ProfileUpdate {
            phone: Some("9811111111".into()),
            ..ProfileUpdate::default()
        };
        let updated = accounts.update_profile(&id, &update).unwrap();

        assert_eq!(updated.get(PHONE), Some("9811111111"));
        assert_eq!(updated.get(ADDRESS), Some("Lalitpur, Ward 3"));
    }

    #[test]
    fn view_hides_credentials() {
        let dir = tempdir().unwrap();
        let stored = accounts(&dir)
            .register(new_account("sita@example.com", "user"))
            .unwrap();

        let view = AccountView::from_record(&stored);
        assert!(!view.record().contains(PASSWORD_HASH));
        assert!(!view.record().contains(SALT));

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["EMAIL"], "sita@example.com");
        assert!(json.get("SALT").is_none());
    }
}
