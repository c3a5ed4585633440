//! Operator account entity.
//!
//! ## Invariants
//! - `username` is trimmed, lowercased and never empty.
//! - `password_hash` is never empty. It changes only through
//!   [`User::change_password_hash`].

use crate::error::DomainError;
use crate::types::{new_id, DbId, Timestamp};

/// Canonical username form used for storage and lookups.
pub fn canonical_username(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// A persisted user row, handed back by a store for re-hydration.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: DbId,
    pub username: String,
    pub password_hash: String,
    pub full_name: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// An operator who can log in.
///
/// `Debug` leaves the password hash out.
#[derive(Clone, PartialEq, Eq)]
pub struct User {
    id: DbId,
    username: String,
    password_hash: String,
    full_name: Option<String>,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("full_name", &self.full_name)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish_non_exhaustive()
    }
}

fn guard_username(raw: &str) -> Result<String, DomainError> {
    let username = canonical_username(raw);
    if username.is_empty() {
        return Err(DomainError::EmptyField { field: "username" });
    }
    Ok(username)
}

fn guard_hash(hash: String) -> Result<String, DomainError> {
    if hash.trim().is_empty() {
        return Err(DomainError::EmptyField {
            field: "password_hash",
        });
    }
    Ok(hash)
}

impl User {
    pub fn new(
        username: &str,
        password_hash: String,
        full_name: Option<String>,
        now: Timestamp,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            id: new_id(),
            username: guard_username(username)?,
            password_hash: guard_hash(password_hash)?,
            full_name: full_name
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn restore(record: UserRecord) -> Result<Self, DomainError> {
        Ok(Self {
            id: record.id,
            username: guard_username(&record.username)?,
            password_hash: guard_hash(record.password_hash)?,
            full_name: record.full_name,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }

    /// Swap in a new password hash and stamp `updated_at`.
    pub fn change_password_hash(
        &mut self,
        password_hash: String,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        self.password_hash = guard_hash(password_hash)?;
        self.updated_at = now;
        Ok(())
    }

    pub fn id(&self) -> DbId {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn full_name(&self) -> Option<&str> {
        self.full_name.as_deref()
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn now() -> Timestamp {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn username_is_trimmed_and_lowercased() {
        let user = User::new("  Admin ", "$argon2id$hash".into(), None, now()).unwrap();
        assert_eq!(user.username(), "admin");
    }

    #[test]
    fn rejects_empty_username_or_hash() {
        assert_eq!(
            User::new("   ", "$argon2id$hash".into(), None, now()).unwrap_err(),
            DomainError::EmptyField { field: "username" }
        );
        assert_eq!(
            User::new("admin", " ".into(), None, now()).unwrap_err(),
            DomainError::EmptyField {
                field: "password_hash"
            }
        );
    }

    #[test]
    fn password_change_stamps_update() {
        let mut user = User::new("admin", "old".into(), Some("Site Admin".into()), now()).unwrap();
        let later = now() + chrono::Duration::hours(1);
        user.change_password_hash("new".into(), later).unwrap();
        assert_eq!(user.password_hash(), "new");
        assert_eq!(user.updated_at(), later);
        assert_eq!(user.created_at(), now());
    }

    #[test]
    fn empty_password_change_is_rejected() {
        let mut user = User::new("admin", "old".into(), None, now()).unwrap();
        assert!(user.change_password_hash(String::new(), now()).is_err());
        assert_eq!(user.password_hash(), "old");
    }

    #[test]
    fn debug_output_omits_hash() {
        let user = User::new("admin", "secret-hash".into(), None, now()).unwrap();
        assert!(!format!("{user:?}").contains("secret-hash"));
    }
}
