//! Collaborator ports consumed by the core.
//!
//! Adapters live outside this crate: PostgreSQL in `autoservice-db`, JWT and
//! Argon2 in `autoservice-api`, in-memory doubles behind the
//! `test-support` feature.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::entities::{ServiceEntry, User};
use crate::error::{CoreError, StoreError};
use crate::types::DbId;

/// Name of the uniqueness constraint on (plate, service day).
pub const PLATE_DAY_CONSTRAINT: &str = "uq_service_entries_plate_day";

/// Name of the uniqueness constraint on usernames.
pub const USERNAME_CONSTRAINT: &str = "uq_users_username";

/// A validated page request (1-based page number).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page_number: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub fn offset(&self) -> u64 {
        u64::from(self.page_number.saturating_sub(1)) * u64::from(self.page_size)
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page_number: u32,
    pub page_size: u32,
    pub total_count: u64,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> u64 {
        if self.page_size == 0 {
            return 0;
        }
        self.total_count.div_ceil(u64::from(self.page_size))
    }
}

/// Service entry persistence, scoped to one request.
///
/// Writes are staged until [`commit`](Self::commit). Dropping the store
/// without committing discards them.
#[async_trait]
pub trait ServiceEntryStore: Send + Sync {
    /// Whether an entry exists for `plate` on the UTC calendar day `day`,
    /// ignoring the entry `excluding` when given.
    async fn exists_for_plate_on(
        &self,
        plate: &str,
        day: NaiveDate,
        excluding: Option<DbId>,
    ) -> Result<bool, StoreError>;

    async fn add(&self, entry: ServiceEntry) -> Result<ServiceEntry, StoreError>;

    async fn replace(&self, entry: ServiceEntry) -> Result<ServiceEntry, StoreError>;

    async fn find_by_id(&self, id: DbId) -> Result<Option<ServiceEntry>, StoreError>;

    /// Entries ordered by service date, newest first.
    async fn list(
        &self,
        page: PageRequest,
        plate: Option<&str>,
    ) -> Result<Page<ServiceEntry>, StoreError>;

    async fn remove(&self, id: DbId) -> Result<bool, StoreError>;

    async fn commit(&self) -> Result<(), StoreError>;
}

/// User persistence. Writes take effect immediately.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Look up by canonical (trimmed, lowercased) username.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: DbId) -> Result<Option<User>, StoreError>;

    async fn insert(&self, user: User) -> Result<User, StoreError>;

    /// Persist the user's current password hash. Returns `false` if the
    /// user no longer exists.
    async fn update_password_hash(&self, user: &User) -> Result<bool, StoreError>;
}

/// Hands out persistence collaborators.
pub trait StoreFactory: Send + Sync {
    /// A fresh unit of work for service entries.
    fn service_entries(&self) -> Box<dyn ServiceEntryStore>;

    fn users(&self) -> Arc<dyn UserStore>;
}

/// Password hashing. The core never implements a hash itself.
pub trait PasswordHashing: Send + Sync {
    fn hash(&self, plaintext: &str) -> Result<String, CoreError>;

    fn verify(&self, plaintext: &str, hash: &str) -> Result<bool, CoreError>;
}

/// Bearer token issuance. Tokens are opaque to the core.
pub trait TokenIssuer: Send + Sync {
    fn issue(&self, user_id: DbId, username: &str) -> Result<String, CoreError>;
}

/// Run a store call unless `cancel` fires first.
pub async fn cancellable<T, F>(cancel: &CancellationToken, op: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(StoreError::Cancelled),
        result = op => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_is_zero_based() {
        let page = PageRequest {
            page_number: 3,
            page_size: 20,
        };
        assert_eq!(page.offset(), 40);
    }

    #[test]
    fn total_pages_rounds_up() {
        let page: Page<()> = Page {
            items: vec![],
            page_number: 1,
            page_size: 10,
            total_count: 21,
        };
        assert_eq!(page.total_pages(), 3);
    }

    #[tokio::test]
    async fn cancelled_token_wins() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = cancellable(&cancel, async { Ok::<_, StoreError>(1) }).await;
        assert!(matches!(result, Err(StoreError::Cancelled)));
    }

    #[tokio::test]
    async fn live_token_runs_operation() {
        let cancel = CancellationToken::new();
        let result = cancellable(&cancel, async { Ok::<_, StoreError>(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }
}
