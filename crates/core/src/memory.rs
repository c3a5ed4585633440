//! In-memory adapters for tests.
//!
//! Service entry writes are staged per unit of work and applied on commit,
//! where the plate/day uniqueness constraint is enforced the same way the
//! database does it.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::Mutex;

use crate::entities::{ServiceEntry, User};
use crate::error::{CoreError, StoreError};
use crate::ports::{
    Page, PageRequest, PasswordHashing, ServiceEntryStore, StoreFactory, TokenIssuer, UserStore,
    PLATE_DAY_CONSTRAINT, USERNAME_CONSTRAINT,
};
use crate::types::DbId;

type Entries = BTreeMap<DbId, ServiceEntry>;

#[derive(Default)]
struct Counters {
    reads: AtomicUsize,
    commits: AtomicUsize,
}

/// Shared in-memory state handing out stores.
#[derive(Clone, Default)]
pub struct MemoryStores {
    entries: Arc<Mutex<Entries>>,
    users: Arc<MemoryUserStore>,
    counters: Arc<Counters>,
    blind_duplicate_check: bool,
}

impl MemoryStores {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `exists_for_plate_on` always answer `false`, so the commit-time
    /// constraint is the only thing standing between two racing writers.
    pub fn with_blind_duplicate_check(mut self) -> Self {
        self.blind_duplicate_check = true;
        self
    }

    pub async fn committed_entry_count(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Number of service entry reads issued so far.
    pub fn read_count(&self) -> usize {
        self.counters.reads.load(Ordering::SeqCst)
    }

    pub fn commit_count(&self) -> usize {
        self.counters.commits.load(Ordering::SeqCst)
    }
}

impl StoreFactory for MemoryStores {
    fn service_entries(&self) -> Box<dyn ServiceEntryStore> {
        Box::new(MemoryServiceEntryStore {
            committed: self.entries.clone(),
            staged: Mutex::new(Vec::new()),
            counters: self.counters.clone(),
            blind_duplicate_check: self.blind_duplicate_check,
        })
    }

    fn users(&self) -> Arc<dyn UserStore> {
        self.users.clone()
    }
}

// ---------------------------------------------------------------------------
// Service entries
// ---------------------------------------------------------------------------

enum Staged {
    Upsert(ServiceEntry),
    Remove(DbId),
}

fn apply(entries: &mut Entries, staged: &[Staged]) {
    for write in staged {
        match write {
            Staged::Upsert(entry) => {
                entries.insert(entry.id(), entry.clone());
            }
            Staged::Remove(id) => {
                entries.remove(id);
            }
        }
    }
}

fn violates_plate_day(entries: &Entries) -> bool {
    let mut seen = std::collections::HashSet::new();
    entries
        .values()
        .any(|e| !seen.insert((e.license_plate().to_string(), e.service_day())))
}

/// One unit of work over the shared entry map.
pub struct MemoryServiceEntryStore {
    committed: Arc<Mutex<Entries>>,
    staged: Mutex<Vec<Staged>>,
    counters: Arc<Counters>,
    blind_duplicate_check: bool,
}

impl MemoryServiceEntryStore {
    /// Committed state with this unit's staged writes applied.
    async fn view(&self) -> Entries {
        let mut entries = self.committed.lock().await.clone();
        apply(&mut entries, &self.staged.lock().await);
        entries
    }

    fn count_read(&self) {
        self.counters.reads.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ServiceEntryStore for MemoryServiceEntryStore {
    async fn exists_for_plate_on(
        &self,
        plate: &str,
        day: NaiveDate,
        excluding: Option<DbId>,
    ) -> Result<bool, StoreError> {
        self.count_read();
        if self.blind_duplicate_check {
            return Ok(false);
        }
        Ok(self.view().await.values().any(|e| {
            e.license_plate() == plate && e.service_day() == day && Some(e.id()) != excluding
        }))
    }

    async fn add(&self, entry: ServiceEntry) -> Result<ServiceEntry, StoreError> {
        self.staged.lock().await.push(Staged::Upsert(entry.clone()));
        Ok(entry)
    }

    async fn replace(&self, entry: ServiceEntry) -> Result<ServiceEntry, StoreError> {
        self.staged.lock().await.push(Staged::Upsert(entry.clone()));
        Ok(entry)
    }

    async fn find_by_id(&self, id: DbId) -> Result<Option<ServiceEntry>, StoreError> {
        self.count_read();
        Ok(self.view().await.remove(&id))
    }

    async fn list(
        &self,
        page: PageRequest,
        plate: Option<&str>,
    ) -> Result<Page<ServiceEntry>, StoreError> {
        self.count_read();
        let mut items: Vec<ServiceEntry> = self
            .view()
            .await
            .into_values()
            .filter(|e| plate.is_none_or(|p| e.license_plate() == p))
            .collect();
        items.sort_by(|a, b| {
            b.service_date()
                .cmp(&a.service_date())
                .then_with(|| b.created_at().cmp(&a.created_at()))
        });

        let total_count = items.len() as u64;
        let items = items
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.page_size as usize)
            .collect();
        Ok(Page {
            items,
            page_number: page.page_number,
            page_size: page.page_size,
            total_count,
        })
    }

    async fn remove(&self, id: DbId) -> Result<bool, StoreError> {
        if !self.view().await.contains_key(&id) {
            return Ok(false);
        }
        self.staged.lock().await.push(Staged::Remove(id));
        Ok(true)
    }

    async fn commit(&self) -> Result<(), StoreError> {
        let mut committed = self.committed.lock().await;
        let mut staged = self.staged.lock().await;

        let mut next = committed.clone();
        apply(&mut next, &staged);
        if violates_plate_day(&next) {
            staged.clear();
            return Err(StoreError::UniqueViolation {
                constraint: PLATE_DAY_CONSTRAINT.to_string(),
            });
        }

        *committed = next;
        staged.clear();
        self.counters.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<BTreeMap<DbId, User>>,
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .lock()
            .await
            .values()
            .find(|u| u.username() == username)
            .cloned())
    }

    async fn find_by_id(&self, id: DbId) -> Result<Option<User>, StoreError> {
        Ok(self.users.lock().await.get(&id).cloned())
    }

    async fn insert(&self, user: User) -> Result<User, StoreError> {
        let mut users = self.users.lock().await;
        if users.values().any(|u| u.username() == user.username()) {
            return Err(StoreError::UniqueViolation {
                constraint: USERNAME_CONSTRAINT.to_string(),
            });
        }
        users.insert(user.id(), user.clone());
        Ok(user)
    }

    async fn update_password_hash(&self, user: &User) -> Result<bool, StoreError> {
        let mut users = self.users.lock().await;
        match users.get_mut(&user.id()) {
            Some(stored) => {
                *stored = user.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// Reversible stand-in for a password hash.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainHasher;

impl PasswordHashing for PlainHasher {
    fn hash(&self, plaintext: &str) -> Result<String, CoreError> {
        Ok(format!("plain${plaintext}"))
    }

    fn verify(&self, plaintext: &str, hash: &str) -> Result<bool, CoreError> {
        Ok(hash.strip_prefix("plain$") == Some(plaintext))
    }
}

/// Issues `token-<user id>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticTokens;

impl TokenIssuer for StaticTokens {
    fn issue(&self, user_id: DbId, _username: &str) -> Result<String, CoreError> {
        Ok(format!("token-{user_id}"))
    }
}
