//! PostgreSQL adapters for the core persistence ports.

use std::sync::Arc;

use async_trait::async_trait;
use autoservice_core::entities::{ServiceEntry, User};
use autoservice_core::error::StoreError;
use autoservice_core::ports::{
    Page, PageRequest, ServiceEntryStore, StoreFactory, UserStore,
};
use autoservice_core::types::DbId;
use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, Transaction};
use tokio::sync::Mutex;

use crate::repositories::{ServiceEntryRepo, UserRepo};

/// Map a sqlx error onto the store error the core understands.
///
/// Unique violations (code 23505) on constraints named `uq_*` keep the
/// constraint name so the core can tell which rule was hit.
pub fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("23505") {
            if let Some(constraint) = db_err.constraint().filter(|c| c.starts_with("uq_")) {
                return StoreError::UniqueViolation {
                    constraint: constraint.to_string(),
                };
            }
        }
    }
    StoreError::Backend(err.to_string())
}

/// Hands out PostgreSQL-backed stores sharing one pool.
#[derive(Clone)]
pub struct PgStores {
    pool: PgPool,
    users: Arc<PgUserStore>,
}

impl PgStores {
    pub fn new(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PgUserStore::new(pool.clone())),
            pool,
        }
    }
}

impl StoreFactory for PgStores {
    fn service_entries(&self) -> Box<dyn ServiceEntryStore> {
        Box::new(PgServiceEntryStore::new(self.pool.clone()))
    }

    fn users(&self) -> Arc<dyn UserStore> {
        self.users.clone()
    }
}

// ---------------------------------------------------------------------------
// Service entries
// ---------------------------------------------------------------------------

/// One unit of work: a transaction opened on first use and committed by
/// [`commit`](ServiceEntryStore::commit). Dropping the store without
/// committing rolls the transaction back.
pub struct PgServiceEntryStore {
    pool: PgPool,
    tx: Mutex<Option<Transaction<'static, Postgres>>>,
}

impl PgServiceEntryStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            tx: Mutex::new(None),
        }
    }

    async fn transaction<'a>(
        &self,
        slot: &'a mut Option<Transaction<'static, Postgres>>,
    ) -> Result<&'a mut Transaction<'static, Postgres>, StoreError> {
        let tx = match slot.take() {
            Some(tx) => tx,
            None => {
                tracing::debug!("Opening service entry transaction");
                self.pool.begin().await.map_err(map_sqlx_error)?
            }
        };
        Ok(slot.insert(tx))
    }
}

#[async_trait]
impl ServiceEntryStore for PgServiceEntryStore {
    async fn exists_for_plate_on(
        &self,
        plate: &str,
        day: NaiveDate,
        excluding: Option<DbId>,
    ) -> Result<bool, StoreError> {
        let mut slot = self.tx.lock().await;
        let tx = self.transaction(&mut slot).await?;
        ServiceEntryRepo::exists_for_plate_on(&mut **tx, plate, day, excluding)
            .await
            .map_err(map_sqlx_error)
    }

    async fn add(&self, entry: ServiceEntry) -> Result<ServiceEntry, StoreError> {
        let mut slot = self.tx.lock().await;
        let tx = self.transaction(&mut slot).await?;
        let row = ServiceEntryRepo::create(&mut **tx, &entry)
            .await
            .map_err(map_sqlx_error)?;
        Ok(ServiceEntry::try_from(row)?)
    }

    async fn replace(&self, entry: ServiceEntry) -> Result<ServiceEntry, StoreError> {
        let mut slot = self.tx.lock().await;
        let tx = self.transaction(&mut slot).await?;
        let row = ServiceEntryRepo::replace(&mut **tx, &entry)
            .await
            .map_err(map_sqlx_error)?
            .ok_or_else(|| StoreError::Backend(format!("service entry {} vanished", entry.id())))?;
        Ok(ServiceEntry::try_from(row)?)
    }

    async fn find_by_id(&self, id: DbId) -> Result<Option<ServiceEntry>, StoreError> {
        let mut slot = self.tx.lock().await;
        let tx = self.transaction(&mut slot).await?;
        let row = ServiceEntryRepo::find_by_id(&mut **tx, id)
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(ServiceEntry::try_from).transpose()?)
    }

    async fn list(
        &self,
        page: PageRequest,
        plate: Option<&str>,
    ) -> Result<Page<ServiceEntry>, StoreError> {
        let mut slot = self.tx.lock().await;
        let tx = self.transaction(&mut slot).await?;

        let total = ServiceEntryRepo::count(&mut **tx, plate)
            .await
            .map_err(map_sqlx_error)?;
        let offset = i64::try_from(page.offset()).unwrap_or(i64::MAX);
        let rows = ServiceEntryRepo::list(&mut **tx, plate, i64::from(page.page_size), offset)
            .await
            .map_err(map_sqlx_error)?;

        let items = rows
            .into_iter()
            .map(ServiceEntry::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page {
            items,
            page_number: page.page_number,
            page_size: page.page_size,
            total_count: u64::try_from(total).unwrap_or_default(),
        })
    }

    async fn remove(&self, id: DbId) -> Result<bool, StoreError> {
        let mut slot = self.tx.lock().await;
        let tx = self.transaction(&mut slot).await?;
        ServiceEntryRepo::delete(&mut **tx, id)
            .await
            .map_err(map_sqlx_error)
    }

    async fn commit(&self) -> Result<(), StoreError> {
        let Some(tx) = self.tx.lock().await.take() else {
            return Ok(());
        };
        tx.commit().await.map_err(map_sqlx_error)?;
        tracing::debug!("Service entry transaction committed");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// User store; every write commits on its own.
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let row = UserRepo::find_by_username(&self.pool, username)
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(User::try_from).transpose()?)
    }

    async fn find_by_id(&self, id: DbId) -> Result<Option<User>, StoreError> {
        let row = UserRepo::find_by_id(&self.pool, id)
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(User::try_from).transpose()?)
    }

    async fn insert(&self, user: User) -> Result<User, StoreError> {
        let row = UserRepo::create(&self.pool, &user)
            .await
            .map_err(map_sqlx_error)?;
        Ok(User::try_from(row)?)
    }

    async fn update_password_hash(&self, user: &User) -> Result<bool, StoreError> {
        UserRepo::update_password_hash(&self.pool, user)
            .await
            .map_err(map_sqlx_error)
    }
}
