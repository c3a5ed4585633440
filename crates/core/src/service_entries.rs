//! Service entry requests and their handlers.
//!
//! Handlers run after the pipeline has accepted the request. Each write
//! follows the same order: duplicate check, entity guard, staged write,
//! commit. Any failure before commit drops the unit of work, so nothing is
//! persisted.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use validator::Validate;

use crate::business_rules::{classify_write_error, ensure_no_duplicate_entry};
use crate::clock::Clock;
use crate::entities::{canonical_plate, ServiceDateInput, ServiceEntry, ServiceEntryFields};
use crate::error::{CoreError, DomainError, StoreError};
use crate::outcome::Outcome;
use crate::pipeline::{Handler, Projected, Request, Structural, ValidationPipeline};
use crate::ports::{cancellable, Page, PageRequest, ServiceEntryStore, StoreFactory};
use crate::types::DbId;
use crate::validation::rules::service_entry_rules;

/// Default page size for list requests.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

// ---------------------------------------------------------------------------
// Payloads and requests
// ---------------------------------------------------------------------------

/// Candidate values for creating or replacing a service entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Validate)]
pub struct ServiceEntryPayload {
    #[serde(default)]
    pub license_plate: String,

    #[serde(default)]
    #[validate(length(max = 100, message = "Brand name must be at most 100 characters"))]
    pub brand_name: String,

    #[serde(default)]
    #[validate(length(max = 100, message = "Model name must be at most 100 characters"))]
    pub model_name: String,

    #[validate(range(
        min = 0,
        max = 9_999_999,
        message = "Odometer reading must be between 0 and 9,999,999"
    ))]
    pub odometer: Option<i64>,

    pub model_year: Option<i32>,

    pub service_date: Option<ServiceDateInput>,

    pub has_warranty: Option<bool>,

    #[validate(length(max = 100, message = "Service city must be at most 100 characters"))]
    pub service_city: Option<String>,

    #[validate(length(max = 1000, message = "Service note must be at most 1000 characters"))]
    pub service_note: Option<String>,
}

impl ServiceEntryPayload {
    /// Hand the values to the entity guard. Required values that are still
    /// missing here mean validation was skipped.
    pub fn into_fields(self) -> Result<ServiceEntryFields, DomainError> {
        let odometer = self
            .odometer
            .ok_or(DomainError::MissingField { field: "odometer" })?;
        let service_date = self.service_date.ok_or(DomainError::MissingField {
            field: "service_date",
        })?;
        Ok(ServiceEntryFields {
            license_plate: self.license_plate,
            brand_name: self.brand_name,
            model_name: self.model_name,
            odometer,
            model_year: self.model_year,
            service_date,
            has_warranty: self.has_warranty,
            service_city: self.service_city,
            service_note: self.service_note,
        })
    }
}

#[derive(Debug, Clone)]
pub struct CreateServiceEntry {
    pub payload: ServiceEntryPayload,
}

impl Request for CreateServiceEntry {
    type Response = ServiceEntry;
    const NAME: &'static str = "create_service_entry";
}

/// Full replacement of an existing entry.
#[derive(Debug, Clone)]
pub struct UpdateServiceEntry {
    pub id: DbId,
    pub payload: ServiceEntryPayload,
}

impl Request for UpdateServiceEntry {
    type Response = ServiceEntry;
    const NAME: &'static str = "update_service_entry";
}

#[derive(Debug, Clone, Copy)]
pub struct GetServiceEntry {
    pub id: DbId,
}

impl Request for GetServiceEntry {
    type Response = ServiceEntry;
    const NAME: &'static str = "get_service_entry";
}

#[derive(Debug, Clone, Copy)]
pub struct DeleteServiceEntry {
    pub id: DbId,
}

impl Request for DeleteServiceEntry {
    type Response = ();
    const NAME: &'static str = "delete_service_entry";
}

fn default_page_number() -> i64 {
    1
}

fn default_page_size() -> i64 {
    i64::from(DEFAULT_PAGE_SIZE)
}

/// One page of entries, newest service date first.
///
/// Paging fields are signed so that negative query values reach the range
/// checks instead of failing deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate)]
pub struct ListServiceEntries {
    #[serde(default = "default_page_number")]
    #[validate(range(min = 1, message = "Page number must be at least 1"))]
    pub page_number: i64,

    #[serde(default = "default_page_size")]
    #[validate(range(min = 1, max = 100, message = "Page size must be between 1 and 100"))]
    pub page_size: i64,

    /// Optional filter on the canonical plate.
    pub license_plate: Option<String>,
}

impl Default for ListServiceEntries {
    fn default() -> Self {
        Self {
            page_number: default_page_number(),
            page_size: default_page_size(),
            license_plate: None,
        }
    }
}

impl ListServiceEntries {
    /// Store-level paging for a validated request. Page numbers past
    /// `u32::MAX` clamp to the last addressable page, which is empty.
    pub fn page_request(&self) -> PageRequest {
        PageRequest {
            page_number: u32::try_from(self.page_number.max(1)).unwrap_or(u32::MAX),
            page_size: u32::try_from(self.page_size.clamp(1, 100)).unwrap_or(DEFAULT_PAGE_SIZE),
        }
    }
}

impl Request for ListServiceEntries {
    type Response = Page<ServiceEntry>;
    const NAME: &'static str = "list_service_entries";
}

// ---------------------------------------------------------------------------
// Pipelines
// ---------------------------------------------------------------------------

fn create_payload(request: &CreateServiceEntry) -> &ServiceEntryPayload {
    &request.payload
}

fn update_payload(request: &UpdateServiceEntry) -> &ServiceEntryPayload {
    &request.payload
}

pub fn create_pipeline(clock: Arc<dyn Clock>) -> ValidationPipeline<CreateServiceEntry> {
    ValidationPipeline::new(clock)
        .register(Projected::new(create_payload, Structural))
        .register(Projected::new(create_payload, service_entry_rules()))
}

pub fn update_pipeline(clock: Arc<dyn Clock>) -> ValidationPipeline<UpdateServiceEntry> {
    ValidationPipeline::new(clock)
        .register(Projected::new(update_payload, Structural))
        .register(Projected::new(update_payload, service_entry_rules()))
}

pub fn list_pipeline(clock: Arc<dyn Clock>) -> ValidationPipeline<ListServiceEntries> {
    ValidationPipeline::new(clock).register(Structural)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Executes service entry requests against a fresh unit of work each.
pub struct ServiceEntryService {
    stores: Arc<dyn StoreFactory>,
    clock: Arc<dyn Clock>,
}

impl ServiceEntryService {
    pub fn new(stores: Arc<dyn StoreFactory>, clock: Arc<dyn Clock>) -> Self {
        Self { stores, clock }
    }

    async fn create(
        &self,
        payload: ServiceEntryPayload,
        cancel: &CancellationToken,
    ) -> Result<ServiceEntry, CoreError> {
        let fields = payload.into_fields()?;
        let store = self.stores.service_entries();

        ensure_no_duplicate_entry(
            store.as_ref(),
            &fields.license_plate,
            fields.service_date,
            None,
            cancel,
        )
        .await?;

        let entry = ServiceEntry::new(fields, self.clock.now())?;
        let plate = entry.license_plate().to_string();
        let day = entry.service_day();

        let saved = cancellable(cancel, store.add(entry))
            .await
            .map_err(|e| classify_write_error(e, &plate, day))?;
        commit(store.as_ref(), cancel)
            .await
            .map_err(|e| classify_write_error(e, &plate, day))?;

        tracing::info!(entry_id = %saved.id(), plate = %plate, "Service entry created");
        Ok(saved)
    }

    async fn update(
        &self,
        id: DbId,
        payload: ServiceEntryPayload,
        cancel: &CancellationToken,
    ) -> Result<ServiceEntry, CoreError> {
        let fields = payload.into_fields()?;
        let store = self.stores.service_entries();

        let mut entry = cancellable(cancel, store.find_by_id(id))
            .await?
            .ok_or(CoreError::NotFound {
                entity: "service entry",
                id,
            })?;

        ensure_no_duplicate_entry(
            store.as_ref(),
            &fields.license_plate,
            fields.service_date,
            Some(id),
            cancel,
        )
        .await?;

        entry.replace(fields, self.clock.now())?;
        let plate = entry.license_plate().to_string();
        let day = entry.service_day();

        let saved = cancellable(cancel, store.replace(entry))
            .await
            .map_err(|e| classify_write_error(e, &plate, day))?;
        commit(store.as_ref(), cancel)
            .await
            .map_err(|e| classify_write_error(e, &plate, day))?;

        tracing::info!(entry_id = %id, plate = %plate, "Service entry updated");
        Ok(saved)
    }

    async fn get(&self, id: DbId, cancel: &CancellationToken) -> Result<ServiceEntry, CoreError> {
        let store = self.stores.service_entries();
        cancellable(cancel, store.find_by_id(id))
            .await?
            .ok_or(CoreError::NotFound {
                entity: "service entry",
                id,
            })
    }

    async fn list(
        &self,
        request: ListServiceEntries,
        cancel: &CancellationToken,
    ) -> Result<Page<ServiceEntry>, CoreError> {
        let store = self.stores.service_entries();
        let page = request.page_request();
        let plate = request
            .license_plate
            .as_deref()
            .map(canonical_plate)
            .filter(|p| !p.is_empty());

        Ok(cancellable(cancel, store.list(page, plate.as_deref())).await?)
    }

    async fn delete(&self, id: DbId, cancel: &CancellationToken) -> Result<(), CoreError> {
        let store = self.stores.service_entries();
        let removed = cancellable(cancel, store.remove(id)).await?;
        if !removed {
            return Err(CoreError::NotFound {
                entity: "service entry",
                id,
            });
        }
        commit(store.as_ref(), cancel).await?;

        tracing::info!(entry_id = %id, "Service entry deleted");
        Ok(())
    }
}

/// Commit the unit of work unless the caller has already cancelled. A
/// commit that has started is allowed to finish.
async fn commit(store: &dyn ServiceEntryStore, cancel: &CancellationToken) -> Result<(), StoreError> {
    if cancel.is_cancelled() {
        return Err(StoreError::Cancelled);
    }
    store.commit().await
}

#[async_trait]
impl Handler<CreateServiceEntry> for ServiceEntryService {
    async fn handle(
        &self,
        request: CreateServiceEntry,
        cancel: &CancellationToken,
    ) -> Outcome<ServiceEntry> {
        Outcome::from_core(
            self.create(request.payload, cancel).await,
            CreateServiceEntry::NAME,
        )
    }
}

#[async_trait]
impl Handler<UpdateServiceEntry> for ServiceEntryService {
    async fn handle(
        &self,
        request: UpdateServiceEntry,
        cancel: &CancellationToken,
    ) -> Outcome<ServiceEntry> {
        Outcome::from_core(
            self.update(request.id, request.payload, cancel).await,
            UpdateServiceEntry::NAME,
        )
    }
}

#[async_trait]
impl Handler<GetServiceEntry> for ServiceEntryService {
    async fn handle(
        &self,
        request: GetServiceEntry,
        cancel: &CancellationToken,
    ) -> Outcome<ServiceEntry> {
        Outcome::from_core(self.get(request.id, cancel).await, GetServiceEntry::NAME)
    }
}

#[async_trait]
impl Handler<ListServiceEntries> for ServiceEntryService {
    async fn handle(
        &self,
        request: ListServiceEntries,
        cancel: &CancellationToken,
    ) -> Outcome<Page<ServiceEntry>> {
        Outcome::from_core(self.list(request, cancel).await, ListServiceEntries::NAME)
    }
}

#[async_trait]
impl Handler<DeleteServiceEntry> for ServiceEntryService {
    async fn handle(&self, request: DeleteServiceEntry, cancel: &CancellationToken) -> Outcome<()> {
        Outcome::from_core(self.delete(request.id, cancel).await, DeleteServiceEntry::NAME)
    }
}
