//! Row model for the `service_entries` table.

use autoservice_core::entities::{
    ServiceDateInput, ServiceEntry, ServiceEntryFields, ServiceEntryRecord,
};
use autoservice_core::error::DomainError;
use autoservice_core::types::{DbId, Timestamp};
use chrono::NaiveDate;
use sqlx::FromRow;

/// Full row from the `service_entries` table.
///
/// `service_day` is derived from `service_date` on write and only exists to
/// back the plate/day uniqueness constraint.
#[derive(Debug, Clone, FromRow)]
pub struct ServiceEntryRow {
    pub id: DbId,
    pub license_plate: String,
    pub brand_name: String,
    pub model_name: String,
    pub odometer: i64,
    pub model_year: Option<i32>,
    pub service_date: Timestamp,
    pub service_day: NaiveDate,
    pub has_warranty: Option<bool>,
    pub service_city: Option<String>,
    pub service_note: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Option<Timestamp>,
}

impl TryFrom<ServiceEntryRow> for ServiceEntry {
    type Error = DomainError;

    /// Re-hydrate through the entity guard.
    fn try_from(row: ServiceEntryRow) -> Result<Self, Self::Error> {
        ServiceEntry::restore(ServiceEntryRecord {
            id: row.id,
            fields: ServiceEntryFields {
                license_plate: row.license_plate,
                brand_name: row.brand_name,
                model_name: row.model_name,
                odometer: row.odometer,
                model_year: row.model_year,
                service_date: ServiceDateInput::from(row.service_date),
                has_warranty: row.has_warranty,
                service_city: row.service_city,
                service_note: row.service_note,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
