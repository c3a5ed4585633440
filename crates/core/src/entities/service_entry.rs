//! Service entry entity and its invariant guard.
//!
//! ## Invariants
//! - plate, brand and model are non-blank; the plate is trimmed and
//!   uppercased, brand and model are trimmed.
//! - the odometer reading is non-negative.
//! - the service date is a UTC instant.
//!
//! The guard runs on construction, on every replace, and when a stored row
//! is re-hydrated, whichever caller is involved.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::types::{new_id, DbId, Timestamp};

/// A service date as submitted: either with an explicit offset, or without
/// one. Inputs without an offset are taken to already be UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServiceDateInput {
    Zoned(DateTime<FixedOffset>),
    Naive(NaiveDateTime),
    Date(NaiveDate),
}

impl ServiceDateInput {
    /// The instant in UTC. Naive values are labelled UTC, not converted.
    pub fn to_utc(&self) -> Timestamp {
        match self {
            Self::Zoned(value) => value.with_timezone(&Utc),
            Self::Naive(value) => value.and_utc(),
            Self::Date(value) => value.and_time(chrono::NaiveTime::MIN).and_utc(),
        }
    }
}

impl From<Timestamp> for ServiceDateInput {
    fn from(value: Timestamp) -> Self {
        Self::Zoned(value.fixed_offset())
    }
}

/// Canonical plate form used for storage and comparison.
pub fn canonical_plate(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Raw field values for constructing or replacing a service entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEntryFields {
    pub license_plate: String,
    pub brand_name: String,
    pub model_name: String,
    pub odometer: i64,
    pub model_year: Option<i32>,
    pub service_date: ServiceDateInput,
    pub has_warranty: Option<bool>,
    pub service_city: Option<String>,
    pub service_note: Option<String>,
}

/// A persisted row, handed back by a store for re-hydration.
#[derive(Debug, Clone)]
pub struct ServiceEntryRecord {
    pub id: DbId,
    pub fields: ServiceEntryFields,
    pub created_at: Timestamp,
    pub updated_at: Option<Timestamp>,
}

/// One recorded service visit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceEntry {
    id: DbId,
    license_plate: String,
    brand_name: String,
    model_name: String,
    odometer: i64,
    model_year: Option<i32>,
    service_date: Timestamp,
    has_warranty: Option<bool>,
    service_city: Option<String>,
    service_note: Option<String>,
    created_at: Timestamp,
    updated_at: Option<Timestamp>,
}

/// Guarded, normalized field values.
struct Normalized {
    license_plate: String,
    brand_name: String,
    model_name: String,
    odometer: i64,
    model_year: Option<i32>,
    service_date: Timestamp,
    has_warranty: Option<bool>,
    service_city: Option<String>,
    service_note: Option<String>,
}

fn required(value: &str, field: &'static str) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::EmptyField { field });
    }
    Ok(trimmed.to_string())
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn guard(fields: ServiceEntryFields) -> Result<Normalized, DomainError> {
    let license_plate = required(&fields.license_plate, "license_plate")?.to_uppercase();
    let brand_name = required(&fields.brand_name, "brand_name")?;
    let model_name = required(&fields.model_name, "model_name")?;
    if fields.odometer < 0 {
        return Err(DomainError::NegativeOdometer(fields.odometer));
    }

    Ok(Normalized {
        license_plate,
        brand_name,
        model_name,
        odometer: fields.odometer,
        model_year: fields.model_year,
        service_date: fields.service_date.to_utc(),
        has_warranty: fields.has_warranty,
        service_city: optional_text(fields.service_city),
        service_note: optional_text(fields.service_note),
    })
}

impl ServiceEntry {
    /// Construct a new entry with a fresh id.
    pub fn new(fields: ServiceEntryFields, now: Timestamp) -> Result<Self, DomainError> {
        let normalized = guard(fields)?;
        Ok(Self::assemble(new_id(), normalized, now, None))
    }

    /// Re-hydrate a stored entry through the same guard.
    pub fn restore(record: ServiceEntryRecord) -> Result<Self, DomainError> {
        let normalized = guard(record.fields)?;
        Ok(Self::assemble(
            record.id,
            normalized,
            record.created_at,
            record.updated_at,
        ))
    }

    /// Replace every mutable field and stamp `updated_at`. On error the
    /// entry is left untouched.
    pub fn replace(&mut self, fields: ServiceEntryFields, now: Timestamp) -> Result<(), DomainError> {
        let normalized = guard(fields)?;
        *self = Self::assemble(self.id, normalized, self.created_at, Some(now));
        Ok(())
    }

    fn assemble(
        id: DbId,
        n: Normalized,
        created_at: Timestamp,
        updated_at: Option<Timestamp>,
    ) -> Self {
        Self {
            id,
            license_plate: n.license_plate,
            brand_name: n.brand_name,
            model_name: n.model_name,
            odometer: n.odometer,
            model_year: n.model_year,
            service_date: n.service_date,
            has_warranty: n.has_warranty,
            service_city: n.service_city,
            service_note: n.service_note,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> DbId {
        self.id
    }

    pub fn license_plate(&self) -> &str {
        &self.license_plate
    }

    pub fn brand_name(&self) -> &str {
        &self.brand_name
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn odometer(&self) -> i64 {
        self.odometer
    }

    pub fn model_year(&self) -> Option<i32> {
        self.model_year
    }

    pub fn service_date(&self) -> Timestamp {
        self.service_date
    }

    /// Calendar day of the service in UTC; duplicates are detected per day.
    pub fn service_day(&self) -> NaiveDate {
        self.service_date.date_naive()
    }

    pub fn has_warranty(&self) -> Option<bool> {
        self.has_warranty
    }

    pub fn service_city(&self) -> Option<&str> {
        self.service_city.as_deref()
    }

    pub fn service_note(&self) -> Option<&str> {
        self.service_note.as_deref()
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<Timestamp> {
        self.updated_at
    }

    /// The entry's current values in raw-field form.
    pub fn to_fields(&self) -> ServiceEntryFields {
        ServiceEntryFields {
            license_plate: self.license_plate.clone(),
            brand_name: self.brand_name.clone(),
            model_name: self.model_name.clone(),
            odometer: self.odometer,
            model_year: self.model_year,
            service_date: self.service_date.into(),
            has_warranty: self.has_warranty,
            service_city: self.service_city.clone(),
            service_note: self.service_note.clone(),
        }
    }
}
