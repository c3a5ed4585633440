//! Checks that compare a candidate against persisted state.
//!
//! The duplicate check is one read ahead of the write. The store's
//! uniqueness constraint on (plate, service day) backs it up when two
//! writers race; [`classify_write_error`] turns that violation into the same
//! business-rule failure.

use chrono::NaiveDate;
use tokio_util::sync::CancellationToken;

use crate::entities::{canonical_plate, ServiceDateInput};
use crate::error::{CoreError, StoreError};
use crate::ports::{cancellable, ServiceEntryStore, PLATE_DAY_CONSTRAINT};
use crate::types::DbId;

/// Message naming the conflicting plate and day.
pub fn duplicate_entry_message(plate: &str, day: NaiveDate) -> String {
    format!(
        "A service entry for plate {plate} already exists on {}",
        day.format("%Y-%m-%d")
    )
}

/// Fail with a business-rule error when `plate` already has an entry on the
/// UTC calendar day of `service_date`. `excluding` skips the entry being
/// updated.
pub async fn ensure_no_duplicate_entry(
    store: &dyn ServiceEntryStore,
    plate: &str,
    service_date: ServiceDateInput,
    excluding: Option<DbId>,
    cancel: &CancellationToken,
) -> Result<(), CoreError> {
    let plate = canonical_plate(plate);
    let day = service_date.to_utc().date_naive();

    let exists = cancellable(cancel, store.exists_for_plate_on(&plate, day, excluding)).await?;
    if exists {
        tracing::debug!(%plate, %day, "Duplicate service entry detected");
        return Err(CoreError::BusinessRule(duplicate_entry_message(&plate, day)));
    }
    Ok(())
}

/// Map a failed write for the entry (`plate`, `day`). A plate/day
/// uniqueness violation means another writer got there first.
pub fn classify_write_error(err: StoreError, plate: &str, day: NaiveDate) -> CoreError {
    match err {
        StoreError::UniqueViolation { ref constraint } if constraint == PLATE_DAY_CONSTRAINT => {
            tracing::info!(%plate, %day, "Concurrent duplicate rejected by store constraint");
            CoreError::BusinessRule(duplicate_entry_message(plate, day))
        }
        other => CoreError::Store(other),
    }
}
