//! Repository for the `service_entries` table.
//!
//! Every method takes a connection so callers can run it inside their own
//! transaction.

use autoservice_core::entities::ServiceEntry;
use autoservice_core::types::DbId;
use chrono::NaiveDate;
use sqlx::PgConnection;

use crate::models::service_entry::ServiceEntryRow;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, license_plate, brand_name, model_name, odometer, model_year, \
                       service_date, service_day, has_warranty, service_city, service_note, \
                       created_at, updated_at";

/// Provides CRUD operations for service entries.
pub struct ServiceEntryRepo;

impl ServiceEntryRepo {
    /// Whether a row exists for `plate` on `day`, optionally ignoring one id.
    pub async fn exists_for_plate_on(
        conn: &mut PgConnection,
        plate: &str,
        day: NaiveDate,
        excluding: Option<DbId>,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (
                SELECT 1 FROM service_entries
                 WHERE license_plate = $1
                   AND service_day = $2
                   AND ($3::uuid IS NULL OR id <> $3)
             )",
        )
        .bind(plate)
        .bind(day)
        .bind(excluding)
        .fetch_one(conn)
        .await
    }

    /// Insert a new entry, returning the stored row.
    pub async fn create(
        conn: &mut PgConnection,
        entry: &ServiceEntry,
    ) -> Result<ServiceEntryRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO service_entries
                (id, license_plate, brand_name, model_name, odometer, model_year,
                 service_date, service_day, has_warranty, service_city, service_note,
                 created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ServiceEntryRow>(&query)
            .bind(entry.id())
            .bind(entry.license_plate())
            .bind(entry.brand_name())
            .bind(entry.model_name())
            .bind(entry.odometer())
            .bind(entry.model_year())
            .bind(entry.service_date())
            .bind(entry.service_day())
            .bind(entry.has_warranty())
            .bind(entry.service_city())
            .bind(entry.service_note())
            .bind(entry.created_at())
            .bind(entry.updated_at())
            .fetch_one(conn)
            .await
    }

    /// Overwrite every mutable column of an existing entry.
    ///
    /// Returns `None` if no row with the entry's id exists.
    pub async fn replace(
        conn: &mut PgConnection,
        entry: &ServiceEntry,
    ) -> Result<Option<ServiceEntryRow>, sqlx::Error> {
        let query = format!(
            "UPDATE service_entries SET
                license_plate = $2,
                brand_name = $3,
                model_name = $4,
                odometer = $5,
                model_year = $6,
                service_date = $7,
                service_day = $8,
                has_warranty = $9,
                service_city = $10,
                service_note = $11,
                updated_at = $12
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ServiceEntryRow>(&query)
            .bind(entry.id())
            .bind(entry.license_plate())
            .bind(entry.brand_name())
            .bind(entry.model_name())
            .bind(entry.odometer())
            .bind(entry.model_year())
            .bind(entry.service_date())
            .bind(entry.service_day())
            .bind(entry.has_warranty())
            .bind(entry.service_city())
            .bind(entry.service_note())
            .bind(entry.updated_at())
            .fetch_optional(conn)
            .await
    }

    /// Find an entry by internal ID.
    pub async fn find_by_id(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<ServiceEntryRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM service_entries WHERE id = $1");
        sqlx::query_as::<_, ServiceEntryRow>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// One page of entries, newest service date first.
    pub async fn list(
        conn: &mut PgConnection,
        plate: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ServiceEntryRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM service_entries
             WHERE ($1::text IS NULL OR license_plate = $1)
             ORDER BY service_date DESC, created_at DESC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, ServiceEntryRow>(&query)
            .bind(plate)
            .bind(limit)
            .bind(offset)
            .fetch_all(conn)
            .await
    }

    /// Number of entries matching the optional plate filter.
    pub async fn count(conn: &mut PgConnection, plate: Option<&str>) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM service_entries WHERE ($1::text IS NULL OR license_plate = $1)",
        )
        .bind(plate)
        .fetch_one(conn)
        .await
    }

    /// Delete an entry. Returns `true` if a row was removed.
    pub async fn delete(conn: &mut PgConnection, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM service_entries WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
