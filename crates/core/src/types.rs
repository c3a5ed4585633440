/// Entity identifiers are UUID v7 so they sort by creation time.
pub type DbId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Generate a fresh entity identifier.
pub fn new_id() -> DbId {
    uuid::Uuid::now_v7()
}
