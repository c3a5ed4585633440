//! Row model for the `users` table.

use autoservice_core::entities::{User, UserRecord};
use autoservice_core::error::DomainError;
use autoservice_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// Full user row. Contains the password hash; never serialize it.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: DbId,
    pub username: String,
    pub password_hash: String,
    pub full_name: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<UserRow> for User {
    type Error = DomainError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        User::restore(UserRecord {
            id: row.id,
            username: row.username,
            password_hash: row.password_hash,
            full_name: row.full_name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
