//! Repository for the `users` table.

use autoservice_core::entities::User;
use autoservice_core::types::DbId;
use sqlx::PgPool;

use crate::models::user::UserRow;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, username, password_hash, full_name, created_at, updated_at";

/// Provides lookups and writes for operator accounts.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new user, returning the created row.
    pub async fn create(pool: &PgPool, user: &User) -> Result<UserRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (id, username, password_hash, full_name, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UserRow>(&query)
            .bind(user.id())
            .bind(user.username())
            .bind(user.password_hash())
            .bind(user.full_name())
            .bind(user.created_at())
            .bind(user.updated_at())
            .fetch_one(pool)
            .await
    }

    /// Find a user by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<UserRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, UserRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a user by canonical username.
    pub async fn find_by_username(
        pool: &PgPool,
        username: &str,
    ) -> Result<Option<UserRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE username = $1");
        sqlx::query_as::<_, UserRow>(&query)
            .bind(username)
            .fetch_optional(pool)
            .await
    }

    /// Store a new password hash. Returns `true` if the row was updated.
    pub async fn update_password_hash(pool: &PgPool, user: &User) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE users SET password_hash = $2, updated_at = $3 WHERE id = $1")
                .bind(user.id())
                .bind(user.password_hash())
                .bind(user.updated_at())
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}
