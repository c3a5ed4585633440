pub mod auth;
pub mod health;
pub mod service_entries;

use axum::Router;

use crate::state::AppState;

/// All routes mounted under `/api/v1`.
///
/// ```text
/// /auth/login                 POST   login
/// /auth/change-password       POST   change password (bearer)
/// /service-entries            GET    list, POST create
/// /service-entries/{id}       GET    get, PUT replace, DELETE delete
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/service-entries", service_entries::router())
}
