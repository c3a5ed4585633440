use std::sync::Arc;

use autoservice_core::desk::ServiceDesk;
use tokio_util::sync::CancellationToken;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool, used by the health check.
    pub pool: autoservice_db::DbPool,
    /// Every service log operation, wired to its pipeline and stores.
    pub desk: Arc<ServiceDesk>,
    /// Server configuration (JWT settings are read by the auth extractor).
    pub config: Arc<ServerConfig>,
    /// Cancelled when the server starts shutting down.
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Cancellation token for one request, tripped by server shutdown.
    pub fn request_token(&self) -> CancellationToken {
        self.shutdown.child_token()
    }
}
