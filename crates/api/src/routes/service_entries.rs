use axum::routing::get;
use axum::Router;

use crate::handlers::service_entries;
use crate::state::AppState;

/// Routes mounted at `/api/v1/service-entries`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(service_entries::list).post(service_entries::create),
        )
        .route(
            "/{id}",
            get(service_entries::get_by_id)
                .put(service_entries::update)
                .delete(service_entries::delete),
        )
}
