//! HTTP surface of the back office: routes plus the middleware stack.
//!
//! The binary and the integration tests both build the app through
//! [`build_app_router`], so they run behind the same layers.

use std::iter::once;
use std::time::Duration;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, HeaderValue, Method, StatusCode};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::sensitive_headers::SetSensitiveRequestHeadersLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::config::ServerConfig;
use crate::routes;
use crate::state::AppState;

/// Correlation header set on every request and echoed on the response. A
/// client-supplied value is kept.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Methods the service-entry and auth routes answer to.
const ALLOWED_METHODS: [Method; 4] = [Method::GET, Method::POST, Method::PUT, Method::DELETE];

const CORS_MAX_AGE: Duration = Duration::from_secs(3600);

/// `/health` at the root, everything else under `/api/v1`.
fn routes() -> Router<AppState> {
    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1", routes::api_routes())
}

/// Build the full application [`Router`].
///
/// Layers run outermost first: CORS, request id, bearer-token redaction,
/// tracing, request-id echo, timeout, panic recovery.
pub fn build_app_router(state: AppState, config: &ServerConfig) -> Router {
    let timeout = Duration::from_secs(config.request_timeout_secs);
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    let layers = ServiceBuilder::new()
        .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
        // Tokens must never show up in request spans.
        .layer(SetSensitiveRequestHeadersLayer::new(once(AUTHORIZATION)))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(PropagateRequestIdLayer::new(request_id))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            timeout,
        ))
        .layer(CatchPanicLayer::new());

    // CORS goes on as a separate (outermost) router layer so it sees axum's
    // `Body`, which implements the `Default` that `Cors` requires.
    routes()
        .layer(layers)
        .layer(build_cors_layer(config))
        .with_state(state)
}

/// CORS for the back-office front end: the configured origins, JSON bodies
/// and bearer tokens, with the request id readable by the browser.
///
/// Origins are checked by [`ServerConfig::from_env`]; anything that still
/// fails to parse here is skipped with a warning.
pub fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins = config
        .cors_origins
        .iter()
        .filter_map(|origin| {
            HeaderValue::from_str(origin)
                .inspect_err(|e| tracing::warn!(%origin, error = %e, "Ignoring invalid CORS origin"))
                .ok()
        })
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(ALLOWED_METHODS)
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .expose_headers([HeaderName::from_static(REQUEST_ID_HEADER)])
        .allow_credentials(true)
        .max_age(CORS_MAX_AGE)
}
