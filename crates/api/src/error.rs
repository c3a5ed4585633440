use autoservice_core::error::CoreError;
use autoservice_core::outcome::{Failure, FailureKind};
use autoservice_core::pipeline::{Dispatch, InvalidRequest};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Carries the two rejection shapes the core produces (an invalid request
/// and a failed outcome) plus core errors raised outside an operation.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The validation pipeline rejected the request.
    #[error(transparent)]
    Invalid(#[from] InvalidRequest),

    /// The operation ran and failed.
    #[error("{}", .0.message)]
    Failure(Failure),

    /// An error raised outside any operation (e.g. by an extractor).
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl From<Failure> for AppError {
    fn from(failure: Failure) -> Self {
        Self::Failure(failure)
    }
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

/// Unwrap a dispatched operation into its payload or the matching error.
pub fn resolve<T>(dispatch: Dispatch<T>) -> AppResult<T> {
    Ok(dispatch?.into_result()?)
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::Invalid(invalid) => {
                let body = json!({
                    "error": "One or more validation errors occurred",
                    "code": "VALIDATION_ERROR",
                    "errors": invalid.errors,
                });
                return (StatusCode::BAD_REQUEST, axum::Json(body)).into_response();
            }

            AppError::Failure(failure) => classify_failure(failure),

            // Route through the same classification the core uses so the
            // message is already safe to expose.
            AppError::Core(core) => classify_failure(Failure::from_core(core, "http")),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn classify_failure(failure: Failure) -> (StatusCode, &'static str, String) {
    let (status, code) = match failure.kind {
        FailureKind::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        FailureKind::BusinessRule => (StatusCode::CONFLICT, "CONFLICT"),
        FailureKind::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
        FailureKind::Unexpected => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
    };
    (status, code, failure.message)
}
