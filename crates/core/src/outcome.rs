//! Uniform success/failure envelope returned by every public operation.
//!
//! Failures always carry a message that is safe to show to the caller.
//! Detail about unexpected errors is logged here and never copied into the
//! message.

use serde::Serialize;

use crate::error::{CoreError, StoreError};

/// Message reported for any failure the caller cannot act on.
pub const UNEXPECTED_FAILURE_MESSAGE: &str = "An unexpected error occurred";

/// Message reported when the caller cancelled the operation.
pub const CANCELLED_MESSAGE: &str = "The operation was cancelled";

/// Category of a failed operation, for collaborators that need to pick a
/// status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    NotFound,
    BusinessRule,
    Unauthorized,
    Unexpected,
}

/// A failed operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
}

impl Failure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn unexpected() -> Self {
        Self::new(FailureKind::Unexpected, UNEXPECTED_FAILURE_MESSAGE)
    }

    /// Classify an internal error, logging at a level that matches its
    /// category. The resulting message is safe to show to the caller.
    pub fn from_core(err: CoreError, operation: &'static str) -> Self {
        classify(err, operation)
    }
}

/// Result of a public operation: a payload or a [`Failure`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Success(T),
    Failure(Failure),
}

impl<T> Outcome<T> {
    pub fn failure(kind: FailureKind, message: impl Into<String>) -> Self {
        Self::Failure(Failure::new(kind, message))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// The failure message, if this is a failure.
    pub fn failure_message(&self) -> Option<&str> {
        match self {
            Self::Success(_) => None,
            Self::Failure(failure) => Some(&failure.message),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Success(value) => Outcome::Success(f(value)),
            Self::Failure(failure) => Outcome::Failure(failure),
        }
    }

    pub fn into_result(self) -> Result<T, Failure> {
        match self {
            Self::Success(value) => Ok(value),
            Self::Failure(failure) => Err(failure),
        }
    }

    /// Fold an internal result into the envelope, logging at a level that
    /// matches the failure category.
    pub fn from_core(result: Result<T, CoreError>, operation: &'static str) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(err) => Self::Failure(Failure::from_core(err, operation)),
        }
    }
}

impl<T> From<Result<T, Failure>> for Outcome<T> {
    fn from(result: Result<T, Failure>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(failure) => Self::Failure(failure),
        }
    }
}

fn classify(err: CoreError, operation: &'static str) -> Failure {
    match err {
        CoreError::NotFound { .. } => {
            tracing::debug!(operation, error = %err, "Entity not found");
            Failure::new(FailureKind::NotFound, err.to_string())
        }
        CoreError::BusinessRule(message) => {
            tracing::info!(operation, %message, "Business rule rejected request");
            Failure::new(FailureKind::BusinessRule, message)
        }
        CoreError::Unauthorized(message) => {
            tracing::info!(operation, "Authentication rejected");
            Failure::new(FailureKind::Unauthorized, message)
        }
        CoreError::Domain(domain) => {
            tracing::error!(
                operation,
                error = %domain,
                "Entity guard rejected input that should have been validated"
            );
            Failure::unexpected()
        }
        CoreError::Store(StoreError::Cancelled) => {
            tracing::warn!(operation, "Operation cancelled by caller");
            Failure::new(FailureKind::Unexpected, CANCELLED_MESSAGE)
        }
        CoreError::Store(store) => {
            tracing::error!(operation, error = %store, "Store failure");
            Failure::unexpected()
        }
        CoreError::Internal(message) => {
            tracing::error!(operation, error = %message, "Internal failure");
            Failure::unexpected()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DomainError;

    #[test]
    fn business_rule_message_is_passed_through() {
        let outcome: Outcome<()> =
            Outcome::from_core(Err(CoreError::BusinessRule("duplicate".into())), "test");
        assert_eq!(
            outcome,
            Outcome::failure(FailureKind::BusinessRule, "duplicate")
        );
    }

    #[test]
    fn domain_failure_is_reported_generically() {
        let outcome: Outcome<()> = Outcome::from_core(
            Err(CoreError::Domain(DomainError::EmptyField {
                field: "license_plate",
            })),
            "test",
        );
        assert_eq!(outcome.failure_message(), Some(UNEXPECTED_FAILURE_MESSAGE));
    }

    #[test]
    fn store_detail_does_not_leak() {
        let outcome: Outcome<()> = Outcome::from_core(
            Err(CoreError::Store(StoreError::Backend(
                "connection refused to 10.0.0.5".into(),
            ))),
            "test",
        );
        let message = outcome.failure_message().unwrap();
        assert!(!message.contains("10.0.0.5"));
        assert_eq!(message, UNEXPECTED_FAILURE_MESSAGE);
    }

    #[test]
    fn map_preserves_failure() {
        let outcome: Outcome<i32> = Outcome::failure(FailureKind::NotFound, "missing");
        let mapped = outcome.map(|v| v * 2);
        assert_eq!(mapped.into_result().unwrap_err().kind, FailureKind::NotFound);
    }
}
