use crate::types::DbId;

/// Errors raised inside the core before they are folded into an
/// [`Outcome`](crate::outcome::Outcome).
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: DbId },

    /// A stateful rule rejected the request (e.g. duplicate service entry).
    #[error("{0}")]
    BusinessRule(String),

    #[error("{0}")]
    Unauthorized(String),

    /// An entity guard rejected its input. Reaching this means validation
    /// was skipped or ran out of order.
    #[error("Entity invariant violated: {0}")]
    Domain(#[from] DomainError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failure of an entity invariant guard.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },

    #[error("{field} is required")]
    MissingField { field: &'static str },

    #[error("odometer must not be negative, got {0}")]
    NegativeOdometer(i64),
}

/// Errors reported by persistence adapters.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("unique constraint {constraint} violated")]
    UniqueViolation { constraint: String },

    /// The caller cancelled the operation before it completed.
    #[error("operation cancelled")]
    Cancelled,

    /// A stored row failed to re-hydrate through its entity guard.
    #[error("corrupt row: {0}")]
    Corrupt(#[from] DomainError),

    #[error("{0}")]
    Backend(String),
}
