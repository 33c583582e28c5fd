/// Error taxonomy for the purchase, entitlement and access flows
///
/// Every service in this crate returns [`CoreError`]. The HTTP layer maps each
/// variant to a status code and a client-safe message; internal detail carried
/// by `Gateway` and `Store` is logged there and never echoed back.

use serde::{Deserialize, Serialize};

/// A single field-level validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Field that failed validation (wire name)
    pub field: String,

    /// Human-readable reason
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Shorthand for a required field that was absent or empty
    pub fn missing(field: impl Into<String>) -> Self {
        Self::new(field, "is required")
    }
}

/// Failures raised by a [`crate::store::Store`] implementation
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write
    #[error("Constraint violation: {0}")]
    Conflict(String),

    /// The backing store did not answer within the configured deadline
    #[error("Store operation timed out")]
    Timeout,

    /// Any other backend failure
    #[error("Store backend error: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => match db_err.constraint() {
                Some(constraint) => StoreError::Conflict(constraint.to_string()),
                None => StoreError::Backend(db_err.to_string()),
            },
            sqlx::Error::PoolTimedOut => StoreError::Timeout,
            other => StoreError::Backend(other.to_string()),
        }
    }
}

/// Result alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Domain error returned by every service operation
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Malformed or missing input (400)
    #[error("Validation failed: {} error(s)", .0.len())]
    Validation(Vec<FieldError>),

    /// Signature mismatch or unverifiable payment (400)
    #[error("Verification failed: {0}")]
    Verification(String),

    /// Missing course, lesson, user or purchase reference (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// No entitlement for the requested content (403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Entitlement exists but has lapsed (403)
    #[error("Expired: {0}")]
    Expired(String),

    /// Upstream payment provider or object storage failure (502)
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// Store timed out (503)
    #[error("Store operation timed out")]
    StoreTimeout,

    /// Any other store failure (500)
    #[error("Store error: {0}")]
    Store(StoreError),
}

impl CoreError {
    /// Builds a validation error for a single field
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        CoreError::Validation(vec![FieldError::new(field, message)])
    }
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Timeout => CoreError::StoreTimeout,
            other => CoreError::Store(other),
        }
    }
}

/// Result alias for service operations
pub type CoreResult<T> = Result<T, CoreError>;
