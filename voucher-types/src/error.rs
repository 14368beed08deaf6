//! Error types for the voucher charge service.

use crate::ports::{ErrorCategory, GatewayError};

/// Domain-level errors (request shape and tariff violations).
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("Incorrect charge amount")]
    IncorrectAmount,

    #[error("Unsupported currency")]
    UnsupportedCurrency,

    #[error("Invalid charge amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid currency: {0}")]
    InvalidCurrency(String),

    #[error("Missing field: {0}")]
    MissingField(&'static str),
}

/// Repository-level errors (ledger storage failures).
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Entity not found")]
    NotFound,
}

/// Application-level errors (for HTTP responses).
///
/// Maps cleanly to HTTP status codes. The message is what the caller sees as
/// the failure `reason`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    ServiceUnavailable(String),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    /// Reason reported when a voucher is redeemed a second time.
    pub fn already_paid() -> Self {
        AppError::BadRequest("Payment for voucher already supplied".into())
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Domain(e) => e.into(),
            RepoError::NotFound => AppError::NotFound("Voucher not found".into()),
            // Storage details stay in the logs.
            RepoError::Database(_) | RepoError::Transaction(_) => {
                AppError::Internal("Internal error".into())
            }
        }
    }
}

impl From<GatewayError> for AppError {
    /// Only a declined card is the caller's to fix. A malformed outgoing
    /// request is our bug, provider and transport faults are transient.
    fn from(err: GatewayError) -> Self {
        let reason = format!("Charge didn't succeed: {}", err.message);
        match err.category {
            ErrorCategory::CardDeclined => AppError::BadRequest(reason),
            ErrorCategory::ProviderError | ErrorCategory::ConnectionFailure => {
                AppError::ServiceUnavailable(reason)
            }
            ErrorCategory::InvalidRequest => AppError::Internal(reason),
            ErrorCategory::Unknown => AppError::Internal(reason),
        }
    }
}
