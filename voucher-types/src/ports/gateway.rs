//! Card gateway port.
//!
//! This trait defines the interface to the external card processor.
//! Implementations can be HTTP clients, stubs for tests, etc.

use crate::domain::{GatewayCharge, NewCharge};

/// How the gateway client classified a failed call.
///
/// The set is closed; anything the client cannot place lands in `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The request we sent was malformed
    InvalidRequest,
    /// The provider failed on its side
    ProviderError,
    /// The provider could not be reached, or the call timed out
    ConnectionFailure,
    /// The card was refused
    CardDeclined,
    Unknown,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorCategory::InvalidRequest => "invalid_request",
            ErrorCategory::ProviderError => "provider_error",
            ErrorCategory::ConnectionFailure => "connection_failure",
            ErrorCategory::CardDeclined => "card_declined",
            ErrorCategory::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// A failed gateway call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{category}: {message}")]
pub struct GatewayError {
    pub category: ErrorCategory,
    /// The gateway's own diagnostic text
    pub message: String,
}

impl GatewayError {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
        }
    }
}

/// What a gateway call hands back to the ledger.
pub type GatewayChargeResult = Result<GatewayCharge, GatewayError>;

/// Port trait for card gateways.
#[async_trait::async_trait]
pub trait ChargeGateway: Send + Sync + 'static {
    /// Creates (and captures) a charge against the given payment token.
    ///
    /// Timeouts must surface as [`ErrorCategory::ConnectionFailure`].
    async fn create_charge(&self, charge: NewCharge) -> GatewayChargeResult;

    /// Fetches a previously created charge by its transaction id.
    async fn retrieve_charge(&self, id: &str) -> GatewayChargeResult;
}
