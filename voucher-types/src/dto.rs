//! Data Transfer Objects (DTOs) for requests and responses.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{ChargeRequest, Currency, GatewayCharge, Voucher, VoucherRecord};
use crate::error::DomainError;

// ─────────────────────────────────────────────────────────────────────────────
// Charge DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Body of a charge request as it arrives on the wire.
///
/// Amount and currency are strings and only become typed values in
/// [`ChargeRequest::try_from`].
#[derive(Clone, Serialize, Deserialize, ToSchema)]
pub struct ChargeBody {
    /// Single-use payment token from the card form
    #[schema(example = "tok_visa")]
    pub token: String,
    /// Voucher to pay for
    #[schema(example = "a9b2c8f1e0")]
    pub voucher: String,
    /// Amount in smallest currency unit, as a decimal string
    #[schema(example = "650")]
    pub amount: String,
    /// ISO 4217 currency code
    #[schema(example = "USD")]
    pub currency: String,
}

impl std::fmt::Debug for ChargeBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChargeBody")
            .field("token", &"<redacted>")
            .field("voucher", &self.voucher)
            .field("amount", &self.amount)
            .field("currency", &self.currency)
            .finish()
    }
}

impl TryFrom<ChargeBody> for ChargeRequest {
    type Error = DomainError;

    fn try_from(body: ChargeBody) -> Result<Self, Self::Error> {
        if body.token.is_empty() {
            return Err(DomainError::MissingField("token"));
        }
        let voucher = Voucher::new(body.voucher)?;
        let amount = body
            .amount
            .trim()
            .parse::<i64>()
            .map_err(|_| DomainError::InvalidAmount(body.amount.clone()))?;
        let currency: Currency = body.currency.parse()?;

        Ok(ChargeRequest {
            token: body.token,
            voucher,
            amount,
            currency,
        })
    }
}

/// The only success body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Acknowledgement {
    #[schema(example = true)]
    pub success: bool,
}

impl Acknowledgement {
    pub fn new() -> Self {
        Self { success: true }
    }
}

impl Default for Acknowledgement {
    fn default() -> Self {
        Self::new()
    }
}

/// The only error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Failure {
    #[schema(example = false)]
    pub success: bool,
    /// Human-readable reason
    #[schema(example = "Incorrect charge amount")]
    pub reason: String,
}

impl Failure {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            reason: reason.into(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Read-side DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Payment state of a voucher.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VoucherStatusResponse {
    #[schema(example = "a9b2c8f1e0")]
    pub voucher: String,
    pub paid: bool,
}

impl VoucherStatusResponse {
    pub fn unpaid(voucher: &Voucher) -> Self {
        Self {
            voucher: voucher.to_string(),
            paid: false,
        }
    }
}

impl From<VoucherRecord> for VoucherStatusResponse {
    fn from(record: VoucherRecord) -> Self {
        Self {
            voucher: record.voucher.into_inner(),
            paid: record.paid,
        }
    }
}

/// A gateway charge reconstructed for display or audit.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChargeInfoResponse {
    /// Gateway transaction identifier
    #[schema(example = "ch_3MmlLrLkdIwHu7ix0snN0B15")]
    pub id: String,
    #[schema(example = 650)]
    pub amount: i64,
    #[schema(example = "usd")]
    pub currency: String,
    /// Voucher recorded in the charge metadata, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voucher: Option<String>,
}

impl From<GatewayCharge> for ChargeInfoResponse {
    fn from(charge: GatewayCharge) -> Self {
        let voucher = charge.voucher().map(str::to_string);
        Self {
            id: charge.id,
            amount: charge.amount,
            currency: charge.currency,
            voucher,
        }
    }
}
