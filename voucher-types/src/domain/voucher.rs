//! Voucher domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::DomainError;
use crate::ports::GatewayError;

/// Opaque prepaid voucher identifier.
///
/// The service never interprets its contents; two vouchers are the same
/// voucher exactly when their strings are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct Voucher(String);

impl Voucher {
    /// Creates a voucher identifier. Empty identifiers are rejected.
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        if value.is_empty() {
            return Err(DomainError::MissingField("voucher"));
        }
        Ok(Self(value))
    }

    /// Returns the identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for Voucher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Voucher {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Persisted payment state of a voucher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoucherRecord {
    pub voucher: Voucher,
    /// Set exactly once, never cleared
    pub paid: bool,
    /// Gateway transaction that paid for the voucher
    pub charge_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
}

impl VoucherRecord {
    /// A freshly issued, unpaid voucher.
    pub fn unpaid(voucher: Voucher) -> Self {
        Self {
            voucher,
            paid: false,
            charge_id: None,
            created_at: Utc::now(),
            paid_at: None,
        }
    }

    /// Marks the record paid by the given gateway transaction.
    ///
    /// Returns `false` and leaves the record untouched if it was already paid.
    pub fn mark_paid(&mut self, charge_id: impl Into<String>) -> bool {
        if self.paid {
            return false;
        }
        self.paid = true;
        self.charge_id = Some(charge_id.into());
        self.paid_at = Some(Utc::now());
        true
    }
}

/// Result of asking the ledger to redeem a voucher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedemptionOutcome {
    /// The gateway charge succeeded and the voucher is now recorded paid.
    Paid { transaction_id: String },
    /// The voucher was paid before this request; the gateway was not called.
    AlreadyPaid,
    /// The gateway refused or failed the charge; the voucher stays unpaid.
    GatewayFailure(GatewayError),
}
