//! Charge domain model.

use serde::{Deserialize, Serialize};

use super::tariff::{Currency, FIXED_AMOUNT, FIXED_CURRENCY};
use super::voucher::Voucher;

/// Metadata key under which the voucher is attached to a gateway charge.
pub const VOUCHER_METADATA_KEY: &str = "Voucher";

/// Free-form key/value metadata attached to a gateway charge, in gateway order.
pub type Metadata = Vec<(String, String)>;

/// Returns the voucher recorded in charge metadata.
///
/// Keys compare case-sensitively and the first matching pair wins.
pub fn voucher_from_metadata(metadata: &[(String, String)]) -> Option<&str> {
    metadata
        .iter()
        .find(|(key, _)| key == VOUCHER_METADATA_KEY)
        .map(|(_, value)| value.as_str())
}

/// A parsed charge request. Built once per inbound call and never mutated.
#[derive(Clone)]
pub struct ChargeRequest {
    /// Single-use credential from the client's payment form
    pub token: String,
    pub voucher: Voucher,
    /// Amount in smallest currency unit
    pub amount: i64,
    pub currency: Currency,
}

// The payment token is a credential and stays out of logs.
impl std::fmt::Debug for ChargeRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChargeRequest")
            .field("token", &"<redacted>")
            .field("voucher", &self.voucher)
            .field("amount", &self.amount)
            .field("currency", &self.currency)
            .finish()
    }
}

/// A charge to be created at the gateway.
#[derive(Clone)]
pub struct NewCharge {
    pub amount: i64,
    pub currency: Currency,
    pub token: String,
    pub metadata: Metadata,
}

impl NewCharge {
    /// Charge for one voucher at the fixed tariff, tagged with the voucher id.
    pub fn for_voucher(voucher: &Voucher, token: impl Into<String>) -> Self {
        Self {
            amount: FIXED_AMOUNT,
            currency: FIXED_CURRENCY,
            token: token.into(),
            metadata: vec![(
                VOUCHER_METADATA_KEY.to_string(),
                voucher.as_str().to_string(),
            )],
        }
    }
}

impl std::fmt::Debug for NewCharge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewCharge")
            .field("amount", &self.amount)
            .field("currency", &self.currency)
            .field("token", &"<redacted>")
            .field("metadata", &self.metadata)
            .finish()
    }
}

/// A charge as reported back by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayCharge {
    /// Gateway transaction identifier
    pub id: String,
    pub amount: i64,
    /// Currency code as the gateway reports it
    pub currency: String,
    pub metadata: Metadata,
}

impl GatewayCharge {
    /// The voucher this charge paid for, if the gateway kept our metadata.
    pub fn voucher(&self) -> Option<&str> {
        voucher_from_metadata(&self.metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Metadata {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_voucher_from_metadata() {
        let metadata = pairs(&[("Order", "17"), ("Voucher", "abc")]);
        assert_eq!(voucher_from_metadata(&metadata), Some("abc"));
    }

    #[test]
    fn test_voucher_missing_from_metadata() {
        let metadata = pairs(&[("Order", "17")]);
        assert_eq!(voucher_from_metadata(&metadata), None);
        assert_eq!(voucher_from_metadata(&[]), None);
    }

    #[test]
    fn test_voucher_key_is_case_sensitive() {
        let metadata = pairs(&[("voucher", "lower"), ("VOUCHER", "upper")]);
        assert_eq!(voucher_from_metadata(&metadata), None);
    }

    #[test]
    fn test_first_voucher_key_wins() {
        let metadata = pairs(&[("Voucher", "first"), ("Voucher", "second")]);
        assert_eq!(voucher_from_metadata(&metadata), Some("first"));
    }

    #[test]
    fn test_new_charge_uses_fixed_tariff() {
        let voucher = Voucher::new("abc").unwrap();
        let charge = NewCharge::for_voucher(&voucher, "tok_visa");
        assert_eq!(charge.amount, FIXED_AMOUNT);
        assert_eq!(charge.currency, FIXED_CURRENCY);
        assert_eq!(voucher_from_metadata(&charge.metadata), Some("abc"));
    }

    #[test]
    fn test_debug_redacts_token() {
        let voucher = Voucher::new("abc").unwrap();
        let charge = NewCharge::for_voucher(&voucher, "tok_secret");
        assert!(!format!("{:?}", charge).contains("tok_secret"));
    }
}
