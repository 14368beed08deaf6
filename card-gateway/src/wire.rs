//! Stripe wire formats.

use std::fmt;

use serde::Deserialize;
use serde::de::{Deserializer, MapAccess, Visitor};

use voucher_types::{GatewayCharge, Metadata, NewCharge};

/// Charge object as returned by `/v1/charges`.
#[derive(Debug, Deserialize)]
pub(crate) struct StripeCharge {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    #[serde(default, deserialize_with = "ordered_metadata")]
    pub metadata: Metadata,
}

impl From<StripeCharge> for GatewayCharge {
    fn from(charge: StripeCharge) -> Self {
        GatewayCharge {
            id: charge.id,
            amount: charge.amount,
            currency: charge.currency,
            metadata: charge.metadata,
        }
    }
}

/// Error envelope, `{"error": {...}}`.
#[derive(Debug, Deserialize)]
pub(crate) struct StripeErrorBody {
    pub error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StripeErrorDetail {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub message: Option<String>,
    pub code: Option<String>,
}

/// Form parameters for creating a charge.
pub(crate) fn charge_form(charge: &NewCharge) -> Vec<(String, String)> {
    let mut form = vec![
        ("amount".to_string(), charge.amount.to_string()),
        ("currency".to_string(), charge.currency.gateway_code()),
        ("source".to_string(), charge.token.clone()),
    ];
    form.extend(
        charge
            .metadata
            .iter()
            .map(|(key, value)| (format!("metadata[{}]", key), value.clone())),
    );
    form
}

/// Reads a JSON object into pairs, keeping the order the gateway sent.
fn ordered_metadata<'de, D>(deserializer: D) -> Result<Metadata, D::Error>
where
    D: Deserializer<'de>,
{
    struct PairsVisitor;

    impl<'de> Visitor<'de> for PairsVisitor {
        type Value = Metadata;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an object of string metadata")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Metadata, A::Error> {
            let mut pairs = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((key, value)) = map.next_entry::<String, String>()? {
                pairs.push((key, value));
            }
            Ok(pairs)
        }

        fn visit_unit<E>(self) -> Result<Metadata, E> {
            Ok(Vec::new())
        }
    }

    deserializer.deserialize_any(PairsVisitor)
}
