//! The single accepted tariff and the currencies a request may name.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;

/// Price of one voucher, in the smallest unit of [`FIXED_CURRENCY`].
pub const FIXED_AMOUNT: i64 = 650;

/// The only currency a voucher can be paid in.
pub const FIXED_CURRENCY: Currency = Currency::USD;

/// A currency named by a charge request.
///
/// Any three-letter alphabetic code parses. Only [`FIXED_CURRENCY`] is ever
/// charged; the rest exist so a request naming a real but unsupported
/// currency is reported as such rather than as malformed input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Currency {
    USD,
    EUR,
    GBP,
    INR,
    CAD,
    AUD,
    CHF,
    JPY,
    /// Any other ISO 4217 shaped code, stored uppercase.
    Other(String),
}

impl Currency {
    /// Currencies with a named variant.
    pub fn all() -> &'static [Currency] {
        &[
            Currency::USD,
            Currency::EUR,
            Currency::GBP,
            Currency::INR,
            Currency::CAD,
            Currency::AUD,
            Currency::CHF,
            Currency::JPY,
        ]
    }

    /// ISO 4217 code, uppercase.
    pub fn code(&self) -> &str {
        match self {
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
            Currency::INR => "INR",
            Currency::CAD => "CAD",
            Currency::AUD => "AUD",
            Currency::CHF => "CHF",
            Currency::JPY => "JPY",
            Currency::Other(code) => code,
        }
    }

    /// Lowercase code, the form card gateways expect on the wire.
    pub fn gateway_code(&self) -> String {
        self.code().to_ascii_lowercase()
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for Currency {
    type Err = DomainError;

    /// Parses a three-letter currency code, ignoring ASCII case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.len() != 3 || !trimmed.bytes().all(|b| b.is_ascii_alphabetic()) {
            return Err(DomainError::InvalidCurrency(s.to_string()));
        }
        let code = trimmed.to_ascii_uppercase();
        Ok(Currency::all()
            .iter()
            .find(|c| c.code() == code)
            .cloned()
            .unwrap_or(Currency::Other(code)))
    }
}

impl TryFrom<String> for Currency {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.code().to_string()
    }
}
