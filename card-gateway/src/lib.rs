//! # Card Gateway
//!
//! Outbound adapter that implements the `ChargeGateway` port against the
//! Stripe REST API.
//!
//! Every failure is classified into one of the closed `ErrorCategory` set
//! before it leaves this crate, so the application layer never sees HTTP or
//! transport details.
//!
//! # Example
//! ```ignore
//! use card_gateway::{StripeConfig, StripeGateway};
//!
//! let gateway = StripeGateway::new(StripeConfig::new("sk_test_..."))?;
//! let charge = gateway.create_charge(NewCharge::for_voucher(&voucher, token)).await?;
//! ```

mod classify;
mod stripe;
mod wire;

pub use classify::{classify_error_type, classify_status, classify_transport};
pub use stripe::{StripeConfig, StripeGateway};
