//! Port traits (interfaces for adapters).
//!
//! These are the contracts that adapters must implement.
//! The application layer depends on these traits, not concrete implementations.

mod gateway;
mod ledger;

pub use gateway::{ChargeGateway, ErrorCategory, GatewayChargeResult, GatewayError};
pub use ledger::{ChargeFn, ChargeFuture, VoucherLedger};
