//! Domain models for the voucher charge service.

pub mod charge;
pub mod tariff;
pub mod voucher;

pub use charge::{
    ChargeRequest, GatewayCharge, Metadata, NewCharge, VOUCHER_METADATA_KEY,
    voucher_from_metadata,
};
pub use tariff::{Currency, FIXED_AMOUNT, FIXED_CURRENCY};
pub use voucher::{RedemptionOutcome, Voucher, VoucherRecord};
