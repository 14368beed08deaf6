//! # Voucher Types
//!
//! Domain types and port traits for the voucher charge service.
//! This crate has ZERO external IO dependencies - only data structures,
//! business rules, and trait definitions.
//!
//! ## Architecture
//!
//! This crate represents the **innermost core** of the hexagonal architecture:
//! - `domain/` - Pure domain types (Voucher, Currency, ChargeRequest, GatewayCharge)
//! - `ports/` - Trait definitions that adapters must implement (ledger, gateway)
//! - `dto/` - Data Transfer Objects for API boundaries
//! - `error/` - Domain and application error types

pub mod domain;
pub mod dto;
pub mod error;
pub mod ports;

// Re-export commonly used types
pub use domain::{
    ChargeRequest, Currency, FIXED_AMOUNT, FIXED_CURRENCY, GatewayCharge, Metadata, NewCharge,
    RedemptionOutcome, VOUCHER_METADATA_KEY, Voucher, VoucherRecord, voucher_from_metadata,
};
pub use dto::*;
pub use error::{AppError, DomainError, RepoError};
pub use ports::{
    ChargeFn, ChargeFuture, ChargeGateway, ErrorCategory, GatewayChargeResult, GatewayError,
    VoucherLedger,
};
