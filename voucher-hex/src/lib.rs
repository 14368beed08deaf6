//! # Voucher Hex
//!
//! Application service layer and HTTP adapter for the voucher charge service.
//!
//! ## Architecture
//!
//! - `service/` - Application service (validates, redeems, counts)
//! - `inbound/` - HTTP adapter (Axum server)
//! - `metrics/` - Prometheus charge counters
//!
//! The service is generic over `L: VoucherLedger` and `G: ChargeGateway`,
//! allowing different storage and card processor adapters to be injected.

pub mod inbound;
pub mod metrics;
pub mod openapi;
pub mod service;


pub use metrics::ChargeMetrics;
pub use service::{ChargeService, validate};
