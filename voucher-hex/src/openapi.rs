//! OpenAPI specification and documentation.

#![allow(dead_code)] // Path functions are only used by utoipa for documentation generation

use utoipa::OpenApi;
use voucher_types::{
    Acknowledgement, ChargeBody, ChargeInfoResponse, Failure, VoucherStatusResponse,
};

// Dummy functions to generate path documentation
// These are not the actual handlers, just for OpenAPI path generation

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = inline(serde_json::Value), example = json!({"status": "healthy"}))
    )
)]
async fn health() {}

/// Charge a card to pay for a voucher
///
/// `/charge` is accepted as an alias.
#[utoipa::path(
    post,
    path = "/v1/stripe/charge",
    tag = "charges",
    request_body = ChargeBody,
    responses(
        (status = 200, description = "Voucher paid", body = Acknowledgement),
        (status = 400, description = "Bad request, declined card or voucher already paid", body = Failure),
        (status = 429, description = "Rate limit exceeded", body = Failure),
        (status = 500, description = "Internal error", body = Failure),
        (status = 503, description = "Card processor unavailable", body = Failure)
    )
)]
async fn charge() {}

/// Get the payment state of a voucher
#[utoipa::path(
    get,
    path = "/v1/vouchers/{voucher}",
    tag = "vouchers",
    params(
        ("voucher" = String, Path, description = "Voucher identifier")
    ),
    responses(
        (status = 200, description = "Voucher state, unknown vouchers are unpaid", body = VoucherStatusResponse),
        (status = 500, description = "Internal error", body = Failure)
    )
)]
async fn voucher_status() {}

/// Look up a charge at the card processor
#[utoipa::path(
    get,
    path = "/v1/charges/{id}",
    tag = "charges",
    params(
        ("id" = String, Path, description = "Processor charge id")
    ),
    responses(
        (status = 200, description = "Charge found", body = ChargeInfoResponse),
        (status = 404, description = "Charge not found", body = Failure),
        (status = 503, description = "Card processor unavailable", body = Failure)
    )
)]
async fn charge_info() {}

/// Prometheus metrics
#[utoipa::path(
    get,
    path = "/metrics",
    tag = "health",
    responses(
        (status = 200, description = "Prometheus text exposition", body = String, content_type = "text/plain")
    )
)]
async fn metrics() {}

/// OpenAPI documentation for the voucher charge API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Voucher Charge Service API",
        version = "1.0.0",
        description = "Charges a card exactly once per voucher.\n\nEvery charge costs a fixed 650 USD minor units. A voucher that is already paid is refused without contacting the card processor.",
        license(name = "MIT"),
    ),
    paths(health, charge, voucher_status, charge_info, metrics),
    components(
        schemas(
            ChargeBody,
            Acknowledgement,
            Failure,
            VoucherStatusResponse,
            ChargeInfoResponse,
        )
    ),
    tags(
        (name = "health", description = "Health and metrics endpoints"),
        (name = "charges", description = "Voucher charges"),
        (name = "vouchers", description = "Voucher state"),
    )
)]
pub struct ApiDoc;
