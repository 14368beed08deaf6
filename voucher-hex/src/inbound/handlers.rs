//! HTTP request handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use utoipa::OpenApi;

use voucher_types::{AppError, ChargeBody, ChargeGateway, Failure, VoucherLedger};

use crate::ChargeService;
use crate::openapi::ApiDoc;

/// Application state shared across handlers.
pub struct AppState<L: VoucherLedger, G: ChargeGateway> {
    pub service: ChargeService<L, G>,
}

/// Wrapper to implement IntoResponse for AppError (orphan rule workaround).
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(Failure::new(self.0.to_string()))).into_response()
    }
}

/// Health check endpoint.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy" }))
}

/// Charge a card to pay for a voucher.
#[tracing::instrument(skip_all, fields(voucher = tracing::field::Empty))]
pub async fn charge<L: VoucherLedger, G: ChargeGateway>(
    State(state): State<Arc<AppState<L, G>>>,
    payload: Result<Json<ChargeBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = payload.map_err(|rejection| {
        tracing::info!(reason = %rejection.body_text(), "Rejected unreadable charge body");
        AppError::BadRequest(rejection.body_text())
    })?;
    tracing::Span::current().record("voucher", body.voucher.as_str());

    let ack = state.service.submit(body).await?;
    Ok(Json(ack))
}

/// Get the payment state of a voucher.
#[tracing::instrument(skip(state))]
pub async fn voucher_status<L: VoucherLedger, G: ChargeGateway>(
    State(state): State<Arc<AppState<L, G>>>,
    Path(voucher): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let status = state.service.voucher_status(&voucher).await?;
    Ok(Json(status))
}

/// Look up a charge at the gateway.
#[tracing::instrument(skip(state))]
pub async fn charge_info<L: VoucherLedger, G: ChargeGateway>(
    State(state): State<Arc<AppState<L, G>>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let info = state.service.charge_info(&id).await?;
    Ok(Json(info))
}

/// Prometheus scrape endpoint.
pub async fn metrics<L: VoucherLedger, G: ChargeGateway>(
    State(state): State<Arc<AppState<L, G>>>,
) -> Result<impl IntoResponse, ApiError> {
    let text = state.service.metrics().render().map_err(|e| {
        tracing::error!(error = %e, "Failed to encode metrics");
        AppError::Internal("Internal error".into())
    })?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        text,
    ))
}

/// OpenAPI document for the HTTP surface.
pub async fn openapi() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}
