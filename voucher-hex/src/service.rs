//! Charge Application Service
//!
//! Orchestrates voucher redemption through the ledger and gateway ports.
//! Contains NO infrastructure logic - pure business orchestration.

use std::sync::Arc;

use voucher_types::{
    Acknowledgement, AppError, ChargeBody, ChargeFn, ChargeFuture, ChargeGateway,
    ChargeInfoResponse, ChargeRequest, DomainError, ErrorCategory, FIXED_AMOUNT, FIXED_CURRENCY,
    NewCharge, RedemptionOutcome, Voucher, VoucherLedger, VoucherStatusResponse,
};

use crate::metrics::ChargeMetrics;

/// Checks a request against the single accepted tariff.
///
/// Amount is checked first: a request wrong in both dimensions reports the
/// amount.
pub fn validate(req: ChargeRequest) -> Result<ChargeRequest, DomainError> {
    if req.amount != FIXED_AMOUNT {
        return Err(DomainError::IncorrectAmount);
    }
    if req.currency != FIXED_CURRENCY {
        return Err(DomainError::UnsupportedCurrency);
    }
    Ok(req)
}

/// Defers the gateway call until the ledger decides to make it.
fn gateway_call<G: ChargeGateway>(gateway: Arc<G>, charge: NewCharge) -> ChargeFn<'static> {
    Box::new(move || -> ChargeFuture<'static> {
        Box::pin(async move { gateway.create_charge(charge).await })
    })
}

/// Application service for voucher charges.
///
/// Generic over the ledger and gateway ports - adapters are injected at
/// compile time. This enables:
/// - Swapping storage or card processor without code changes
/// - Testing with in-memory doubles
pub struct ChargeService<L: VoucherLedger, G: ChargeGateway> {
    ledger: Arc<L>,
    gateway: Arc<G>,
    metrics: ChargeMetrics,
}

impl<L: VoucherLedger, G: ChargeGateway> ChargeService<L, G> {
    /// Creates a new charge service.
    pub fn new(ledger: L, gateway: G, metrics: ChargeMetrics) -> Self {
        Self {
            ledger: Arc::new(ledger),
            gateway: Arc::new(gateway),
            metrics,
        }
    }

    /// Returns a reference to the underlying ledger.
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Returns a reference to the card gateway.
    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Returns the charge attempt and success counters.
    pub fn metrics(&self) -> &ChargeMetrics {
        &self.metrics
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Charge Operations
    // ─────────────────────────────────────────────────────────────────────────────

    /// Handles a charge as received on the wire, counting the attempt and,
    /// only if it succeeds, the success.
    pub async fn submit(&self, body: ChargeBody) -> Result<Acknowledgement, AppError> {
        self.metrics.record_attempt();

        let req = ChargeRequest::try_from(body).inspect_err(|e| {
            tracing::info!(reason = %e, "Rejected malformed charge request");
        })?;
        let ack = self.charge(req).await?;

        self.metrics.record_success();
        Ok(ack)
    }

    /// Validates the request, then redeems the voucher by charging the card.
    ///
    /// The redemption runs on its own task: once started, a charge is always
    /// followed by its ledger write even if the caller stops waiting.
    pub async fn charge(&self, req: ChargeRequest) -> Result<Acknowledgement, AppError> {
        let req = validate(req).inspect_err(|e| {
            tracing::info!(reason = %e, "Rejected charge request");
        })?;

        let voucher = req.voucher;
        let charge = NewCharge::for_voucher(&voucher, req.token);

        let redemption = tokio::spawn({
            let ledger = Arc::clone(&self.ledger);
            let gateway = Arc::clone(&self.gateway);
            let voucher = voucher.clone();
            async move { ledger.redeem(&voucher, gateway_call(gateway, charge)).await }
        });

        let outcome = redemption
            .await
            .map_err(|e| {
                tracing::error!(%voucher, error = %e, "Redemption task failed");
                AppError::Internal("Internal error".into())
            })?
            .inspect_err(|e| {
                tracing::error!(%voucher, error = %e, "Ledger failed to redeem voucher");
            })?;

        match outcome {
            RedemptionOutcome::Paid { transaction_id } => {
                tracing::info!(%voucher, %transaction_id, "Voucher paid");
                Ok(Acknowledgement::new())
            }
            RedemptionOutcome::AlreadyPaid => {
                tracing::info!(%voucher, "Voucher already paid");
                Err(AppError::already_paid())
            }
            RedemptionOutcome::GatewayFailure(err) => {
                tracing::warn!(
                    %voucher,
                    category = %err.category,
                    message = %err.message,
                    "Gateway charge failed"
                );
                Err(err.into())
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Read Operations
    // ─────────────────────────────────────────────────────────────────────────────

    /// Gets the payment state of a voucher. Unknown vouchers are unpaid.
    pub async fn voucher_status(&self, voucher: &str) -> Result<VoucherStatusResponse, AppError> {
        let voucher = Voucher::new(voucher)?;

        let record = self.ledger.get_voucher(&voucher).await.inspect_err(|e| {
            tracing::error!(%voucher, error = %e, "Ledger lookup failed");
        })?;

        Ok(record
            .map(VoucherStatusResponse::from)
            .unwrap_or_else(|| VoucherStatusResponse::unpaid(&voucher)))
    }

    /// Reconstructs a gateway charge, including the voucher it paid for.
    pub async fn charge_info(&self, id: &str) -> Result<ChargeInfoResponse, AppError> {
        if id.is_empty() {
            return Err(AppError::BadRequest("Charge id cannot be empty".into()));
        }

        match self.gateway.retrieve_charge(id).await {
            Ok(charge) => Ok(ChargeInfoResponse::from(charge)),
            Err(err) => {
                tracing::warn!(charge_id = %id, category = %err.category, message = %err.message, "Charge lookup failed");
                Err(match err.category {
                    ErrorCategory::InvalidRequest => {
                        AppError::NotFound(format!("Charge {} not found", id))
                    }
                    ErrorCategory::ProviderError | ErrorCategory::ConnectionFailure => {
                        AppError::ServiceUnavailable("Gateway unavailable".into())
                    }
                    ErrorCategory::CardDeclined | ErrorCategory::Unknown => {
                        AppError::Internal("Gateway error".into())
                    }
                })
            }
        }
    }
}
