//! Ledger port trait.
//!
//! This is the primary port in our hexagonal architecture.
//! Adapters (Postgres, SQLite) implement this trait.

use std::future::Future;
use std::pin::Pin;

use crate::domain::{RedemptionOutcome, Voucher, VoucherRecord};
use crate::error::RepoError;

use super::gateway::GatewayChargeResult;

/// The pending gateway call handed to [`VoucherLedger::redeem`].
pub type ChargeFuture<'a> = Pin<Box<dyn Future<Output = GatewayChargeResult> + Send + 'a>>;

/// Starts the gateway call. Invoked at most once per `redeem`.
pub type ChargeFn<'a> = Box<dyn FnOnce() -> ChargeFuture<'a> + Send + 'a>;

/// The durable record of which vouchers are paid.
///
/// `redeem` MUST be atomic per voucher: across all concurrent callers, at most
/// one charge closure for a given voucher may succeed and be recorded paid.
#[async_trait::async_trait]
pub trait VoucherLedger: Send + Sync + 'static {
    /// Records a voucher as issued and unpaid. Re-issuing is a no-op.
    async fn issue_voucher(&self, voucher: &Voucher) -> Result<VoucherRecord, RepoError>;

    /// Gets a voucher's payment state.
    async fn get_voucher(&self, voucher: &Voucher) -> Result<Option<VoucherRecord>, RepoError>;

    /// Whether the voucher has been paid for. Unknown vouchers are unpaid.
    async fn is_paid(&self, voucher: &Voucher) -> Result<bool, RepoError> {
        Ok(self
            .get_voucher(voucher)
            .await?
            .is_some_and(|record| record.paid))
    }

    /// Redeems a voucher.
    ///
    /// - Already paid: returns [`RedemptionOutcome::AlreadyPaid`] without
    ///   invoking `charge`.
    /// - Otherwise invokes `charge` once. On success the voucher is recorded
    ///   paid in the same critical section; on failure it stays unpaid and the
    ///   gateway error is returned as [`RedemptionOutcome::GatewayFailure`].
    ///
    /// Unknown vouchers are treated as issued and unpaid.
    async fn redeem(
        &self,
        voucher: &Voucher,
        charge: ChargeFn<'_>,
    ) -> Result<RedemptionOutcome, RepoError>;
}
