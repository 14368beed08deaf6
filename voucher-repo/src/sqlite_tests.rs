//! SQLite ledger integration tests.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use voucher_types::{
        ChargeFn, ChargeFuture, ErrorCategory, GatewayCharge, GatewayError, RedemptionOutcome,
        Voucher, VoucherLedger,
    };

    use crate::SqliteRepo;

    async fn setup_repo() -> SqliteRepo {
        SqliteRepo::new("sqlite::memory:").await.unwrap()
    }

    fn voucher(s: &str) -> Voucher {
        Voucher::new(s).unwrap()
    }

    fn succeeding(calls: Arc<AtomicUsize>, charge_id: &str) -> ChargeFn<'static> {
        let charge_id = charge_id.to_string();
        Box::new(move || -> ChargeFuture<'static> {
            Box::pin(async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(GatewayCharge {
                    id: charge_id,
                    amount: 650,
                    currency: "usd".to_string(),
                    metadata: Vec::new(),
                })
            })
        })
    }

    fn failing(calls: Arc<AtomicUsize>, category: ErrorCategory) -> ChargeFn<'static> {
        Box::new(move || -> ChargeFuture<'static> {
            Box::pin(async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(GatewayError::new(category, "gateway said no"))
            })
        })
    }

    #[tokio::test]
    async fn test_issue_voucher() {
        let repo = setup_repo().await;

        let record = repo.issue_voucher(&voucher("abc")).await.unwrap();

        assert_eq!(record.voucher.as_str(), "abc");
        assert!(!record.paid);
        assert!(record.charge_id.is_none());
    }

    #[tokio::test]
    async fn test_issue_voucher_is_idempotent() {
        let repo = setup_repo().await;

        let first = repo.issue_voucher(&voucher("abc")).await.unwrap();
        let second = repo.issue_voucher(&voucher("abc")).await.unwrap();

        assert_eq!(first.created_at, second.created_at);
    }

    #[tokio::test]
    async fn test_get_voucher_not_found() {
        let repo = setup_repo().await;

        let result = repo.get_voucher(&voucher("missing")).await.unwrap();

        assert!(result.is_none());
        assert!(!repo.is_paid(&voucher("missing")).await.unwrap());
    }

    #[tokio::test]
    async fn test_redeem_records_payment() {
        let repo = setup_repo().await;
        let calls = Arc::new(AtomicUsize::new(0));

        let outcome = repo
            .redeem(&voucher("abc"), succeeding(calls.clone(), "ch_1"))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            RedemptionOutcome::Paid {
                transaction_id: "ch_1".to_string()
            }
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let record = repo.get_voucher(&voucher("abc")).await.unwrap().unwrap();
        assert!(record.paid);
        assert_eq!(record.charge_id.as_deref(), Some("ch_1"));
        assert!(record.paid_at.is_some());
    }

    #[tokio::test]
    async fn test_redeem_already_paid_skips_gateway() {
        let repo = setup_repo().await;
        let calls = Arc::new(AtomicUsize::new(0));

        repo.redeem(&voucher("abc"), succeeding(calls.clone(), "ch_1"))
            .await
            .unwrap();
        let outcome = repo
            .redeem(&voucher("abc"), succeeding(calls.clone(), "ch_2"))
            .await
            .unwrap();

        assert_eq!(outcome, RedemptionOutcome::AlreadyPaid);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let record = repo.get_voucher(&voucher("abc")).await.unwrap().unwrap();
        assert_eq!(record.charge_id.as_deref(), Some("ch_1"));
    }

    #[tokio::test]
    async fn test_gateway_failure_leaves_voucher_unpaid() {
        let repo = setup_repo().await;
        let calls = Arc::new(AtomicUsize::new(0));

        let outcome = repo
            .redeem(
                &voucher("abc"),
                failing(calls.clone(), ErrorCategory::CardDeclined),
            )
            .await
            .unwrap();

        assert!(matches!(
            outcome,
            RedemptionOutcome::GatewayFailure(GatewayError {
                category: ErrorCategory::CardDeclined,
                ..
            })
        ));
        assert!(!repo.is_paid(&voucher("abc")).await.unwrap());
    }

    #[tokio::test]
    async fn test_retry_after_connection_failure_succeeds() {
        let repo = setup_repo().await;
        let calls = Arc::new(AtomicUsize::new(0));

        repo.redeem(
            &voucher("abc"),
            failing(calls.clone(), ErrorCategory::ConnectionFailure),
        )
        .await
        .unwrap();
        let outcome = repo
            .redeem(&voucher("abc"), succeeding(calls.clone(), "ch_1"))
            .await
            .unwrap();

        assert!(matches!(outcome, RedemptionOutcome::Paid { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(repo.is_paid(&voucher("abc")).await.unwrap());
    }

    #[tokio::test]
    async fn test_vouchers_are_independent() {
        let repo = setup_repo().await;
        let calls = Arc::new(AtomicUsize::new(0));

        repo.redeem(&voucher("a"), succeeding(calls.clone(), "ch_a"))
            .await
            .unwrap();

        assert!(repo.is_paid(&voucher("a")).await.unwrap());
        assert!(!repo.is_paid(&voucher("b")).await.unwrap());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_redeem_charges_once() {
        const RACERS: usize = 8;

        let repo = Arc::new(setup_repo().await);
        let calls = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..RACERS)
            .map(|i| {
                let repo = repo.clone();
                let calls = calls.clone();
                tokio::spawn(async move {
                    repo.redeem(&voucher("contested"), succeeding(calls, &format!("ch_{i}")))
                        .await
                        .unwrap()
                })
            })
            .collect();

        let mut paid = 0;
        let mut already_paid = 0;
        for handle in handles {
            match handle.await.unwrap() {
                RedemptionOutcome::Paid { .. } => paid += 1,
                RedemptionOutcome::AlreadyPaid => already_paid += 1,
                RedemptionOutcome::GatewayFailure(e) => panic!("unexpected failure: {e}"),
            }
        }

        assert_eq!(paid, 1);
        assert_eq!(already_paid, RACERS - 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(repo.lock_entries(), 0);
    }

    #[tokio::test]
    async fn test_dropped_redeem_releases_voucher_lock() {
        let repo = setup_repo().await;
        let calls = Arc::new(AtomicUsize::new(0));
        let stalled: ChargeFn<'static> = Box::new(|| -> ChargeFuture<'static> {
            Box::pin(async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                Err(GatewayError::new(ErrorCategory::Unknown, "never finishes"))
            })
        });

        let dropped = tokio::time::timeout(
            Duration::from_millis(20),
            repo.redeem(&voucher("abc"), stalled),
        )
        .await;
        assert!(dropped.is_err());
        assert_eq!(repo.lock_entries(), 0);

        let outcome = repo
            .redeem(&voucher("abc"), succeeding(calls.clone(), "ch_1"))
            .await
            .unwrap();
        assert!(matches!(outcome, RedemptionOutcome::Paid { .. }));
        assert_eq!(repo.lock_entries(), 0);
    }
}
