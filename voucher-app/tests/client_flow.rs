//! Full voucher flow over a real socket: server on an on-disk SQLite ledger,
//! driven through the client SDK.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tempfile::tempdir;
use tokio::net::TcpListener;

use voucher_client::{ClientError, VoucherClient};
use voucher_hex::{ChargeMetrics, ChargeService, inbound::HttpServer};
use voucher_repo::SqliteRepo;
use voucher_types::{
    ChargeBody, ChargeGateway, ErrorCategory, GatewayCharge, GatewayChargeResult, GatewayError,
    NewCharge,
};

/// Accepts every token except `tok_chargeDeclined`.
#[derive(Default)]
struct FakeProcessor {
    calls: AtomicUsize,
}

#[async_trait]
impl ChargeGateway for FakeProcessor {
    async fn create_charge(&self, charge: NewCharge) -> GatewayChargeResult {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if charge.token == "tok_chargeDeclined" {
            return Err(GatewayError::new(
                ErrorCategory::CardDeclined,
                "Your card was declined.",
            ));
        }
        Ok(GatewayCharge {
            id: format!("ch_{n}"),
            amount: charge.amount,
            currency: charge.currency.gateway_code(),
            metadata: charge.metadata,
        })
    }

    async fn retrieve_charge(&self, id: &str) -> GatewayChargeResult {
        Err(GatewayError::new(
            ErrorCategory::InvalidRequest,
            format!("No such charge: '{id}'"),
        ))
    }
}

async fn spawn_server(db_url: &str) -> String {
    let repo = SqliteRepo::new(db_url).await.unwrap();
    let service = ChargeService::new(
        repo,
        FakeProcessor::default(),
        ChargeMetrics::new().unwrap(),
    );
    let router = HttpServer::new(service).router();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router.into_make_service())
            .await
            .unwrap();
    });

    format!("http://{addr}")
}

#[tokio::test]
async fn test_voucher_paid_once_through_client() {
    let tmp = tempdir().unwrap();
    let db_path = tmp.path().join("ledger").join("vouchers.db");
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

    let client = VoucherClient::new(spawn_server(&db_url).await);

    assert!(client.health().await.unwrap());
    assert!(!client.voucher_status("gift-1").await.unwrap().paid);

    let ack = client.pay_voucher("tok_visa", "gift-1").await.unwrap();
    assert!(ack.success);
    assert!(client.voucher_status("gift-1").await.unwrap().paid);

    let err = client.pay_voucher("tok_visa", "gift-1").await.unwrap_err();
    assert!(matches!(err, ClientError::Api { status: 400, .. }));
    assert_eq!(err.reason(), Some("Payment for voucher already supplied"));
}

#[tokio::test]
async fn test_client_surfaces_failure_reasons() {
    let tmp = tempdir().unwrap();
    let db_url = format!(
        "sqlite://{}?mode=rwc",
        tmp.path().join("vouchers.db").display()
    );

    let client = VoucherClient::new(spawn_server(&db_url).await);

    let wrong_amount = ChargeBody {
        token: "tok_visa".into(),
        voucher: "gift-2".into(),
        amount: "100".into(),
        currency: "USD".into(),
    };
    let err = client.charge(&wrong_amount).await.unwrap_err();
    assert_eq!(err.reason(), Some("Incorrect charge amount"));

    let err = client
        .pay_voucher("tok_chargeDeclined", "gift-2")
        .await
        .unwrap_err();
    assert_eq!(
        err.reason(),
        Some("Charge didn't succeed: Your card was declined.")
    );

    let err = client.get_charge("ch_missing").await.unwrap_err();
    assert!(matches!(err, ClientError::Api { status: 404, .. }));
}
