//! Shared fixtures for the HTTP integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Method, Request, Response},
};
use http_body_util::BodyExt;
use voucher_hex::{ChargeMetrics, ChargeService, inbound::HttpServer};
use voucher_repo::SqliteRepo;
use voucher_types::{
    ChargeGateway, ErrorCategory, GatewayCharge, GatewayChargeResult, GatewayError, NewCharge,
};

/// Card processor double. A few magic tokens fail:
///
/// | token | category |
/// |---|---|
/// | `tok_declined` | card declined |
/// | `tok_outage` | provider error |
/// | `tok_unreachable` | connection failure |
/// | `tok_malformed` | invalid request |
/// | `tok_garbled` | unknown |
#[derive(Default)]
pub struct FakeProcessor {
    calls: AtomicUsize,
    charges: Mutex<HashMap<String, GatewayCharge>>,
}

impl FakeProcessor {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChargeGateway for FakeProcessor {
    async fn create_charge(&self, charge: NewCharge) -> GatewayChargeResult {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(err) = failure_for(&charge.token) {
            return Err(err);
        }
        let created = GatewayCharge {
            id: format!("ch_{n}"),
            amount: charge.amount,
            currency: charge.currency.gateway_code(),
            metadata: charge.metadata,
        };
        self.charges
            .lock()
            .unwrap()
            .insert(created.id.clone(), created.clone());
        Ok(created)
    }

    async fn retrieve_charge(&self, id: &str) -> GatewayChargeResult {
        self.charges
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| {
                GatewayError::new(
                    ErrorCategory::InvalidRequest,
                    format!("No such charge: '{id}'"),
                )
            })
    }
}

fn failure_for(token: &str) -> Option<GatewayError> {
    let (category, message) = match token {
        "tok_declined" => (ErrorCategory::CardDeclined, "Your card was declined."),
        "tok_outage" => (
            ErrorCategory::ProviderError,
            "Something went wrong on Stripe's end.",
        ),
        "tok_unreachable" => (ErrorCategory::ConnectionFailure, "connection reset"),
        "tok_malformed" => (ErrorCategory::InvalidRequest, "No such token: 'tok_malformed'"),
        "tok_garbled" => (ErrorCategory::Unknown, "error decoding response body"),
        _ => return None,
    };
    Some(GatewayError::new(category, message))
}

/// Creates a server over an in-memory SQLite ledger.
pub async fn test_server(requests_per_minute: u32) -> HttpServer<SqliteRepo, FakeProcessor> {
    let repo = SqliteRepo::new("sqlite::memory:").await.unwrap();
    let service = ChargeService::new(
        repo,
        FakeProcessor::default(),
        ChargeMetrics::new().unwrap(),
    );
    HttpServer::with_rate_limit(service, requests_per_minute)
}

pub fn charge_request(path: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(path)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(path: &str) -> Request<Body> {
    Request::builder().uri(path).body(Body::empty()).unwrap()
}

pub fn charge_with_token(voucher: &str, token: &str) -> serde_json::Value {
    let mut body = valid_charge(voucher);
    body["token"] = serde_json::json!(token);
    body
}

pub fn valid_charge(voucher: &str) -> serde_json::Value {
    serde_json::json!({
        "token": "tok_visa",
        "voucher": voucher,
        "amount": "650",
        "currency": "USD"
    })
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(body.to_vec()).unwrap()
}
