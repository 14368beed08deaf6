//! Integration tests for rate limiting middleware.
//!
//! These tests verify the HTTP-level behavior of rate limiting,
//! including 429 responses and proper integration with the middleware stack.

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use tower::ServiceExt;

use common::{body_json, charge_request, get, test_server, valid_charge};

/// Helper to make a voucher status request from a given client.
fn status_request(client: &str) -> Request<Body> {
    Request::builder()
        .uri("/v1/vouchers/abc")
        .header("X-Forwarded-For", client)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_rate_limiting_returns_429_when_exceeded() {
    // Create server with only 3 requests allowed per minute
    let server = test_server(3).await;
    let app = server.router();

    for i in 1..=3 {
        let response = app
            .clone()
            .oneshot(status_request("198.51.100.1"))
            .await
            .unwrap();
        assert_eq!(
            response.status(),
            StatusCode::OK,
            "Request {} should not be rate limited (quota not yet exceeded)",
            i
        );
    }

    // 4th request should be rate limited
    let response = app
        .clone()
        .oneshot(status_request("198.51.100.1"))
        .await
        .unwrap();

    assert_eq!(
        response.status(),
        StatusCode::TOO_MANY_REQUESTS,
        "Request should be rate limited after exceeding quota"
    );

    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert!(
        json["reason"]
            .as_str()
            .unwrap()
            .contains("Rate limit exceeded")
    );
}

#[tokio::test]
async fn test_rate_limiting_health_and_metrics_bypassed() {
    // Create server with only 1 request allowed per minute
    let server = test_server(1).await;
    let app = server.router();

    for _ in 0..10 {
        let response = app.clone().oneshot(get("/health")).await.unwrap();
        assert_eq!(
            response.status(),
            StatusCode::OK,
            "Health endpoint should not be rate limited"
        );

        let response = app.clone().oneshot(get("/metrics")).await.unwrap();
        assert_eq!(
            response.status(),
            StatusCode::OK,
            "Metrics endpoint should not be rate limited"
        );
    }
}

#[tokio::test]
async fn test_rate_limiting_per_client_isolation() {
    let server = test_server(1).await;
    let app = server.router();

    let response = app
        .clone()
        .oneshot(status_request("198.51.100.1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(status_request("198.51.100.1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    // Client B has its own quota
    let response = app
        .clone()
        .oneshot(status_request("198.51.100.2"))
        .await
        .unwrap();
    assert_eq!(
        response.status(),
        StatusCode::OK,
        "Client B should have its own quota"
    );
}

#[tokio::test]
async fn test_rate_limited_charge_never_reaches_gateway() {
    let server = test_server(1).await;
    let app = server.router();

    // Requests without a forwarding header share the anonymous quota
    let response = app
        .clone()
        .oneshot(charge_request("/v1/stripe/charge", valid_charge("a")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(charge_request("/v1/stripe/charge", valid_charge("b")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    // Verify headers
    let content_type = response.headers().get("content-type").unwrap();
    assert!(content_type.to_str().unwrap().contains("application/json"));

    assert_eq!(server.service().gateway().calls(), 1);
    assert_eq!(server.service().metrics().attempts(), 1);
}
