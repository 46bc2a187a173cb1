//! # HTTP Gateway Adapter Tests
//!
//! Runs [`HttpPaymentGateway`] against a wiremock server to verify request
//! construction, response parsing, and error mapping without a live
//! gateway account.
//!
//! ## Note on `spawn_blocking`
//!
//! The adapter trait methods are synchronous and use `Handle::block_on`
//! internally, which cannot run on an async worker thread. Every call is
//! wrapped in `tokio::task::spawn_blocking`.

use std::sync::Arc;

use karigar_core::{CurrencyCode, IntentId, RefundId};
use karigar_gateway::{
    GatewayError, GatewayRefundState, HttpGatewayConfig, HttpPaymentGateway, PaymentGateway,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn adapter(server: &MockServer) -> Arc<HttpPaymentGateway> {
    let config = HttpGatewayConfig::new(server.uri(), "key_test", "secret_test");
    Arc::new(HttpPaymentGateway::new(config).expect("adapter build"))
}

fn pkr() -> CurrencyCode {
    CurrencyCode::new("PKR").unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn create_order_success() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "order_live_001",
            "amount": 98_900,
            "currency": "PKR",
            "receipt": "booking:b1:final",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let gw = adapter(&server);
    let order = tokio::task::spawn_blocking(move || {
        gw.create_order(98_900, &pkr(), "booking:b1:final")
    })
    .await
    .expect("task")
    .expect("order");

    assert_eq!(order.order_id.as_str(), "order_live_001");
    assert_eq!(order.amount_minor, 98_900);
    assert_eq!(order.receipt, "booking:b1:final");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn create_order_4xx_is_rejection_not_retryable() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/orders"))
        .respond_with(ResponseTemplate::new(400).set_body_string("amount too small"))
        .expect(1)
        .mount(&server)
        .await;

    let gw = adapter(&server);
    let err = tokio::task::spawn_blocking(move || gw.create_order(1, &pkr(), "r"))
        .await
        .expect("task")
        .unwrap_err();

    assert!(matches!(err, GatewayError::OrderRejected { .. }));
    assert!(!err.is_retryable());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn create_order_5xx_is_service_unavailable() {
    let server = MockServer::start().await;

    // 5xx on every attempt; the retry helper retries transport errors only,
    // so a single 500 response surfaces immediately as ServiceUnavailable.
    Mock::given(method("POST"))
        .and(path("/orders"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let gw = adapter(&server);
    let err = tokio::task::spawn_blocking(move || gw.create_order(100, &pkr(), "r"))
        .await
        .expect("task")
        .unwrap_err();

    assert!(matches!(err, GatewayError::ServiceUnavailable { .. }));
    assert!(err.is_retryable());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn refund_roundtrip_and_status_mapping() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/refunds"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "rfnd_live_1",
            "order_id": "order_live_001",
            "amount": 25_000,
            "status": "initiated",
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/refunds/rfnd_live_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "rfnd_live_1",
            "order_id": "order_live_001",
            "amount": 25_000,
            "status": "processed",
        })))
        .mount(&server)
        .await;

    let gw = adapter(&server);
    let order_id = IntentId::new("order_live_001").unwrap();

    let gw2 = gw.clone();
    let refund = tokio::task::spawn_blocking(move || {
        gw2.create_refund(&order_id, 25_000, "cancelled before visit")
    })
    .await
    .expect("task")
    .expect("refund");
    assert_eq!(refund.state, GatewayRefundState::Initiated);

    let refund_id = refund.refund_id.clone();
    let polled = tokio::task::spawn_blocking(move || gw.fetch_refund(&refund_id))
        .await
        .expect("task")
        .expect("poll");
    assert_eq!(polled.state, GatewayRefundState::Processed);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn fetch_unknown_refund_maps_404() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/refunds/rfnd_missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let gw = adapter(&server);
    let err = tokio::task::spawn_blocking(move || {
        gw.fetch_refund(&RefundId::new("rfnd_missing").unwrap())
    })
    .await
    .expect("task")
    .unwrap_err();

    assert!(matches!(err, GatewayError::RefundNotFound { .. }));
}

#[test]
fn missing_credentials_is_not_configured() {
    let err = HttpPaymentGateway::new(HttpGatewayConfig::new("http://localhost", "", ""))
        .err()
        .expect("must fail");
    assert!(matches!(err, GatewayError::NotConfigured { .. }));
}
