//! # karigar-gateway — Payment Gateway Client Adapter
//!
//! Abstracts the external payment gateway behind the object-safe
//! [`PaymentGateway`] trait. Production deployments use
//! [`HttpPaymentGateway`] against the live gateway API; tests and
//! development use [`MockGateway`]. The booking orchestrator composes
//! gateway operations without coupling to a transport or vendor API
//! version.
//!
//! ## Inbound webhooks
//!
//! The gateway notifies payment outcomes asynchronously, at-least-once and
//! possibly out of order. [`WebhookVerifier`] authenticates a delivery by
//! recomputing an HMAC-SHA256 over the **exact raw body bytes** and
//! comparing in constant time; only verified payloads are parsed. The
//! idempotency of *applying* a verified event lives in the payment ledger,
//! not here.

pub mod client;
pub mod http;
pub mod mock;
mod retry;
pub mod webhook;

pub use client::{GatewayError, GatewayOrder, GatewayRefund, GatewayRefundState, PaymentGateway};
pub use http::{HttpGatewayConfig, HttpPaymentGateway};
pub use mock::MockGateway;
pub use webhook::{WebhookError, WebhookEvent, WebhookEventKind, WebhookVerifier};
