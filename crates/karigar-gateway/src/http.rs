//! # Live HTTP Gateway Adapter
//!
//! Production implementation of [`PaymentGateway`] against the external
//! payment gateway's REST API. Wraps a `reqwest::Client` with key-id /
//! secret basic auth, a per-request timeout, and transport-level retry
//! via [`crate::retry`].
//!
//! ## Sync Bridge
//!
//! The trait is synchronous; this adapter drives its async HTTP calls via
//! the ambient Tokio runtime handle. Trait methods must therefore be
//! called from a blocking context (`tokio::task::spawn_blocking`), never
//! directly from an async worker.
//!
//! ## Error Handling
//!
//! Timeouts and 5xx responses map to the retryable
//! [`GatewayError::Timeout`] / [`GatewayError::ServiceUnavailable`];
//! 4xx responses map to the non-retryable rejection variants. A network
//! failure never leaves an order in an unknown local state — callers
//! persist intents only after a successful return.

use serde::Deserialize;
use std::time::Duration;

use karigar_core::{CurrencyCode, IntentId, RefundId};

use crate::client::{
    GatewayError, GatewayOrder, GatewayRefund, GatewayRefundState, PaymentGateway,
};
use crate::retry::retry_send;

/// Configuration for the live gateway adapter.
#[derive(Debug, Clone)]
pub struct HttpGatewayConfig {
    /// Base URL of the gateway API (e.g. `https://api.gateway.example/v1`).
    pub base_url: String,
    /// API key identifier.
    pub key_id: String,
    /// API key secret.
    pub key_secret: String,
    /// Request timeout in seconds (default: 30).
    pub timeout_secs: u64,
}

impl HttpGatewayConfig {
    /// Create a configuration with the default timeout.
    pub fn new(
        base_url: impl Into<String>,
        key_id: impl Into<String>,
        key_secret: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            key_id: key_id.into(),
            key_secret: key_secret.into(),
            timeout_secs: 30,
        }
    }
}

/// Live HTTP client for the external payment gateway.
#[derive(Debug)]
pub struct HttpPaymentGateway {
    client: reqwest::Client,
    base_url: String,
    key_id: String,
    key_secret: String,
    timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
struct OrderResponse {
    id: String,
    amount: i64,
    currency: String,
    receipt: String,
}

#[derive(Debug, Deserialize)]
struct RefundResponse {
    id: String,
    order_id: String,
    amount: i64,
    status: String,
}

impl HttpPaymentGateway {
    /// Build the adapter from configuration.
    pub fn new(config: HttpGatewayConfig) -> Result<Self, GatewayError> {
        if config.key_id.trim().is_empty() || config.key_secret.trim().is_empty() {
            return Err(GatewayError::NotConfigured {
                reason: "gateway key id and secret are required".into(),
            });
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GatewayError::ServiceUnavailable {
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            key_id: config.key_id,
            key_secret: config.key_secret,
            timeout_ms: config.timeout_secs * 1_000,
        })
    }

    /// Acquire the ambient runtime handle for the sync→async bridge.
    fn runtime(&self) -> Result<tokio::runtime::Handle, GatewayError> {
        tokio::runtime::Handle::try_current().map_err(|_| GatewayError::ServiceUnavailable {
            reason: "no async runtime available for HTTP request".into(),
        })
    }

    /// Send a request with retry and map transport/5xx errors consistently.
    async fn send_request(
        &self,
        build: impl Fn() -> reqwest::RequestBuilder,
        operation: &str,
    ) -> Result<reqwest::Response, GatewayError> {
        let resp = retry_send(|| build().send()).await.map_err(|e| {
            if e.is_timeout() {
                GatewayError::Timeout {
                    elapsed_ms: self.timeout_ms,
                }
            } else {
                GatewayError::ServiceUnavailable {
                    reason: format!("{operation}: {e}"),
                }
            }
        })?;

        if resp.status().is_server_error() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(GatewayError::ServiceUnavailable {
                reason: format!("{operation}: HTTP {status} {body}"),
            });
        }

        Ok(resp)
    }

    fn parse_refund(&self, raw: RefundResponse) -> Result<GatewayRefund, GatewayError> {
        let state = match raw.status.as_str() {
            "initiated" | "pending" => GatewayRefundState::Initiated,
            "processed" => GatewayRefundState::Processed,
            "failed" => GatewayRefundState::Failed,
            other => {
                return Err(GatewayError::RefundRejected {
                    reason: format!("unknown refund status from gateway: {other:?}"),
                })
            }
        };
        Ok(GatewayRefund {
            refund_id: RefundId::new(raw.id).map_err(|e| GatewayError::RefundRejected {
                reason: e.to_string(),
            })?,
            order_id: IntentId::new(raw.order_id).map_err(|e| GatewayError::RefundRejected {
                reason: e.to_string(),
            })?,
            amount_minor: raw.amount,
            state,
        })
    }
}

impl PaymentGateway for HttpPaymentGateway {
    fn create_order(
        &self,
        amount_minor: i64,
        currency: &CurrencyCode,
        receipt: &str,
    ) -> Result<GatewayOrder, GatewayError> {
        let rt = self.runtime()?;
        let url = format!("{}/orders", self.base_url);
        let body = serde_json::json!({
            "amount": amount_minor,
            "currency": currency.as_str(),
            "receipt": receipt,
        });

        rt.block_on(async {
            let resp = self
                .send_request(
                    || {
                        self.client
                            .post(&url)
                            .basic_auth(&self.key_id, Some(&self.key_secret))
                            .json(&body)
                    },
                    "create_order",
                )
                .await?;

            if resp.status().is_client_error() {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                return Err(GatewayError::OrderRejected {
                    reason: format!("HTTP {status}: {body}"),
                });
            }

            let raw: OrderResponse =
                resp.json()
                    .await
                    .map_err(|e| GatewayError::OrderRejected {
                        reason: format!("response deserialization failed: {e}"),
                    })?;

            Ok(GatewayOrder {
                order_id: IntentId::new(raw.id).map_err(|e| GatewayError::OrderRejected {
                    reason: e.to_string(),
                })?,
                amount_minor: raw.amount,
                currency: CurrencyCode::new(raw.currency).map_err(|e| {
                    GatewayError::OrderRejected {
                        reason: e.to_string(),
                    }
                })?,
                receipt: raw.receipt,
            })
        })
    }

    fn create_refund(
        &self,
        order_id: &IntentId,
        amount_minor: i64,
        reason: &str,
    ) -> Result<GatewayRefund, GatewayError> {
        let rt = self.runtime()?;
        let url = format!("{}/refunds", self.base_url);
        let body = serde_json::json!({
            "order_id": order_id.as_str(),
            "amount": amount_minor,
            "reason": reason,
        });

        rt.block_on(async {
            let resp = self
                .send_request(
                    || {
                        self.client
                            .post(&url)
                            .basic_auth(&self.key_id, Some(&self.key_secret))
                            .json(&body)
                    },
                    "create_refund",
                )
                .await?;

            if resp.status().is_client_error() {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                return Err(GatewayError::RefundRejected {
                    reason: format!("HTTP {status}: {body}"),
                });
            }

            let raw: RefundResponse =
                resp.json()
                    .await
                    .map_err(|e| GatewayError::RefundRejected {
                        reason: format!("response deserialization failed: {e}"),
                    })?;
            self.parse_refund(raw)
        })
    }

    fn fetch_refund(&self, refund_id: &RefundId) -> Result<GatewayRefund, GatewayError> {
        let rt = self.runtime()?;
        let url = format!("{}/refunds/{}", self.base_url, refund_id.as_str());

        rt.block_on(async {
            let resp = self
                .send_request(
                    || {
                        self.client
                            .get(&url)
                            .basic_auth(&self.key_id, Some(&self.key_secret))
                    },
                    "fetch_refund",
                )
                .await?;

            if resp.status() == reqwest::StatusCode::NOT_FOUND {
                return Err(GatewayError::RefundNotFound {
                    refund_id: refund_id.to_string(),
                });
            }
            if resp.status().is_client_error() {
                let status = resp.status();
                return Err(GatewayError::RefundRejected {
                    reason: format!("HTTP {status}"),
                });
            }

            let raw: RefundResponse =
                resp.json()
                    .await
                    .map_err(|e| GatewayError::RefundRejected {
                        reason: format!("response deserialization failed: {e}"),
                    })?;
            self.parse_refund(raw)
        })
    }

    fn gateway_name(&self) -> &str {
        "HttpPaymentGateway"
    }
}
