//! # Mock Gateway
//!
//! Deterministic in-process gateway for tests and development.
//!
//! Conventions:
//! - non-positive amounts are rejected,
//! - an empty receipt is rejected,
//! - a receipt containing `"unreachable"` simulates a gateway outage,
//! - refunds are `Initiated` on create and report `Processed` on the
//!   first fetch (instant settlement).

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use karigar_core::{CurrencyCode, IntentId, RefundId};

use crate::client::{
    GatewayError, GatewayOrder, GatewayRefund, GatewayRefundState, PaymentGateway,
};

/// Mock payment gateway for testing and development.
#[derive(Debug, Default)]
pub struct MockGateway {
    counter: AtomicU64,
    refunds: Mutex<HashMap<RefundId, GatewayRefund>>,
}

impl MockGateway {
    /// Create a fresh mock with no recorded refunds.
    pub fn new() -> Self {
        Self::default()
    }

    fn next_seq(&self) -> u64 {
        self.counter.fetch_add(1, Ordering::SeqCst) + 1
    }
}

impl PaymentGateway for MockGateway {
    fn create_order(
        &self,
        amount_minor: i64,
        currency: &CurrencyCode,
        receipt: &str,
    ) -> Result<GatewayOrder, GatewayError> {
        if receipt.trim().is_empty() {
            return Err(GatewayError::OrderRejected {
                reason: "receipt must not be empty".to_string(),
            });
        }
        if amount_minor <= 0 {
            return Err(GatewayError::OrderRejected {
                reason: format!("amount must be positive, got {amount_minor}"),
            });
        }
        if receipt.contains("unreachable") {
            return Err(GatewayError::ServiceUnavailable {
                reason: "mock outage (receipt contains 'unreachable')".to_string(),
            });
        }

        let order_id = IntentId::new(format!("order_mock_{:06}", self.next_seq()))
            .map_err(|e| GatewayError::OrderRejected {
                reason: e.to_string(),
            })?;
        Ok(GatewayOrder {
            order_id,
            amount_minor,
            currency: currency.clone(),
            receipt: receipt.to_string(),
        })
    }

    fn create_refund(
        &self,
        order_id: &IntentId,
        amount_minor: i64,
        reason: &str,
    ) -> Result<GatewayRefund, GatewayError> {
        if amount_minor <= 0 {
            return Err(GatewayError::RefundRejected {
                reason: format!("amount must be positive, got {amount_minor}"),
            });
        }
        if reason.trim().is_empty() {
            return Err(GatewayError::RefundRejected {
                reason: "refund reason must not be empty".to_string(),
            });
        }

        let refund_id = RefundId::new(format!("rfnd_mock_{:06}", self.next_seq()))
            .map_err(|e| GatewayError::RefundRejected {
                reason: e.to_string(),
            })?;
        let refund = GatewayRefund {
            refund_id: refund_id.clone(),
            order_id: order_id.clone(),
            amount_minor,
            state: GatewayRefundState::Initiated,
        };
        self.refunds.lock().insert(refund_id, refund.clone());
        Ok(refund)
    }

    fn fetch_refund(&self, refund_id: &RefundId) -> Result<GatewayRefund, GatewayError> {
        let mut refunds = self.refunds.lock();
        let refund = refunds
            .get_mut(refund_id)
            .ok_or_else(|| GatewayError::RefundNotFound {
                refund_id: refund_id.to_string(),
            })?;
        // Instant settlement: any fetch after creation observes Processed.
        refund.state = GatewayRefundState::Processed;
        Ok(refund.clone())
    }

    fn gateway_name(&self) -> &str {
        "MockGateway"
    }
}
