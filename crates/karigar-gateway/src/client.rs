//! # Gateway Client Trait and Wire Types
//!
//! The trait is sync and object-safe (`Send + Sync`) so implementations
//! can be shared across async tasks behind an `Arc<dyn PaymentGateway>`
//! and selected at runtime (mock vs. live).

use serde::{Deserialize, Serialize};
use std::fmt;

use karigar_core::{CurrencyCode, IntentId, RefundId};

/// Errors from payment gateway operations.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The gateway is unreachable or returned a 5xx status. Retryable.
    #[error("payment gateway unavailable: {reason}")]
    ServiceUnavailable {
        /// Human-readable description of the outage or error.
        reason: String,
    },

    /// The request to the gateway timed out. Retryable.
    #[error("payment gateway request timed out after {elapsed_ms}ms")]
    Timeout {
        /// Elapsed time in milliseconds before the timeout triggered.
        elapsed_ms: u64,
    },

    /// The gateway adapter has not been configured for this deployment.
    #[error("payment gateway not configured: {reason}")]
    NotConfigured {
        /// Why configuration is missing or incomplete.
        reason: String,
    },

    /// The gateway rejected the order creation request.
    #[error("order rejected by gateway: {reason}")]
    OrderRejected {
        /// Description of why the order was rejected.
        reason: String,
    },

    /// The gateway rejected the refund request.
    #[error("refund rejected by gateway: {reason}")]
    RefundRejected {
        /// Description of why the refund was rejected.
        reason: String,
    },

    /// The referenced refund was not found on the gateway.
    #[error("refund not found: {refund_id}")]
    RefundNotFound {
        /// The refund identifier that was looked up.
        refund_id: String,
    },
}

impl GatewayError {
    /// Whether the caller may retry the operation as-is.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ServiceUnavailable { .. } | Self::Timeout { .. })
    }
}

/// A gateway-side payment order, created to collect money for a booking.
///
/// The order id becomes the intent identifier in the payment ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayOrder {
    /// Gateway-assigned order identifier.
    pub order_id: IntentId,
    /// Requested amount in minor units.
    pub amount_minor: i64,
    /// Order currency.
    pub currency: CurrencyCode,
    /// Caller-supplied receipt reference (booking id + purpose).
    pub receipt: String,
}

/// Refund state as reported by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GatewayRefundState {
    /// Refund accepted by the gateway, not yet settled.
    Initiated,
    /// Refund settled back to the customer.
    Processed,
    /// Refund failed on the gateway side.
    Failed,
}

impl fmt::Display for GatewayRefundState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initiated => write!(f, "Initiated"),
            Self::Processed => write!(f, "Processed"),
            Self::Failed => write!(f, "Failed"),
        }
    }
}

/// A gateway-side refund record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayRefund {
    /// Gateway-assigned refund identifier.
    pub refund_id: RefundId,
    /// The order being refunded.
    pub order_id: IntentId,
    /// Refunded amount in minor units.
    pub amount_minor: i64,
    /// Current refund state.
    pub state: GatewayRefundState,
}

/// Client adapter for the external payment gateway.
///
/// Implementations must be `Send + Sync` so they can be shared across
/// async tasks behind an `Arc`. The trait is object-safe to support
/// runtime adapter selection (mock vs. live).
///
/// Network failures and 5xx responses surface as
/// [`GatewayError::ServiceUnavailable`] / [`GatewayError::Timeout`] and
/// never leave partially committed local state — callers persist only
/// after a successful return.
pub trait PaymentGateway: Send + Sync {
    /// Create a payment order for the given amount.
    ///
    /// `receipt` is an opaque caller reference echoed back by the gateway
    /// (we pass `"{booking_id}:{purpose}"`); it doubles as the idempotency
    /// key on the gateway side.
    fn create_order(
        &self,
        amount_minor: i64,
        currency: &CurrencyCode,
        receipt: &str,
    ) -> Result<GatewayOrder, GatewayError>;

    /// Request a (partial or full) refund against a captured order.
    fn create_refund(
        &self,
        order_id: &IntentId,
        amount_minor: i64,
        reason: &str,
    ) -> Result<GatewayRefund, GatewayError>;

    /// Poll the current state of a previously created refund.
    fn fetch_refund(&self, refund_id: &RefundId) -> Result<GatewayRefund, GatewayError>;

    /// Human-readable name of this adapter implementation
    /// (e.g. `"MockGateway"`, `"HttpPaymentGateway"`).
    fn gateway_name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(GatewayError::ServiceUnavailable {
            reason: "503".into()
        }
        .is_retryable());
        assert!(GatewayError::Timeout { elapsed_ms: 30_000 }.is_retryable());
        assert!(!GatewayError::OrderRejected {
            reason: "bad amount".into()
        }
        .is_retryable());
        assert!(!GatewayError::RefundNotFound {
            refund_id: "rfnd_1".into()
        }
        .is_retryable());
    }
}
