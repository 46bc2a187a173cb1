//! # Payment Intent and Refund Records
//!
//! A [`PaymentIntent`] is one attempt to collect money for a booking,
//! keyed by the gateway-assigned order id. Its status is mutated only by
//! verified webhook events or refund settlement — and only through
//! [`crate::PaymentLedger`], which pairs every status change with an
//! appended entry. A failed intent is never reused; callers retry by
//! issuing a new intent.

use serde::{Deserialize, Serialize};

use karigar_core::{BookingId, CurrencyCode, IntentId, RefundId, Timestamp};

/// What a payment intent is collecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentPurpose {
    /// The deposit collected at booking creation.
    Deposit,
    /// The final payment for the completed work.
    Final,
}

impl std::fmt::Display for PaymentPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Deposit => write!(f, "deposit"),
            Self::Final => write!(f, "final"),
        }
    }
}

/// Lifecycle status of a payment intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentStatus {
    /// Order created, awaiting payment.
    Pending,
    /// Payment captured (webhook-verified).
    Captured,
    /// Payment failed.
    Failed,
    /// Captured amount has been refunded.
    Refunded,
}

impl std::fmt::Display for IntentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Captured => "captured",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
        };
        f.write_str(s)
    }
}

/// One attempt to collect money for a booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    /// Gateway-assigned order identifier.
    pub intent_id: IntentId,
    /// The booking this intent collects for.
    pub booking_id: BookingId,
    /// Deposit or final payment.
    pub purpose: PaymentPurpose,
    /// Requested amount in minor units.
    pub amount_minor: i64,
    /// Intent currency.
    pub currency: CurrencyCode,
    /// Current status.
    pub status: IntentStatus,
    /// When the intent was created locally.
    pub created_at: Timestamp,
    /// Last status change.
    pub updated_at: Timestamp,
}

impl PaymentIntent {
    /// Create a new intent in `Pending` status.
    pub fn new(
        intent_id: IntentId,
        booking_id: BookingId,
        purpose: PaymentPurpose,
        amount_minor: i64,
        currency: CurrencyCode,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            intent_id,
            booking_id,
            purpose,
            amount_minor,
            currency,
            status: IntentStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Settlement status of a refund.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefundStatus {
    /// Accepted by the gateway, not yet settled.
    Initiated,
    /// Settled back to the customer.
    Processed,
}

impl std::fmt::Display for RefundStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initiated => write!(f, "initiated"),
            Self::Processed => write!(f, "processed"),
        }
    }
}

/// A refund raised against a captured intent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Refund {
    /// Gateway-assigned refund identifier.
    pub refund_id: RefundId,
    /// The intent being refunded.
    pub intent_id: IntentId,
    /// Refunded amount in minor units.
    pub amount_minor: i64,
    /// Why the refund was raised.
    pub reason: String,
    /// Current settlement status.
    pub status: RefundStatus,
    /// When the refund was initiated locally.
    pub created_at: Timestamp,
}
