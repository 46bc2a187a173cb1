//! # Ledger Entries
//!
//! Immutable audit records. The sequence number is assigned by the ledger
//! at append time and is strictly monotonic within a process lifetime;
//! nothing ever rewrites or removes an entry.

use serde::{Deserialize, Serialize};

use karigar_core::{BookingId, IntentId, PartnerId, Timestamp};

/// Payment lifecycle event types recorded in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerEventKind {
    /// A payment intent (gateway order) was created.
    IntentCreated,
    /// Payment for an intent was captured (webhook-verified).
    Captured,
    /// Payment for an intent failed.
    Failed,
    /// A refund was initiated against a captured intent.
    RefundInitiated,
    /// A refund settled back to the customer.
    RefundProcessed,
}

impl std::fmt::Display for LedgerEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::IntentCreated => "intent_created",
            Self::Captured => "captured",
            Self::Failed => "failed",
            Self::RefundInitiated => "refund_initiated",
            Self::RefundProcessed => "refund_processed",
        };
        f.write_str(s)
    }
}

/// One immutable audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Monotonic sequence number, assigned at append time.
    pub seq: u64,
    /// The booking the event belongs to.
    pub booking_id: BookingId,
    /// The partner involved, when known.
    pub partner_id: Option<PartnerId>,
    /// The payment intent the event refers to, when applicable.
    pub intent_id: Option<IntentId>,
    /// What happened.
    pub kind: LedgerEventKind,
    /// Event amount in minor units.
    pub amount_minor: i64,
    /// Raw gateway metadata as delivered (webhook payload, API response).
    pub metadata: serde_json::Value,
    /// When the entry was appended.
    pub recorded_at: Timestamp,
}
