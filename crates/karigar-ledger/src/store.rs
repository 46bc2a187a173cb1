//! # The Payment Ledger Store
//!
//! In-memory ledger with interior mutability. Every mutation happens in
//! one critical section so an intent row and its paired entry commit
//! together, and the existing-entry idempotency guard cannot race a
//! concurrent redelivery.
//!
//! The public API is append-only: there is no way to update or delete an
//! entry through this type.

use parking_lot::RwLock;
use std::collections::HashMap;
use thiserror::Error;

use karigar_core::{BookingId, IntentId, PartnerId, RefundId, Timestamp};

use crate::entry::{LedgerEntry, LedgerEventKind};
use crate::intent::{IntentStatus, PaymentIntent, PaymentPurpose, Refund, RefundStatus};

/// Errors from ledger operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// An intent with this id is already recorded.
    #[error("payment intent already recorded: {intent_id}")]
    DuplicateIntent {
        /// The offending intent id.
        intent_id: String,
    },

    /// The referenced intent does not exist.
    #[error("unknown payment intent: {intent_id}")]
    UnknownIntent {
        /// The intent id that was looked up.
        intent_id: String,
    },

    /// The referenced refund does not exist.
    #[error("unknown refund: {refund_id}")]
    UnknownRefund {
        /// The refund id that was looked up.
        refund_id: String,
    },

    /// A refund was raised against an intent that is not captured.
    #[error("intent {intent_id} is {status}, refunds require captured")]
    NotCaptured {
        /// The intent id.
        intent_id: String,
        /// Its actual status.
        status: IntentStatus,
    },
}

/// Outcome of applying an event that may be a redelivery.
///
/// `Duplicate` is not an error: the gateway redelivered an event the
/// ledger already holds, and the caller should acknowledge it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The event was new and has been recorded.
    Applied,
    /// The event was already recorded; nothing changed.
    Duplicate,
}

#[derive(Debug, Default)]
struct Inner {
    next_seq: u64,
    entries: Vec<LedgerEntry>,
    intents: HashMap<IntentId, PaymentIntent>,
    refunds: HashMap<RefundId, Refund>,
}

impl Inner {
    fn append(
        &mut self,
        booking_id: BookingId,
        partner_id: Option<PartnerId>,
        intent_id: Option<IntentId>,
        kind: LedgerEventKind,
        amount_minor: i64,
        metadata: serde_json::Value,
    ) {
        self.next_seq += 1;
        self.entries.push(LedgerEntry {
            seq: self.next_seq,
            booking_id,
            partner_id,
            intent_id,
            kind,
            amount_minor,
            metadata,
            recorded_at: Timestamp::now(),
        });
    }

    fn has_entry(&self, intent_id: &IntentId, kind: LedgerEventKind) -> bool {
        self.entries
            .iter()
            .any(|e| e.kind == kind && e.intent_id.as_ref() == Some(intent_id))
    }
}

/// Append-only payment ledger with idempotency guards.
#[derive(Debug, Default)]
pub struct PaymentLedger {
    inner: RwLock<Inner>,
}

impl PaymentLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a freshly created intent and its `intent_created` entry in
    /// one local transaction.
    pub fn record_intent_created(
        &self,
        intent: PaymentIntent,
        metadata: serde_json::Value,
    ) -> Result<(), LedgerError> {
        let mut inner = self.inner.write();
        if inner.intents.contains_key(&intent.intent_id) {
            return Err(LedgerError::DuplicateIntent {
                intent_id: intent.intent_id.to_string(),
            });
        }
        inner.append(
            intent.booking_id,
            None,
            Some(intent.intent_id.clone()),
            LedgerEventKind::IntentCreated,
            intent.amount_minor,
            metadata,
        );
        inner.intents.insert(intent.intent_id.clone(), intent);
        Ok(())
    }

    /// Apply a verified `captured` webhook event.
    ///
    /// Idempotent under at-least-once delivery: if a `Captured` entry for
    /// this intent already exists, returns [`Applied::Duplicate`] without
    /// appending or touching the intent.
    pub fn apply_captured(
        &self,
        intent_id: &IntentId,
        amount_minor: i64,
        metadata: serde_json::Value,
    ) -> Result<Applied, LedgerError> {
        let mut inner = self.inner.write();
        if inner.has_entry(intent_id, LedgerEventKind::Captured) {
            return Ok(Applied::Duplicate);
        }
        let booking_id = {
            let intent = inner.intents.get_mut(intent_id).ok_or_else(|| {
                LedgerError::UnknownIntent {
                    intent_id: intent_id.to_string(),
                }
            })?;
            intent.status = IntentStatus::Captured;
            intent.updated_at = Timestamp::now();
            intent.booking_id
        };
        inner.append(
            booking_id,
            None,
            Some(intent_id.clone()),
            LedgerEventKind::Captured,
            amount_minor,
            metadata,
        );
        Ok(Applied::Applied)
    }

    /// Apply a verified `failed` webhook event.
    ///
    /// A `failed` arriving after a `captured` still appends its entry —
    /// the ledger keeps full history — and the intent status takes the
    /// last write. Failed intents are retried by issuing a new intent.
    pub fn apply_failed(
        &self,
        intent_id: &IntentId,
        amount_minor: i64,
        metadata: serde_json::Value,
    ) -> Result<Applied, LedgerError> {
        let mut inner = self.inner.write();
        if inner.has_entry(intent_id, LedgerEventKind::Failed) {
            return Ok(Applied::Duplicate);
        }
        let booking_id = {
            let intent = inner.intents.get_mut(intent_id).ok_or_else(|| {
                LedgerError::UnknownIntent {
                    intent_id: intent_id.to_string(),
                }
            })?;
            intent.status = IntentStatus::Failed;
            intent.updated_at = Timestamp::now();
            intent.booking_id
        };
        inner.append(
            booking_id,
            None,
            Some(intent_id.clone()),
            LedgerEventKind::Failed,
            amount_minor,
            metadata,
        );
        Ok(Applied::Applied)
    }

    /// Record a refund accepted by the gateway, with its
    /// `refund_initiated` entry.
    pub fn record_refund_initiated(
        &self,
        refund: Refund,
        metadata: serde_json::Value,
    ) -> Result<(), LedgerError> {
        let mut inner = self.inner.write();
        let intent = inner.intents.get(&refund.intent_id).ok_or_else(|| {
            LedgerError::UnknownIntent {
                intent_id: refund.intent_id.to_string(),
            }
        })?;
        if intent.status != IntentStatus::Captured {
            return Err(LedgerError::NotCaptured {
                intent_id: refund.intent_id.to_string(),
                status: intent.status,
            });
        }
        let booking_id = intent.booking_id;
        inner.append(
            booking_id,
            None,
            Some(refund.intent_id.clone()),
            LedgerEventKind::RefundInitiated,
            refund.amount_minor,
            metadata,
        );
        inner.refunds.insert(refund.refund_id.clone(), refund);
        Ok(())
    }

    /// Mark a refund settled, guarded so an already-processed refund is
    /// never re-applied. Sets the intent status to `Refunded`.
    pub fn mark_refund_processed(
        &self,
        refund_id: &RefundId,
        metadata: serde_json::Value,
    ) -> Result<Applied, LedgerError> {
        let mut inner = self.inner.write();
        let (intent_id, amount) = {
            let refund =
                inner
                    .refunds
                    .get_mut(refund_id)
                    .ok_or_else(|| LedgerError::UnknownRefund {
                        refund_id: refund_id.to_string(),
                    })?;
            if refund.status == RefundStatus::Processed {
                return Ok(Applied::Duplicate);
            }
            refund.status = RefundStatus::Processed;
            (refund.intent_id.clone(), refund.amount_minor)
        };
        let booking_id = {
            let intent = inner.intents.get_mut(&intent_id).ok_or_else(|| {
                LedgerError::UnknownIntent {
                    intent_id: intent_id.to_string(),
                }
            })?;
            intent.status = IntentStatus::Refunded;
            intent.updated_at = Timestamp::now();
            intent.booking_id
        };
        inner.append(
            booking_id,
            None,
            Some(intent_id),
            LedgerEventKind::RefundProcessed,
            amount,
            metadata,
        );
        Ok(Applied::Applied)
    }

    /// Whether a `Captured` entry exists for this intent — the durable
    /// proof that a payment gate was satisfied.
    pub fn has_captured(&self, intent_id: &IntentId) -> bool {
        self.inner
            .read()
            .has_entry(intent_id, LedgerEventKind::Captured)
    }

    /// Look up an intent by id.
    pub fn intent(&self, intent_id: &IntentId) -> Option<PaymentIntent> {
        self.inner.read().intents.get(intent_id).cloned()
    }

    /// The most recent `Final`-purpose intent for a booking, if any.
    pub fn final_intent(&self, booking_id: &BookingId) -> Option<PaymentIntent> {
        let inner = self.inner.read();
        inner
            .intents
            .values()
            .filter(|i| i.booking_id == *booking_id && i.purpose == PaymentPurpose::Final)
            .max_by_key(|i| i.created_at)
            .cloned()
    }

    /// A booking's `Final` intent that has a `Captured` entry, if any.
    pub fn captured_final_intent(&self, booking_id: &BookingId) -> Option<PaymentIntent> {
        let inner = self.inner.read();
        inner
            .intents
            .values()
            .filter(|i| i.booking_id == *booking_id && i.purpose == PaymentPurpose::Final)
            .find(|i| inner.has_entry(&i.intent_id, LedgerEventKind::Captured))
            .cloned()
    }

    /// Look up a refund by id.
    pub fn refund(&self, refund_id: &RefundId) -> Option<Refund> {
        self.inner.read().refunds.get(refund_id).cloned()
    }

    /// All entries for a booking, in sequence order.
    pub fn entries_for_booking(&self, booking_id: &BookingId) -> Vec<LedgerEntry> {
        self.inner
            .read()
            .entries
            .iter()
            .filter(|e| e.booking_id == *booking_id)
            .cloned()
            .collect()
    }

    /// Total number of entries (all bookings).
    pub fn entry_count(&self) -> usize {
        self.inner.read().entries.len()
    }

    /// Snapshot of every entry, for persistence and audit export.
    pub fn all_entries(&self) -> Vec<LedgerEntry> {
        self.inner.read().entries.clone()
    }

    /// Snapshot of every intent, for persistence.
    pub fn all_intents(&self) -> Vec<PaymentIntent> {
        self.inner.read().intents.values().cloned().collect()
    }

    /// Snapshot of every refund, for persistence.
    pub fn all_refunds(&self) -> Vec<Refund> {
        self.inner.read().refunds.values().cloned().collect()
    }

    /// Rebuild the ledger from persisted rows at startup.
    ///
    /// Replaces the current contents; only meant for hydration of a
    /// freshly constructed ledger. The sequence counter resumes past the
    /// highest persisted entry.
    pub fn restore(
        &self,
        entries: Vec<LedgerEntry>,
        intents: Vec<PaymentIntent>,
        refunds: Vec<Refund>,
    ) {
        let mut inner = self.inner.write();
        inner.next_seq = entries.iter().map(|e| e.seq).max().unwrap_or(0);
        inner.entries = entries;
        inner.intents = intents
            .into_iter()
            .map(|i| (i.intent_id.clone(), i))
            .collect();
        inner.refunds = refunds
            .into_iter()
            .map(|r| (r.refund_id.clone(), r))
            .collect();
    }
}
