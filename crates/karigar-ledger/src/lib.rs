//! # karigar-ledger — Append-Only Payment Ledger
//!
//! The durable record of every payment lifecycle event: intent created,
//! captured, failed, refund initiated, refund processed. Entries are never
//! updated or deleted; the presence of a `Captured` entry for an intent is
//! the proof that a booking's payment gate was satisfied.
//!
//! The ledger is also the idempotency barrier for webhook processing.
//! Gateways deliver at-least-once: applying the same `captured` event
//! twice must produce exactly one `Captured` entry. [`PaymentLedger`]
//! enforces that with an existing-entry guard inside one critical section.

pub mod entry;
pub mod intent;
pub mod store;

pub use entry::{LedgerEntry, LedgerEventKind};
pub use intent::{IntentStatus, PaymentIntent, PaymentPurpose, Refund, RefundStatus};
pub use store::{Applied, LedgerError, PaymentLedger};
