//! # Notification Dispatch
//!
//! Fire-and-forget hooks invoked after a transition commits. Delivery is
//! best-effort and infallible from the orchestrator's point of view: a
//! sink that cannot deliver logs and swallows the failure. Notification
//! content and channels are out of scope; the sink only gets the facts.

use karigar_state::{Booking, TransitionRecord};

/// Receiver for post-commit booking events.
pub trait NotificationSink: Send + Sync {
    /// A transition committed. Called outside all orchestrator locks.
    fn booking_transitioned(&self, booking: &Booking, record: &TransitionRecord);
}

/// Discards every notification.
#[derive(Debug, Default)]
pub struct NoopSink;

impl NotificationSink for NoopSink {
    fn booking_transitioned(&self, _booking: &Booking, _record: &TransitionRecord) {}
}

/// Logs each transition at info level.
#[derive(Debug, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn booking_transitioned(&self, booking: &Booking, record: &TransitionRecord) {
        tracing::info!(
            booking_id = %booking.id,
            from = %record.from_state,
            to = %record.to_state,
            actor = %record.actor,
            forced = record.forced,
            "booking transitioned"
        );
    }
}

/// Captures notifications for assertions in tests.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: parking_lot::Mutex<Vec<(karigar_core::BookingId, karigar_state::BookingState)>>,
}

impl RecordingSink {
    /// The (booking, new state) pairs seen so far.
    pub fn events(&self) -> Vec<(karigar_core::BookingId, karigar_state::BookingState)> {
        self.events.lock().clone()
    }
}

impl NotificationSink for RecordingSink {
    fn booking_transitioned(&self, booking: &Booking, record: &TransitionRecord) {
        self.events.lock().push((booking.id, record.to_state));
    }
}
