//! Orchestrator error type, aggregating the failure modes of every
//! collaborator it coordinates.

use thiserror::Error;

use karigar_billing::BillingError;
use karigar_core::BookingId;
use karigar_gateway::{GatewayError, WebhookError};
use karigar_ledger::LedgerError;
use karigar_state::StateError;
use karigar_wallet::WalletError;

/// Errors from booking orchestration.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The referenced booking does not exist.
    #[error("booking not found: {booking_id}")]
    BookingNotFound {
        /// The booking looked up.
        booking_id: BookingId,
    },

    /// A structurally illegal transition or wrong-state operation.
    #[error(transparent)]
    State(#[from] StateError),

    /// A structurally legal transition whose precondition failed.
    #[error("transition gate not satisfied ({gate}): {reason}")]
    GateNotSatisfied {
        /// Which gate: `"presence"` or `"payment"`.
        gate: &'static str,
        /// What was missing or mismatched.
        reason: String,
    },

    /// A final payment intent was requested before the partner entered
    /// the service charge.
    #[error("service charge not set for booking {booking_id}")]
    ServiceChargeNotSet {
        /// The booking missing its charge.
        booking_id: BookingId,
    },

    /// The request was malformed before any state was touched.
    #[error("invalid request: {reason}")]
    Validation {
        /// What was wrong.
        reason: String,
    },

    /// The payment gateway call failed.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// A ledger operation failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// A wallet operation failed.
    #[error(transparent)]
    Wallet(#[from] WalletError),

    /// Invoice computation failed.
    #[error(transparent)]
    Billing(#[from] BillingError),

    /// Webhook verification or parsing failed.
    #[error(transparent)]
    Webhook(#[from] WebhookError),
}
