//! # karigar-state — Booking Lifecycle State Machine
//!
//! Pure decision logic for the booking lifecycle plus the [`Booking`]
//! aggregate that records transitions.
//!
//! ## States and Transitions
//!
//! ```text
//! CREATED ──▶ ASSIGNED ──▶ ACCEPTED ──▶ IN_PROGRESS ──▶ COMPLETED
//!    │            │            │              │              │
//!    └────────────┴────────────┴──▶ CANCELLED └──────────────┴──▶ DISPUTED
//! ```
//!
//! `CANCELLED` and `DISPUTED` are terminal. Once work is `IN_PROGRESS`
//! cancellation is structurally impossible — a dispute is the only escape.
//!
//! ## Gates
//!
//! Two transitions carry preconditions that the orchestrator must verify
//! before committing:
//!
//! - `ACCEPTED → IN_PROGRESS` requires proof of presence (an OTP exchanged
//!   between customer and partner on-site).
//! - `IN_PROGRESS → COMPLETED` requires payment proof (a captured ledger
//!   entry for the booking's final payment intent).
//!
//! The predicates here only *name* the gates; checking them is the
//! orchestrator's job. Everything in [`machine`] is a pure lookup with no
//! side effects.

pub mod booking;
pub mod machine;

pub use booking::{Booking, TransitionRecord};
pub use machine::{
    allowed_targets, is_cancellable, is_transition_allowed, requires_payment_proof,
    requires_presence_proof, BookingState, StateError, ALL_STATES,
};
