//! # karigar-booking — Booking Orchestrator
//!
//! The [`BookingOrchestrator`] is the only component that writes booking
//! state. Every lifecycle change flows through it: structural validation
//! against the transition table, gate checks (OTP presence proof, captured
//! payment proof), completion side effects (invoice, wallet credit),
//! webhook-driven completion, and refunds.
//!
//! Collaborators are injected behind `Arc`s so the mock gateway and the
//! live HTTP adapter are interchangeable at construction time. Gateway
//! I/O never happens under a lock.

pub mod error;
pub mod notify;
pub mod orchestrator;
pub mod otp;

pub use error::OrchestratorError;
pub use notify::{NoopSink, NotificationSink, RecordingSink, TracingSink};
pub use orchestrator::{
    BookingOrchestrator, OrchestratorConfig, TransitionOutcome, TransitionRequest, WebhookOutcome,
};
pub use otp::OtpVault;
