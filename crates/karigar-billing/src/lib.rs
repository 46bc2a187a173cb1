//! # karigar-billing — Invoice Computation
//!
//! Computes the tax-inclusive invoice for a completed booking. The
//! computation is a pure function of its inputs: same inputs, same
//! invoice, any number of times. Committing the result exactly once per
//! booking is the orchestrator's responsibility, not this crate's.
//!
//! All amounts are integer minor units; the tax is rounded half-up at the
//! minor-unit boundary through an `i128` intermediate so the arithmetic
//! cannot silently overflow.

pub mod invoice;

pub use invoice::{compute_invoice, BillingError, Invoice};
