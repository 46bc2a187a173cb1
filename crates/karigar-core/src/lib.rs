//! # karigar-core — Foundational Types for the Karigar Back End
//!
//! Leaf crate of the workspace: every other `karigar-*` crate depends on
//! this one, and it depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** `BookingId`, `CustomerId`,
//!    `PartnerId`, `IntentId`, `RefundId` — no bare strings or UUIDs for
//!    identifiers, so a partner id can never be passed where a booking id
//!    is expected.
//!
//! 2. **Money is integer minor units.** All amounts are `i64` in the
//!    smallest currency unit (paise for PKR/INR, cents for USD). There are
//!    no floats anywhere in the money path; arithmetic goes through the
//!    checked helpers in [`money`].
//!
//! 3. **UTC-only timestamps.** [`Timestamp`] enforces UTC with Z suffix at
//!    seconds precision. Non-UTC offsets are rejected at parse time.
//!
//! ## Crate Policy
//!
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - All public types derive `Debug`, `Clone`, and implement
//!   `Serialize`/`Deserialize`.

pub mod error;
pub mod identity;
pub mod money;
pub mod temporal;

pub use error::CoreError;
pub use identity::{BookingId, CustomerId, IntentId, PartnerId, RefundId, WalletTxnId};
pub use money::{checked_add_minor, checked_sub_minor, CurrencyCode};
pub use temporal::Timestamp;
