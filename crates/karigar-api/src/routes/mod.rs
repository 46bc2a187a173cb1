//! Route modules, one per API surface.

pub mod bookings;
pub mod refunds;
pub mod wallets;
pub mod webhooks;
