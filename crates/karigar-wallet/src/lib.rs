//! # karigar-wallet — Partner Wallet
//!
//! Each partner has one wallet account split into a hold balance (earnings
//! inside the maturity window) and an available balance (withdrawable).
//! Balances are never mutated directly: every change goes through
//! [`WalletService`], which pairs each mutation with a
//! [`WalletTransaction`] carrying before/after snapshots of both balances.
//!
//! The account invariant is
//! `balance_hold + balance_available == total_earned - total_withdrawn`,
//! and `balance_available` never goes negative.

pub mod account;
pub mod service;

pub use account::{WalletAccount, WalletTransaction, WalletTxnKind};
pub use service::{Credited, WalletConfig, WalletError, WalletService};
