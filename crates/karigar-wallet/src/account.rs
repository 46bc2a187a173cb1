//! # Wallet Account and Transaction Records

use serde::{Deserialize, Serialize};

use karigar_core::{BookingId, PartnerId, Timestamp, WalletTxnId};

/// A partner's wallet balances.
///
/// `total_earned` is monotonic; withdrawals and deductions count into
/// `total_withdrawn` rather than reducing it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletAccount {
    /// The partner this wallet belongs to.
    pub partner_id: PartnerId,
    /// Earnings still inside the maturity window, in minor units.
    pub balance_hold: i64,
    /// Withdrawable balance in minor units.
    pub balance_available: i64,
    /// Lifetime credited earnings in minor units.
    pub total_earned: i64,
    /// Lifetime withdrawals plus administrative deductions in minor units.
    pub total_withdrawn: i64,
    /// Last mutation.
    pub updated_at: Timestamp,
}

impl WalletAccount {
    /// A fresh zero-balance account.
    pub fn new(partner_id: PartnerId) -> Self {
        Self {
            partner_id,
            balance_hold: 0,
            balance_available: 0,
            total_earned: 0,
            total_withdrawn: 0,
            updated_at: Timestamp::now(),
        }
    }
}

/// What a wallet transaction did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalletTxnKind {
    /// Earnings credited into hold when a booking completed.
    CompletionCredit,
    /// Matured earnings moved from hold to available.
    HoldRelease,
    /// A payout from the available balance.
    Withdrawal,
    /// An administrative deduction from the available balance.
    Deduction,
}

impl std::fmt::Display for WalletTxnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::CompletionCredit => "completion_credit",
            Self::HoldRelease => "hold_release",
            Self::Withdrawal => "withdrawal",
            Self::Deduction => "deduction",
        };
        f.write_str(s)
    }
}

/// One immutable wallet mutation record.
///
/// Carries before/after snapshots of both balances so any transaction can
/// be audited in isolation: for each balance,
/// `after == before + signed delta` independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletTransaction {
    /// Transaction identifier.
    pub txn_id: WalletTxnId,
    /// The wallet mutated.
    pub partner_id: PartnerId,
    /// The booking that produced the mutation, for completion credits.
    pub booking_id: Option<BookingId>,
    /// What the mutation did.
    pub kind: WalletTxnKind,
    /// Unsigned mutation amount in minor units.
    pub amount_minor: i64,
    /// Hold balance before the mutation.
    pub hold_before: i64,
    /// Hold balance after the mutation.
    pub hold_after: i64,
    /// Available balance before the mutation.
    pub available_before: i64,
    /// Available balance after the mutation.
    pub available_after: i64,
    /// Operator-supplied reason, mandatory for deductions.
    pub reason: Option<String>,
    /// Payout method, set for withdrawals.
    pub method: Option<String>,
    /// When the mutation committed.
    pub created_at: Timestamp,
}
