//! # The Wallet Service
//!
//! All wallet mutations are serialized behind one write lock, so a
//! concurrent withdrawal can never observe a stale available balance. Each
//! mutation appends a [`WalletTransaction`] in the same critical section
//! that updates the account.

use parking_lot::RwLock;
use std::collections::HashMap;
use thiserror::Error;

use karigar_core::{BookingId, PartnerId, Timestamp, WalletTxnId};

use crate::account::{WalletAccount, WalletTransaction, WalletTxnKind};

/// Wallet policy knobs.
#[derive(Debug, Clone)]
pub struct WalletConfig {
    /// Smallest withdrawal the service accepts, in minor units.
    pub min_withdrawal_minor: i64,
    /// Days a completion credit stays in hold before release.
    pub hold_period_days: u32,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            min_withdrawal_minor: 50_000,
            hold_period_days: 7,
        }
    }
}

/// Errors from wallet operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    /// Amounts must be strictly positive.
    #[error("wallet amount must be positive, got {amount_minor}")]
    NonPositiveAmount {
        /// The rejected amount.
        amount_minor: i64,
    },

    /// No wallet exists for this partner yet.
    #[error("no wallet for partner {partner_id}")]
    UnknownPartner {
        /// The partner looked up.
        partner_id: PartnerId,
    },

    /// The available balance does not cover the request.
    #[error("insufficient balance: available {available_minor}, requested {requested_minor}")]
    InsufficientBalance {
        /// Withdrawable balance at the time of the request.
        available_minor: i64,
        /// The requested amount.
        requested_minor: i64,
    },

    /// The hold balance does not cover the release.
    #[error("insufficient hold: held {held_minor}, requested {requested_minor}")]
    InsufficientHold {
        /// Held balance at the time of the request.
        held_minor: i64,
        /// The requested amount.
        requested_minor: i64,
    },

    /// The withdrawal is under the configured minimum.
    #[error("withdrawal below minimum: minimum {minimum_minor}, requested {requested_minor}")]
    BelowMinimum {
        /// The configured minimum.
        minimum_minor: i64,
        /// The requested amount.
        requested_minor: i64,
    },

    /// Administrative deductions require a non-empty reason.
    #[error("deduction requires a non-empty reason")]
    MissingReason,
}

/// Outcome of an idempotent completion credit.
#[derive(Debug, Clone)]
pub enum Credited {
    /// The credit was new; the returned transaction was just committed.
    Created(WalletTransaction),
    /// This booking already credited this partner; the original
    /// transaction is returned unchanged.
    Duplicate(WalletTransaction),
}

impl Credited {
    /// The underlying transaction, new or original.
    pub fn transaction(&self) -> &WalletTransaction {
        match self {
            Self::Created(txn) | Self::Duplicate(txn) => txn,
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    accounts: HashMap<PartnerId, WalletAccount>,
    transactions: Vec<WalletTransaction>,
}

/// Serialized wallet mutations for every partner.
#[derive(Debug)]
pub struct WalletService {
    config: WalletConfig,
    inner: RwLock<Inner>,
}

impl WalletService {
    /// Create a service with the given policy.
    pub fn new(config: WalletConfig) -> Self {
        Self {
            config,
            inner: RwLock::new(Inner::default()),
        }
    }

    /// The configured hold period in days.
    pub fn hold_period_days(&self) -> u32 {
        self.config.hold_period_days
    }

    /// Credit a partner's hold balance for a completed booking.
    ///
    /// Idempotent on (partner, booking): a second call for the same pair
    /// returns [`Credited::Duplicate`] with the original transaction and
    /// changes nothing.
    pub fn credit(
        &self,
        partner_id: PartnerId,
        amount_minor: i64,
        booking_id: BookingId,
    ) -> Result<Credited, WalletError> {
        if amount_minor <= 0 {
            return Err(WalletError::NonPositiveAmount { amount_minor });
        }
        let mut inner = self.inner.write();
        if let Some(existing) = inner.transactions.iter().find(|t| {
            t.kind == WalletTxnKind::CompletionCredit
                && t.partner_id == partner_id
                && t.booking_id == Some(booking_id)
        }) {
            return Ok(Credited::Duplicate(existing.clone()));
        }

        let account = inner
            .accounts
            .entry(partner_id)
            .or_insert_with(|| WalletAccount::new(partner_id));
        let hold_before = account.balance_hold;
        let available_before = account.balance_available;
        account.balance_hold += amount_minor;
        account.total_earned += amount_minor;
        account.updated_at = Timestamp::now();
        let txn = WalletTransaction {
            txn_id: WalletTxnId::new(),
            partner_id,
            booking_id: Some(booking_id),
            kind: WalletTxnKind::CompletionCredit,
            amount_minor,
            hold_before,
            hold_after: account.balance_hold,
            available_before,
            available_after: available_before,
            reason: None,
            method: None,
            created_at: Timestamp::now(),
        };
        inner.transactions.push(txn.clone());
        Ok(Credited::Created(txn))
    }

    /// Move matured earnings from hold to available.
    pub fn move_hold_to_available(
        &self,
        partner_id: PartnerId,
        amount_minor: i64,
    ) -> Result<WalletTransaction, WalletError> {
        if amount_minor <= 0 {
            return Err(WalletError::NonPositiveAmount { amount_minor });
        }
        let mut inner = self.inner.write();
        let account = inner
            .accounts
            .get_mut(&partner_id)
            .ok_or(WalletError::UnknownPartner { partner_id })?;
        if amount_minor > account.balance_hold {
            return Err(WalletError::InsufficientHold {
                held_minor: account.balance_hold,
                requested_minor: amount_minor,
            });
        }
        let hold_before = account.balance_hold;
        let available_before = account.balance_available;
        account.balance_hold -= amount_minor;
        account.balance_available += amount_minor;
        account.updated_at = Timestamp::now();
        let txn = WalletTransaction {
            txn_id: WalletTxnId::new(),
            partner_id,
            booking_id: None,
            kind: WalletTxnKind::HoldRelease,
            amount_minor,
            hold_before,
            hold_after: account.balance_hold,
            available_before,
            available_after: account.balance_available,
            reason: None,
            method: None,
            created_at: Timestamp::now(),
        };
        inner.transactions.push(txn.clone());
        Ok(txn)
    }

    /// Pay out from the available balance.
    pub fn withdraw(
        &self,
        partner_id: PartnerId,
        amount_minor: i64,
        method: &str,
    ) -> Result<WalletTransaction, WalletError> {
        if amount_minor <= 0 {
            return Err(WalletError::NonPositiveAmount { amount_minor });
        }
        if amount_minor < self.config.min_withdrawal_minor {
            return Err(WalletError::BelowMinimum {
                minimum_minor: self.config.min_withdrawal_minor,
                requested_minor: amount_minor,
            });
        }
        let mut inner = self.inner.write();
        let account = inner
            .accounts
            .get_mut(&partner_id)
            .ok_or(WalletError::UnknownPartner { partner_id })?;
        if amount_minor > account.balance_available {
            return Err(WalletError::InsufficientBalance {
                available_minor: account.balance_available,
                requested_minor: amount_minor,
            });
        }
        let hold_before = account.balance_hold;
        let available_before = account.balance_available;
        account.balance_available -= amount_minor;
        account.total_withdrawn += amount_minor;
        account.updated_at = Timestamp::now();
        let txn = WalletTransaction {
            txn_id: WalletTxnId::new(),
            partner_id,
            booking_id: None,
            kind: WalletTxnKind::Withdrawal,
            amount_minor,
            hold_before,
            hold_after: hold_before,
            available_before,
            available_after: account.balance_available,
            reason: None,
            method: Some(method.to_string()),
            created_at: Timestamp::now(),
        };
        inner.transactions.push(txn.clone());
        Ok(txn)
    }

    /// Administrative deduction from the available balance. Requires a
    /// non-empty reason; counts into `total_withdrawn`.
    pub fn deduct(
        &self,
        partner_id: PartnerId,
        amount_minor: i64,
        reason: &str,
    ) -> Result<WalletTransaction, WalletError> {
        if amount_minor <= 0 {
            return Err(WalletError::NonPositiveAmount { amount_minor });
        }
        if reason.trim().is_empty() {
            return Err(WalletError::MissingReason);
        }
        let mut inner = self.inner.write();
        let account = inner
            .accounts
            .get_mut(&partner_id)
            .ok_or(WalletError::UnknownPartner { partner_id })?;
        if amount_minor > account.balance_available {
            return Err(WalletError::InsufficientBalance {
                available_minor: account.balance_available,
                requested_minor: amount_minor,
            });
        }
        let hold_before = account.balance_hold;
        let available_before = account.balance_available;
        account.balance_available -= amount_minor;
        account.total_withdrawn += amount_minor;
        account.updated_at = Timestamp::now();
        let txn = WalletTransaction {
            txn_id: WalletTxnId::new(),
            partner_id,
            booking_id: None,
            kind: WalletTxnKind::Deduction,
            amount_minor,
            hold_before,
            hold_after: hold_before,
            available_before,
            available_after: account.balance_available,
            reason: Some(reason.to_string()),
            method: None,
            created_at: Timestamp::now(),
        };
        inner.transactions.push(txn.clone());
        Ok(txn)
    }

    /// Account snapshot, if a wallet exists for the partner.
    pub fn account(&self, partner_id: &PartnerId) -> Option<WalletAccount> {
        self.inner.read().accounts.get(partner_id).cloned()
    }

    /// Transaction history for one partner, oldest first.
    pub fn transactions_for_partner(&self, partner_id: &PartnerId) -> Vec<WalletTransaction> {
        self.inner
            .read()
            .transactions
            .iter()
            .filter(|t| t.partner_id == *partner_id)
            .cloned()
            .collect()
    }

    /// Snapshot of every account, for persistence.
    pub fn all_accounts(&self) -> Vec<WalletAccount> {
        self.inner.read().accounts.values().cloned().collect()
    }

    /// Snapshot of every transaction, for persistence.
    pub fn all_transactions(&self) -> Vec<WalletTransaction> {
        self.inner.read().transactions.clone()
    }

    /// Rebuild wallet state from persisted rows at startup. Replaces the
    /// current contents; only meant for hydration of a freshly
    /// constructed service.
    pub fn restore(&self, accounts: Vec<WalletAccount>, transactions: Vec<WalletTransaction>) {
        let mut inner = self.inner.write();
        inner.accounts = accounts.into_iter().map(|a| (a.partner_id, a)).collect();
        inner.transactions = transactions;
    }
}

impl Default for WalletService {
    fn default() -> Self {
        Self::new(WalletConfig::default())
    }
}
