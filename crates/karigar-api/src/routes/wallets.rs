//! # Partner Wallet API
//!
//! Balances, withdrawals, hold release, and administrative deductions.
//! All wallet operations are local (no gateway I/O).

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use karigar_core::PartnerId;
use karigar_wallet::{WalletAccount, WalletTransaction};

use crate::db;
use crate::error::AppError;
use crate::state::AppState;

/// Wallet routes under `/v1/wallets`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/wallets/:partner_id", get(get_wallet))
        .route("/v1/wallets/:partner_id/withdraw", post(withdraw))
        .route("/v1/wallets/:partner_id/release-hold", post(release_hold))
        .route("/v1/wallets/:partner_id/deduct", post(deduct))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WithdrawBody {
    /// Amount to pay out, minor units.
    pub amount_minor: i64,
    /// Payout method (e.g. `bank_transfer`).
    pub method: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReleaseHoldBody {
    /// Matured amount to move into the available balance, minor units.
    pub amount_minor: i64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeductBody {
    /// Amount to deduct, minor units.
    pub amount_minor: i64,
    /// Mandatory non-empty reason.
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct WalletResponse {
    pub account: WalletAccount,
    pub transactions: Vec<WalletTransaction>,
}

async fn get_wallet(
    State(state): State<AppState>,
    Path(partner_id): Path<Uuid>,
) -> Result<Json<WalletResponse>, AppError> {
    let partner = PartnerId(partner_id);
    let account = state
        .orchestrator
        .wallet()
        .account(&partner)
        .ok_or_else(|| AppError::NotFound(format!("no wallet for partner {partner}")))?;
    let transactions = state.orchestrator.wallet().transactions_for_partner(&partner);
    Ok(Json(WalletResponse {
        account,
        transactions,
    }))
}

async fn withdraw(
    State(state): State<AppState>,
    Path(partner_id): Path<Uuid>,
    Json(body): Json<WithdrawBody>,
) -> Result<Json<WalletTransaction>, AppError> {
    let partner = PartnerId(partner_id);
    let txn = state
        .orchestrator
        .wallet()
        .withdraw(partner, body.amount_minor, &body.method)?;
    persist_wallet(&state, partner).await;
    Ok(Json(txn))
}

async fn release_hold(
    State(state): State<AppState>,
    Path(partner_id): Path<Uuid>,
    Json(body): Json<ReleaseHoldBody>,
) -> Result<Json<WalletTransaction>, AppError> {
    let partner = PartnerId(partner_id);
    let txn = state
        .orchestrator
        .wallet()
        .move_hold_to_available(partner, body.amount_minor)?;
    persist_wallet(&state, partner).await;
    Ok(Json(txn))
}

async fn deduct(
    State(state): State<AppState>,
    Path(partner_id): Path<Uuid>,
    Json(body): Json<DeductBody>,
) -> Result<Json<WalletTransaction>, AppError> {
    let partner = PartnerId(partner_id);
    let txn = state
        .orchestrator
        .wallet()
        .deduct(partner, body.amount_minor, &body.reason)?;
    persist_wallet(&state, partner).await;
    Ok(Json(txn))
}

async fn persist_wallet(state: &AppState, partner: PartnerId) {
    let Some(pool) = &state.db_pool else {
        return;
    };
    if let Some(account) = state.orchestrator.wallet().account(&partner) {
        if let Err(e) = db::wallets::save_account(pool, &account).await {
            tracing::warn!(partner_id = %partner, error = %e, "wallet write-through failed");
        }
    }
    for txn in state.orchestrator.wallet().transactions_for_partner(&partner) {
        if let Err(e) = db::wallets::save_transaction(pool, &txn).await {
            tracing::warn!(txn_id = %txn.txn_id, error = %e, "wallet txn write-through failed");
        }
    }
}
