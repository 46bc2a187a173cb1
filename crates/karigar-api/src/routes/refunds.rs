//! # Refund API
//!
//! Initiation against a captured intent and status polling. Both touch
//! the gateway, so the orchestrator call runs in `spawn_blocking`.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use karigar_core::{IntentId, RefundId};
use karigar_ledger::Refund;

use crate::db;
use crate::error::AppError;
use crate::state::AppState;

/// Refund routes under `/v1/refunds`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/refunds", post(initiate_refund))
        .route("/v1/refunds/:refund_id", get(check_refund))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InitiateRefundBody {
    /// The captured intent to refund.
    pub intent_id: String,
    /// Refund amount, minor units.
    pub amount_minor: i64,
    /// Why the refund is being raised.
    pub reason: String,
}

async fn initiate_refund(
    State(state): State<AppState>,
    Json(body): Json<InitiateRefundBody>,
) -> Result<Json<Refund>, AppError> {
    let intent_id =
        IntentId::new(body.intent_id).map_err(|e| AppError::Validation(e.to_string()))?;
    let orchestrator = state.orchestrator.clone();
    let refund = tokio::task::spawn_blocking(move || {
        orchestrator.initiate_refund(&intent_id, body.amount_minor, &body.reason)
    })
    .await
    .map_err(|e| AppError::Internal(format!("refund task failed: {e}")))??;

    if let Some(pool) = &state.db_pool {
        if let Err(e) = db::ledger::save_refund(pool, &refund).await {
            tracing::warn!(refund_id = %refund.refund_id, error = %e, "refund write-through failed");
        }
    }
    Ok(Json(refund))
}

async fn check_refund(
    State(state): State<AppState>,
    Path(refund_id): Path<String>,
) -> Result<Json<Refund>, AppError> {
    let refund_id =
        RefundId::new(refund_id).map_err(|e| AppError::Validation(e.to_string()))?;
    let orchestrator = state.orchestrator.clone();
    let refund =
        tokio::task::spawn_blocking(move || orchestrator.check_refund_status(&refund_id))
            .await
            .map_err(|e| AppError::Internal(format!("refund task failed: {e}")))??;

    if let Some(pool) = &state.db_pool {
        if let Err(e) = db::ledger::save_refund(pool, &refund).await {
            tracing::warn!(refund_id = %refund.refund_id, error = %e, "refund write-through failed");
        }
    }
    Ok(Json(refund))
}
