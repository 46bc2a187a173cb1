//! # Gateway Webhook Endpoint
//!
//! The body is taken as raw `Bytes` before any JSON parsing: the HMAC is
//! computed over the exact wire bytes, and re-serializing parsed JSON
//! would break the MAC. This route is mounted outside the bearer-auth
//! middleware; the signature is the authentication.
//!
//! Deliveries are at-least-once. A duplicate is acknowledged with 200 so
//! the gateway stops retrying.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;

use karigar_booking::WebhookOutcome;
use karigar_gateway::WebhookEvent;

use crate::db;
use crate::error::AppError;
use crate::state::AppState;

/// Signature header set by the gateway on each delivery.
pub const SIGNATURE_HEADER: &str = "X-Gateway-Signature";

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub status: &'static str,
}

/// POST /v1/webhooks/gateway
pub async fn gateway_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, AppError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized(format!("missing {SIGNATURE_HEADER} header")))?;

    let outcome = state.orchestrator.handle_webhook(&body, signature)?;

    // The event verified, so the body is trustworthy; use it to find the
    // booking whose rows need writing through.
    if outcome == WebhookOutcome::Applied {
        if let Ok(event) = serde_json::from_slice::<WebhookEvent>(&body) {
            if let Some(intent) = state.orchestrator.ledger().intent(&event.order_id) {
                db::persist_booking_bundle(&state.db_pool, &state.orchestrator, intent.booking_id)
                    .await;
            }
        }
    }

    let status = match outcome {
        WebhookOutcome::Applied => "applied",
        WebhookOutcome::Duplicate => "duplicate",
        WebhookOutcome::Ignored => "ignored",
    };
    Ok(Json(WebhookAck { status }))
}
