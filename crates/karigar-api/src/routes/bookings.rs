//! # Booking Lifecycle API
//!
//! Creation, inspection, transitions (customer/partner and forced),
//! on-site OTP issuance, service charge entry, and payment intents.
//!
//! Gateway-touching handlers run the orchestrator call in
//! `spawn_blocking` because the gateway adapter trait is synchronous.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use karigar_billing::Invoice;
use karigar_booking::{TransitionOutcome, TransitionRequest};
use karigar_core::{BookingId, CustomerId, PartnerId};
use karigar_ledger::{PaymentIntent, PaymentPurpose};
use karigar_state::{Booking, BookingState, TransitionRecord};

use crate::db;
use crate::error::AppError;
use crate::state::AppState;

/// Booking routes under `/v1/bookings`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/bookings", post(create_booking))
        .route("/v1/bookings/:id", get(get_booking))
        .route("/v1/bookings/:id/transition", post(transition))
        .route("/v1/bookings/:id/force-transition", post(force_transition))
        .route("/v1/bookings/:id/service-charge", post(set_service_charge))
        .route("/v1/bookings/:id/intents", post(create_intent))
        .route("/v1/bookings/:id/otp", post(issue_otp))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateBookingRequest {
    /// The requesting customer.
    pub customer_id: Uuid,
    /// Deposit collected at creation, minor units.
    pub deposit_minor: i64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransitionBody {
    /// Target state.
    pub to_state: BookingState,
    /// Presence OTP, required for `ACCEPTED → IN_PROGRESS`.
    pub otp: Option<String>,
    /// Partner to attach, required for `CREATED → ASSIGNED`.
    pub partner_id: Option<Uuid>,
    /// Free-text reason for the transition log.
    pub reason: Option<String>,
    /// Requesting actor; defaults to `api`.
    pub actor: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ForceTransitionBody {
    /// Target state.
    pub to_state: BookingState,
    /// Mandatory override reason.
    pub reason: String,
    /// Administrative actor; defaults to `admin`.
    pub actor: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceChargeBody {
    /// The charge quoted on-site, minor units.
    pub amount_minor: i64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateIntentBody {
    /// What the intent collects: `deposit` or `final`.
    pub purpose: PaymentPurpose,
}

/// Booking snapshot plus the committed record and invoice, when present.
#[derive(Debug, Serialize)]
pub struct TransitionResponse {
    pub booking: Booking,
    pub record: TransitionRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice: Option<Invoice>,
}

impl From<TransitionOutcome> for TransitionResponse {
    fn from(outcome: TransitionOutcome) -> Self {
        Self {
            booking: outcome.booking,
            record: outcome.record,
            invoice: outcome.invoice,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OtpResponse {
    pub otp: String,
}

async fn create_booking(
    State(state): State<AppState>,
    Json(body): Json<CreateBookingRequest>,
) -> Result<Json<Booking>, AppError> {
    let booking = state
        .orchestrator
        .create_booking(CustomerId(body.customer_id), body.deposit_minor)?;
    db::persist_booking_bundle(&state.db_pool, &state.orchestrator, booking.id).await;
    Ok(Json(booking))
}

async fn get_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(state.orchestrator.booking(BookingId(id))?))
}

async fn transition(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<TransitionBody>,
) -> Result<Json<TransitionResponse>, AppError> {
    let booking_id = BookingId(id);
    let outcome = state.orchestrator.request_transition(
        booking_id,
        TransitionRequest {
            to: body.to_state,
            actor: body.actor.unwrap_or_else(|| "api".to_string()),
            otp: body.otp,
            partner_id: body.partner_id.map(PartnerId),
            reason: body.reason,
        },
    )?;
    db::persist_booking_bundle(&state.db_pool, &state.orchestrator, booking_id).await;
    Ok(Json(outcome.into()))
}

async fn force_transition(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<ForceTransitionBody>,
) -> Result<Json<TransitionResponse>, AppError> {
    let booking_id = BookingId(id);
    let outcome = state.orchestrator.force_transition(
        booking_id,
        body.to_state,
        body.actor.unwrap_or_else(|| "admin".to_string()),
        body.reason,
    )?;
    db::persist_booking_bundle(&state.db_pool, &state.orchestrator, booking_id).await;
    Ok(Json(outcome.into()))
}

async fn set_service_charge(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<ServiceChargeBody>,
) -> Result<Json<Booking>, AppError> {
    let booking_id = BookingId(id);
    let booking = state
        .orchestrator
        .set_service_charge(booking_id, body.amount_minor)?;
    db::persist_booking_bundle(&state.db_pool, &state.orchestrator, booking_id).await;
    Ok(Json(booking))
}

async fn create_intent(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<CreateIntentBody>,
) -> Result<Json<PaymentIntent>, AppError> {
    let booking_id = BookingId(id);
    let orchestrator = state.orchestrator.clone();
    let intent = tokio::task::spawn_blocking(move || {
        orchestrator.create_payment_intent(booking_id, body.purpose)
    })
    .await
    .map_err(|e| AppError::Internal(format!("intent task failed: {e}")))??;
    db::persist_booking_bundle(&state.db_pool, &state.orchestrator, booking_id).await;
    Ok(Json(intent))
}

async fn issue_otp(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<OtpResponse>, AppError> {
    let otp = state.orchestrator.issue_otp(BookingId(id))?;
    Ok(Json(OtpResponse { otp }))
}
