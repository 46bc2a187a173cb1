//! # The Booking Orchestrator
//!
//! Sole writer of booking state. Per-booking mutexes serialize concurrent
//! transitions; the loser re-validates against the new state and fails
//! with `IllegalTransition`. Lock order is booking then wallet, and the
//! gateway is never called while any lock is held.

use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;

use karigar_billing::{compute_invoice, Invoice};
use karigar_core::{BookingId, CurrencyCode, CustomerId, IntentId, PartnerId, RefundId, Timestamp};
use karigar_gateway::{PaymentGateway, WebhookEventKind, WebhookVerifier};
use karigar_ledger::{Applied, PaymentIntent, PaymentLedger, PaymentPurpose, Refund, RefundStatus};
use karigar_state::{
    is_transition_allowed, requires_payment_proof, requires_presence_proof, Booking, BookingState,
    StateError, TransitionRecord,
};
use karigar_wallet::{Credited, WalletService};

use crate::error::OrchestratorError;
use crate::notify::NotificationSink;
use crate::otp::OtpVault;

/// Orchestrator policy knobs.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Tax rate applied to invoices, whole percent.
    pub tax_rate_percent: u32,
    /// Currency for all bookings this deployment serves.
    pub currency: CurrencyCode,
}

/// A requested state transition with its proof material.
#[derive(Debug, Clone)]
pub struct TransitionRequest {
    /// Target state.
    pub to: BookingState,
    /// Who is requesting (customer id, partner id, `admin:<name>`,
    /// or `gateway-webhook`).
    pub actor: String,
    /// Presence proof for the `ACCEPTED → IN_PROGRESS` gate.
    pub otp: Option<String>,
    /// The partner to attach when transitioning to `ASSIGNED`.
    pub partner_id: Option<PartnerId>,
    /// Free-text reason, recorded in the transition log.
    pub reason: Option<String>,
}

/// Result of a committed transition.
#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    /// Snapshot of the booking after the commit.
    pub booking: Booking,
    /// The appended transition record.
    pub record: TransitionRecord,
    /// The invoice, present when this commit completed the booking.
    pub invoice: Option<Invoice>,
}

/// What a verified webhook delivery did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// The event was new and has been applied.
    Applied,
    /// The event was already applied; acknowledged without side effects.
    Duplicate,
    /// The event referenced an unknown intent; logged and acknowledged.
    Ignored,
}

/// Coordinates the booking lifecycle end to end.
pub struct BookingOrchestrator {
    config: OrchestratorConfig,
    bookings: RwLock<HashMap<BookingId, Arc<Mutex<Booking>>>>,
    invoices: Mutex<HashMap<BookingId, Invoice>>,
    ledger: Arc<PaymentLedger>,
    wallet: Arc<WalletService>,
    gateway: Arc<dyn PaymentGateway>,
    notifier: Arc<dyn NotificationSink>,
    verifier: WebhookVerifier,
    otp: OtpVault,
}

impl BookingOrchestrator {
    /// Wire up an orchestrator with its collaborators.
    pub fn new(
        config: OrchestratorConfig,
        ledger: Arc<PaymentLedger>,
        wallet: Arc<WalletService>,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn NotificationSink>,
        verifier: WebhookVerifier,
    ) -> Self {
        Self {
            config,
            bookings: RwLock::new(HashMap::new()),
            invoices: Mutex::new(HashMap::new()),
            ledger,
            wallet,
            gateway,
            notifier,
            verifier,
            otp: OtpVault::default(),
        }
    }

    /// The ledger shared with this orchestrator.
    pub fn ledger(&self) -> &Arc<PaymentLedger> {
        &self.ledger
    }

    /// The wallet service shared with this orchestrator.
    pub fn wallet(&self) -> &Arc<WalletService> {
        &self.wallet
    }

    /// Create a booking in `CREATED` state.
    pub fn create_booking(
        &self,
        customer: CustomerId,
        deposit_minor: i64,
    ) -> Result<Booking, OrchestratorError> {
        if deposit_minor <= 0 {
            return Err(OrchestratorError::Validation {
                reason: format!("deposit must be positive, got {deposit_minor}"),
            });
        }
        let booking = Booking::new(
            BookingId::new(),
            customer,
            self.config.currency.clone(),
            deposit_minor,
        );
        let snapshot = booking.clone();
        self.bookings
            .write()
            .insert(booking.id, Arc::new(Mutex::new(booking)));
        tracing::info!(booking_id = %snapshot.id, deposit_minor, "booking created");
        Ok(snapshot)
    }

    /// Insert a persisted booking at startup, preserving its state and
    /// transition log. Replaces any in-memory booking with the same id.
    pub fn restore_booking(&self, booking: Booking) {
        self.bookings
            .write()
            .insert(booking.id, Arc::new(Mutex::new(booking)));
    }

    /// Snapshot of a booking with its transition log.
    pub fn booking(&self, booking_id: BookingId) -> Result<Booking, OrchestratorError> {
        let cell = self.booking_cell(booking_id)?;
        let booking = cell.lock();
        Ok(booking.clone())
    }

    /// The committed invoice for a booking, if completion has run.
    pub fn invoice(&self, booking_id: BookingId) -> Option<Invoice> {
        self.invoices.lock().get(&booking_id).cloned()
    }

    /// Issue a presence OTP to the customer. Legal while `ACCEPTED`.
    pub fn issue_otp(&self, booking_id: BookingId) -> Result<String, OrchestratorError> {
        let cell = self.booking_cell(booking_id)?;
        let state = cell.lock().state();
        if state != BookingState::Accepted {
            return Err(StateError::WrongState {
                state,
                operation: "issue_otp",
            }
            .into());
        }
        Ok(self.otp.issue(booking_id))
    }

    /// Record the service charge quoted by the partner on-site.
    pub fn set_service_charge(
        &self,
        booking_id: BookingId,
        amount_minor: i64,
    ) -> Result<Booking, OrchestratorError> {
        if amount_minor <= 0 {
            return Err(OrchestratorError::Validation {
                reason: format!("service charge must be positive, got {amount_minor}"),
            });
        }
        let cell = self.booking_cell(booking_id)?;
        let mut booking = cell.lock();
        booking.set_service_charge(amount_minor)?;
        Ok(booking.clone())
    }

    /// Create a payment intent for a booking.
    ///
    /// The gateway is called without holding the booking lock; the intent
    /// and its `IntentCreated` entry are recorded only after the gateway
    /// accepts the order, so a gateway failure leaves no local state.
    pub fn create_payment_intent(
        &self,
        booking_id: BookingId,
        purpose: PaymentPurpose,
    ) -> Result<PaymentIntent, OrchestratorError> {
        let (amount, currency) = {
            let cell = self.booking_cell(booking_id)?;
            let booking = cell.lock();
            let amount = match purpose {
                PaymentPurpose::Deposit => booking.deposit_minor,
                PaymentPurpose::Final => {
                    let charge = booking.service_charge_minor.ok_or(
                        OrchestratorError::ServiceChargeNotSet { booking_id },
                    )?;
                    let invoice = compute_invoice(
                        booking_id,
                        booking.deposit_minor,
                        charge,
                        self.config.tax_rate_percent,
                        booking.deposit_minor,
                        booking.currency.clone(),
                    )?;
                    invoice.amount_due_minor
                }
            };
            (amount, booking.currency.clone())
        };

        let receipt = format!("{booking_id}:{purpose}");
        let order = self.gateway.create_order(amount, &currency, &receipt)?;

        let intent = PaymentIntent::new(order.order_id.clone(), booking_id, purpose, amount, currency);
        let metadata = serde_json::json!({
            "gateway": self.gateway.gateway_name(),
            "receipt": order.receipt,
        });
        self.ledger.record_intent_created(intent.clone(), metadata)?;
        tracing::info!(
            booking_id = %booking_id,
            intent_id = %intent.intent_id,
            purpose = %purpose,
            amount_minor = amount,
            "payment intent created"
        );
        Ok(intent)
    }

    /// Request a state transition, enforcing gates.
    pub fn request_transition(
        &self,
        booking_id: BookingId,
        request: TransitionRequest,
    ) -> Result<TransitionOutcome, OrchestratorError> {
        self.transition(booking_id, request, false)
    }

    /// Administrative override: bypasses gate checks only. The transition
    /// must still be structurally legal, and a non-empty reason is
    /// mandatory.
    pub fn force_transition(
        &self,
        booking_id: BookingId,
        to: BookingState,
        actor: impl Into<String>,
        reason: impl Into<String>,
    ) -> Result<TransitionOutcome, OrchestratorError> {
        let reason = reason.into();
        if reason.trim().is_empty() {
            return Err(OrchestratorError::Validation {
                reason: "forced transitions require a non-empty reason".into(),
            });
        }
        self.transition(
            booking_id,
            TransitionRequest {
                to,
                actor: actor.into(),
                otp: None,
                partner_id: None,
                reason: Some(reason),
            },
            true,
        )
    }

    fn transition(
        &self,
        booking_id: BookingId,
        request: TransitionRequest,
        forced: bool,
    ) -> Result<TransitionOutcome, OrchestratorError> {
        let cell = self.booking_cell(booking_id)?;
        let mut booking = cell.lock();
        let from = booking.state();
        let to = request.to;

        if !is_transition_allowed(from, to) {
            return Err(StateError::IllegalTransition { from, to }.into());
        }
        if !forced {
            self.check_gates(&booking, from, to, request.otp.as_deref())?;
        }
        if to == BookingState::Assigned {
            if let Some(partner) = request.partner_id {
                booking.set_partner(partner)?;
            } else if !forced {
                return Err(OrchestratorError::Validation {
                    reason: "partner_id is required to assign a booking".into(),
                });
            }
        }

        // Completion side effects may fail; keep a copy to roll the state
        // write back so a booking is never Completed without its invoice
        // and wallet credit.
        let saved = booking.clone();
        let record = booking.apply_transition(to, request.actor, request.reason, forced)?;

        let mut invoice = None;
        if to == BookingState::Completed {
            match self.commit_completion(&booking) {
                Ok(inv) => invoice = Some(inv),
                Err(e) => {
                    *booking = saved;
                    return Err(e);
                }
            }
        }
        if from == BookingState::Accepted && to == BookingState::InProgress {
            self.otp.clear(&booking_id);
        }

        let snapshot = booking.clone();
        drop(booking);
        self.notifier.booking_transitioned(&snapshot, &record);
        Ok(TransitionOutcome {
            booking: snapshot,
            record,
            invoice,
        })
    }

    fn check_gates(
        &self,
        booking: &Booking,
        from: BookingState,
        to: BookingState,
        otp: Option<&str>,
    ) -> Result<(), OrchestratorError> {
        if requires_presence_proof(from, to) {
            let supplied = otp.ok_or(OrchestratorError::GateNotSatisfied {
                gate: "presence",
                reason: "OTP required to start work".into(),
            })?;
            if !self.otp.verify(&booking.id, supplied) {
                return Err(OrchestratorError::GateNotSatisfied {
                    gate: "presence",
                    reason: "OTP mismatch".into(),
                });
            }
        }
        if requires_payment_proof(from, to)
            && self.ledger.captured_final_intent(&booking.id).is_none()
        {
            return Err(OrchestratorError::GateNotSatisfied {
                gate: "payment",
                reason: "no captured final payment for this booking".into(),
            });
        }
        Ok(())
    }

    /// Invoice and wallet credit for a booking landing on `COMPLETED`.
    /// Both halves are idempotent, so the forced path and the webhook
    /// path can race a manual completion without double effects.
    fn commit_completion(&self, booking: &Booking) -> Result<Invoice, OrchestratorError> {
        let invoice = {
            let mut invoices = self.invoices.lock();
            match invoices.get(&booking.id) {
                Some(existing) => existing.clone(),
                None => {
                    let computed = compute_invoice(
                        booking.id,
                        booking.deposit_minor,
                        booking.service_charge_minor.unwrap_or(0),
                        self.config.tax_rate_percent,
                        booking.deposit_minor,
                        booking.currency.clone(),
                    )?;
                    invoices.insert(booking.id, computed.clone());
                    computed
                }
            }
        };

        if invoice.service_charge_minor > 0 {
            if let Some(partner) = booking.partner {
                match self
                    .wallet
                    .credit(partner, invoice.service_charge_minor, booking.id)?
                {
                    Credited::Created(txn) => {
                        tracing::info!(
                            booking_id = %booking.id,
                            partner_id = %partner,
                            amount_minor = txn.amount_minor,
                            "completion credit committed"
                        );
                    }
                    Credited::Duplicate(_) => {}
                }
            } else {
                tracing::warn!(
                    booking_id = %booking.id,
                    "completed without an assigned partner, no wallet credit"
                );
            }
        }
        Ok(invoice)
    }

    /// Process a raw webhook delivery from the gateway.
    ///
    /// Verifies the signature over the exact body bytes, applies the event
    /// to the ledger (idempotent under at-least-once delivery), and on the
    /// first `captured` for a final intent of an `IN_PROGRESS` booking
    /// commits the completion transition as actor `gateway-webhook`.
    pub fn handle_webhook(
        &self,
        raw_body: &[u8],
        signature_hex: &str,
    ) -> Result<WebhookOutcome, OrchestratorError> {
        let event = self.verifier.verify_and_parse(raw_body, signature_hex)?;
        let metadata = serde_json::from_slice::<serde_json::Value>(raw_body)
            .unwrap_or(serde_json::Value::Null);

        match event.event {
            WebhookEventKind::Captured => {
                match self
                    .ledger
                    .apply_captured(&event.order_id, event.amount_minor, metadata)
                {
                    Ok(Applied::Applied) => {
                        self.complete_on_captured(&event.order_id);
                        Ok(WebhookOutcome::Applied)
                    }
                    Ok(Applied::Duplicate) => Ok(WebhookOutcome::Duplicate),
                    Err(karigar_ledger::LedgerError::UnknownIntent { intent_id }) => {
                        tracing::warn!(%intent_id, "captured event for unknown intent, ignoring");
                        Ok(WebhookOutcome::Ignored)
                    }
                    Err(e) => Err(e.into()),
                }
            }
            WebhookEventKind::Failed => {
                match self
                    .ledger
                    .apply_failed(&event.order_id, event.amount_minor, metadata)
                {
                    Ok(Applied::Applied) => Ok(WebhookOutcome::Applied),
                    Ok(Applied::Duplicate) => Ok(WebhookOutcome::Duplicate),
                    Err(karigar_ledger::LedgerError::UnknownIntent { intent_id }) => {
                        tracing::warn!(%intent_id, "failed event for unknown intent, ignoring");
                        Ok(WebhookOutcome::Ignored)
                    }
                    Err(e) => Err(e.into()),
                }
            }
            WebhookEventKind::RefundProcessed => {
                let refund_id = event.refund_id.ok_or_else(|| {
                    karigar_gateway::WebhookError::MalformedPayload {
                        reason: "refund_processed event without refund_id".into(),
                    }
                })?;
                match self.ledger.mark_refund_processed(&refund_id, metadata) {
                    Ok(Applied::Applied) => Ok(WebhookOutcome::Applied),
                    Ok(Applied::Duplicate) => Ok(WebhookOutcome::Duplicate),
                    Err(karigar_ledger::LedgerError::UnknownRefund { refund_id }) => {
                        tracing::warn!(%refund_id, "refund event for unknown refund, ignoring");
                        Ok(WebhookOutcome::Ignored)
                    }
                    Err(e) => Err(e.into()),
                }
            }
        }
    }

    /// Webhook-driven completion. Failure here is logged, not surfaced:
    /// the ledger entry is already committed and the delivery must still
    /// be acknowledged.
    fn complete_on_captured(&self, intent_id: &IntentId) {
        let Some(intent) = self.ledger.intent(intent_id) else {
            return;
        };
        if intent.purpose != PaymentPurpose::Final {
            return;
        }
        let booking_state = match self.booking(intent.booking_id) {
            Ok(b) => b.state(),
            Err(_) => return,
        };
        if booking_state != BookingState::InProgress {
            return;
        }
        if let Err(e) = self.request_transition(
            intent.booking_id,
            TransitionRequest {
                to: BookingState::Completed,
                actor: "gateway-webhook".into(),
                otp: None,
                partner_id: None,
                reason: Some(format!("final payment captured ({intent_id})")),
            },
        ) {
            tracing::warn!(
                booking_id = %intent.booking_id,
                error = %e,
                "webhook completion did not commit"
            );
        }
    }

    /// Initiate a refund against a captured intent.
    ///
    /// Local preconditions are checked before the gateway call; the refund
    /// is recorded only after the gateway accepts it.
    pub fn initiate_refund(
        &self,
        intent_id: &IntentId,
        amount_minor: i64,
        reason: &str,
    ) -> Result<Refund, OrchestratorError> {
        if amount_minor <= 0 {
            return Err(OrchestratorError::Validation {
                reason: format!("refund amount must be positive, got {amount_minor}"),
            });
        }
        let intent =
            self.ledger
                .intent(intent_id)
                .ok_or(karigar_ledger::LedgerError::UnknownIntent {
                    intent_id: intent_id.to_string(),
                })?;
        if !self.ledger.has_captured(intent_id) {
            return Err(karigar_ledger::LedgerError::NotCaptured {
                intent_id: intent_id.to_string(),
                status: intent.status,
            }
            .into());
        }
        if amount_minor > intent.amount_minor {
            return Err(OrchestratorError::Validation {
                reason: format!(
                    "refund {amount_minor} exceeds captured amount {}",
                    intent.amount_minor
                ),
            });
        }

        let gw_refund = self.gateway.create_refund(intent_id, amount_minor, reason)?;
        let refund = Refund {
            refund_id: gw_refund.refund_id,
            intent_id: intent_id.clone(),
            amount_minor,
            reason: reason.to_string(),
            status: RefundStatus::Initiated,
            created_at: Timestamp::now(),
        };
        let metadata = serde_json::json!({
            "gateway": self.gateway.gateway_name(),
            "order_id": gw_refund.order_id,
        });
        self.ledger.record_refund_initiated(refund.clone(), metadata)?;
        Ok(refund)
    }

    /// Poll the gateway for a refund and settle it locally when processed.
    /// Settlement is guarded: an already-processed refund is never
    /// re-applied.
    pub fn check_refund_status(
        &self,
        refund_id: &RefundId,
    ) -> Result<Refund, OrchestratorError> {
        let gw_refund = self.gateway.fetch_refund(refund_id)?;
        if gw_refund.state == karigar_gateway::GatewayRefundState::Processed {
            let metadata = serde_json::json!({
                "gateway": self.gateway.gateway_name(),
                "source": "refund_poll",
            });
            self.ledger.mark_refund_processed(refund_id, metadata)?;
        }
        self.ledger
            .refund(refund_id)
            .ok_or(karigar_ledger::LedgerError::UnknownRefund {
                refund_id: refund_id.to_string(),
            }
            .into())
    }

    fn booking_cell(
        &self,
        booking_id: BookingId,
    ) -> Result<Arc<Mutex<Booking>>, OrchestratorError> {
        self.bookings
            .read()
            .get(&booking_id)
            .cloned()
            .ok_or(OrchestratorError::BookingNotFound { booking_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::RecordingSink;
    use karigar_gateway::{GatewayError, GatewayOrder, GatewayRefund, MockGateway};
    use karigar_ledger::LedgerEventKind;
    use karigar_wallet::WalletConfig;

    const WEBHOOK_SECRET: &[u8] = b"whsec_orchestrator_test";

    fn orchestrator_with(gateway: Arc<dyn PaymentGateway>) -> (BookingOrchestrator, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let orchestrator = BookingOrchestrator::new(
            OrchestratorConfig {
                tax_rate_percent: 18,
                currency: CurrencyCode::new("PKR").unwrap(),
            },
            Arc::new(PaymentLedger::new()),
            Arc::new(WalletService::new(WalletConfig {
                min_withdrawal_minor: 10_000,
                hold_period_days: 7,
            })),
            gateway,
            sink.clone(),
            WebhookVerifier::new(WEBHOOK_SECRET),
        );
        (orchestrator, sink)
    }

    fn orchestrator() -> (BookingOrchestrator, Arc<RecordingSink>) {
        orchestrator_with(Arc::new(MockGateway::default()))
    }

    fn request(to: BookingState) -> TransitionRequest {
        TransitionRequest {
            to,
            actor: "test".into(),
            otp: None,
            partner_id: None,
            reason: None,
        }
    }

    /// Drive a booking to IN_PROGRESS with the service charge set.
    fn in_progress_booking(
        orch: &BookingOrchestrator,
    ) -> (BookingId, PartnerId) {
        let booking = orch.create_booking(CustomerId::new(), 25_000).unwrap();
        let partner = PartnerId::new();
        orch.request_transition(
            booking.id,
            TransitionRequest {
                partner_id: Some(partner),
                ..request(BookingState::Assigned)
            },
        )
        .unwrap();
        orch.request_transition(booking.id, request(BookingState::Accepted))
            .unwrap();
        let otp = orch.issue_otp(booking.id).unwrap();
        orch.request_transition(
            booking.id,
            TransitionRequest {
                otp: Some(otp),
                ..request(BookingState::InProgress)
            },
        )
        .unwrap();
        orch.set_service_charge(booking.id, 80_000).unwrap();
        (booking.id, partner)
    }

    fn signed_captured_body(
        verifier: &WebhookVerifier,
        intent_id: &IntentId,
        amount: i64,
    ) -> (Vec<u8>, String) {
        let body = serde_json::to_vec(&serde_json::json!({
            "event": "captured",
            "order_id": intent_id.as_str(),
            "amount_minor": amount,
            "currency": "PKR",
            "payment_ref": "pay_test",
        }))
        .unwrap();
        let sig = verifier.sign_hex(&body);
        (body, sig)
    }

    #[test]
    fn assignment_requires_partner_id() {
        let (orch, _) = orchestrator();
        let booking = orch.create_booking(CustomerId::new(), 25_000).unwrap();
        let err = orch
            .request_transition(booking.id, request(BookingState::Assigned))
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::Validation { .. }));
    }

    #[test]
    fn presence_gate_rejects_missing_and_wrong_otp() {
        let (orch, _) = orchestrator();
        let booking = orch.create_booking(CustomerId::new(), 25_000).unwrap();
        orch.request_transition(
            booking.id,
            TransitionRequest {
                partner_id: Some(PartnerId::new()),
                ..request(BookingState::Assigned)
            },
        )
        .unwrap();
        orch.request_transition(booking.id, request(BookingState::Accepted))
            .unwrap();
        let _otp = orch.issue_otp(booking.id).unwrap();

        let err = orch
            .request_transition(booking.id, request(BookingState::InProgress))
            .unwrap_err();
        assert!(matches!(
            err,
            OrchestratorError::GateNotSatisfied { gate: "presence", .. }
        ));

        let err = orch
            .request_transition(
                booking.id,
                TransitionRequest {
                    otp: Some("999999x".into()),
                    ..request(BookingState::InProgress)
                },
            )
            .unwrap_err();
        assert!(matches!(
            err,
            OrchestratorError::GateNotSatisfied { gate: "presence", .. }
        ));
        assert_eq!(orch.booking(booking.id).unwrap().state(), BookingState::Accepted);
    }

    #[test]
    fn payment_gate_rejects_completion_without_capture() {
        let (orch, _) = orchestrator();
        let (booking_id, _) = in_progress_booking(&orch);
        let err = orch
            .request_transition(booking_id, request(BookingState::Completed))
            .unwrap_err();
        assert!(matches!(
            err,
            OrchestratorError::GateNotSatisfied { gate: "payment", .. }
        ));
    }

    #[test]
    fn final_intent_amount_is_the_invoice_due() {
        let (orch, _) = orchestrator();
        let (booking_id, _) = in_progress_booking(&orch);
        let intent = orch
            .create_payment_intent(booking_id, PaymentPurpose::Final)
            .unwrap();
        // 25_000 + 80_000 subtotal, 18% tax 18_900, total 123_900,
        // minus the 25_000 deposit.
        assert_eq!(intent.amount_minor, 98_900);
        assert_eq!(intent.purpose, PaymentPurpose::Final);
    }

    #[test]
    fn final_intent_requires_service_charge() {
        let (orch, _) = orchestrator();
        let booking = orch.create_booking(CustomerId::new(), 25_000).unwrap();
        let err = orch
            .create_payment_intent(booking.id, PaymentPurpose::Final)
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::ServiceChargeNotSet { .. }));
    }

    #[test]
    fn gateway_failure_leaves_no_local_state() {
        struct DownGateway;
        impl PaymentGateway for DownGateway {
            fn create_order(
                &self,
                _: i64,
                _: &CurrencyCode,
                _: &str,
            ) -> Result<GatewayOrder, GatewayError> {
                Err(GatewayError::ServiceUnavailable {
                    reason: "connection refused".into(),
                })
            }
            fn create_refund(
                &self,
                _: &IntentId,
                _: i64,
                _: &str,
            ) -> Result<GatewayRefund, GatewayError> {
                Err(GatewayError::ServiceUnavailable {
                    reason: "connection refused".into(),
                })
            }
            fn fetch_refund(&self, _: &RefundId) -> Result<GatewayRefund, GatewayError> {
                Err(GatewayError::ServiceUnavailable {
                    reason: "connection refused".into(),
                })
            }
            fn gateway_name(&self) -> &str {
                "DownGateway"
            }
        }

        let (orch, _) = orchestrator_with(Arc::new(DownGateway));
        let booking = orch.create_booking(CustomerId::new(), 25_000).unwrap();
        let err = orch
            .create_payment_intent(booking.id, PaymentPurpose::Deposit)
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::Gateway(_)));
        assert_eq!(orch.ledger().entry_count(), 0);
    }

    #[test]
    fn webhook_capture_completes_booking_once() {
        let (orch, sink) = orchestrator();
        let (booking_id, partner) = in_progress_booking(&orch);
        let intent = orch
            .create_payment_intent(booking_id, PaymentPurpose::Final)
            .unwrap();

        let verifier = WebhookVerifier::new(WEBHOOK_SECRET);
        let (body, sig) = signed_captured_body(&verifier, &intent.intent_id, 98_900);

        assert_eq!(
            orch.handle_webhook(&body, &sig).unwrap(),
            WebhookOutcome::Applied
        );
        // Redelivery.
        assert_eq!(
            orch.handle_webhook(&body, &sig).unwrap(),
            WebhookOutcome::Duplicate
        );

        let booking = orch.booking(booking_id).unwrap();
        assert_eq!(booking.state(), BookingState::Completed);
        assert!(booking.completed_at.is_some());

        let captured: Vec<_> = orch
            .ledger()
            .entries_for_booking(&booking_id)
            .into_iter()
            .filter(|e| e.kind == LedgerEventKind::Captured)
            .collect();
        assert_eq!(captured.len(), 1);

        let invoice = orch.invoice(booking_id).unwrap();
        assert_eq!(invoice.tax_minor, 18_900);
        assert_eq!(invoice.total_minor, 123_900);
        assert_eq!(invoice.amount_due_minor, 98_900);

        let account = orch.wallet().account(&partner).unwrap();
        assert_eq!(account.balance_hold, 80_000);
        assert_eq!(account.total_earned, 80_000);

        let completions = sink
            .events()
            .into_iter()
            .filter(|(id, state)| *id == booking_id && *state == BookingState::Completed)
            .count();
        assert_eq!(completions, 1);

        let webhook_record = booking
            .transition_log()
            .iter()
            .find(|r| r.to_state == BookingState::Completed)
            .unwrap();
        assert_eq!(webhook_record.actor, "gateway-webhook");
    }

    #[test]
    fn webhook_bad_signature_rejected() {
        let (orch, _) = orchestrator();
        let (booking_id, _) = in_progress_booking(&orch);
        let intent = orch
            .create_payment_intent(booking_id, PaymentPurpose::Final)
            .unwrap();

        let forger = WebhookVerifier::new(b"whsec_wrong".to_vec());
        let (body, sig) = signed_captured_body(&forger, &intent.intent_id, 98_900);
        let err = orch.handle_webhook(&body, &sig).unwrap_err();
        assert!(matches!(
            err,
            OrchestratorError::Webhook(karigar_gateway::WebhookError::InvalidSignature)
        ));
        assert_eq!(orch.booking(booking_id).unwrap().state(), BookingState::InProgress);
    }

    #[test]
    fn webhook_unknown_intent_is_ignored() {
        let (orch, _) = orchestrator();
        let verifier = WebhookVerifier::new(WEBHOOK_SECRET);
        let (body, sig) =
            signed_captured_body(&verifier, &IntentId::new("order_ghost").unwrap(), 500);
        assert_eq!(
            orch.handle_webhook(&body, &sig).unwrap(),
            WebhookOutcome::Ignored
        );
    }

    #[test]
    fn deposit_capture_does_not_complete_booking() {
        let (orch, _) = orchestrator();
        let (booking_id, _) = in_progress_booking(&orch);
        let intent = orch
            .create_payment_intent(booking_id, PaymentPurpose::Deposit)
            .unwrap();

        let verifier = WebhookVerifier::new(WEBHOOK_SECRET);
        let (body, sig) = signed_captured_body(&verifier, &intent.intent_id, 25_000);
        assert_eq!(
            orch.handle_webhook(&body, &sig).unwrap(),
            WebhookOutcome::Applied
        );
        assert_eq!(orch.booking(booking_id).unwrap().state(), BookingState::InProgress);
    }

    #[test]
    fn force_transition_bypasses_gates_and_records_forced() {
        let (orch, _) = orchestrator();
        let (booking_id, partner) = in_progress_booking(&orch);

        let outcome = orch
            .force_transition(
                booking_id,
                BookingState::Completed,
                "admin:ops",
                "cash settled offline",
            )
            .unwrap();
        assert!(outcome.record.forced);
        assert_eq!(outcome.booking.state(), BookingState::Completed);
        assert!(outcome.invoice.is_some());
        // Wallet still credited exactly once.
        assert_eq!(
            orch.wallet().account(&partner).unwrap().total_earned,
            80_000
        );
    }

    #[test]
    fn force_transition_requires_reason_and_structural_legality() {
        let (orch, _) = orchestrator();
        let booking = orch.create_booking(CustomerId::new(), 25_000).unwrap();
        assert!(matches!(
            orch.force_transition(booking.id, BookingState::Cancelled, "admin:ops", "  "),
            Err(OrchestratorError::Validation { .. })
        ));
        assert!(matches!(
            orch.force_transition(booking.id, BookingState::Completed, "admin:ops", "skip"),
            Err(OrchestratorError::State(StateError::IllegalTransition { .. }))
        ));
    }

    #[test]
    fn disputed_booking_is_frozen() {
        let (orch, _) = orchestrator();
        let (booking_id, _) = in_progress_booking(&orch);
        orch.request_transition(
            booking_id,
            TransitionRequest {
                reason: Some("customer reported damage".into()),
                ..request(BookingState::Disputed)
            },
        )
        .unwrap();
        let err = orch
            .request_transition(booking_id, request(BookingState::Completed))
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::State(_)));
    }

    #[test]
    fn refund_roundtrip_settles_once() {
        let (orch, _) = orchestrator();
        let (booking_id, _) = in_progress_booking(&orch);
        let intent = orch
            .create_payment_intent(booking_id, PaymentPurpose::Final)
            .unwrap();
        let verifier = WebhookVerifier::new(WEBHOOK_SECRET);
        let (body, sig) = signed_captured_body(&verifier, &intent.intent_id, 98_900);
        orch.handle_webhook(&body, &sig).unwrap();

        let refund = orch
            .initiate_refund(&intent.intent_id, 98_900, "service not delivered")
            .unwrap();
        assert_eq!(refund.status, RefundStatus::Initiated);

        // The mock settles a refund on first poll.
        let polled = orch.check_refund_status(&refund.refund_id).unwrap();
        assert_eq!(polled.status, RefundStatus::Processed);
        let again = orch.check_refund_status(&refund.refund_id).unwrap();
        assert_eq!(again.status, RefundStatus::Processed);

        let processed: Vec<_> = orch
            .ledger()
            .entries_for_booking(&booking_id)
            .into_iter()
            .filter(|e| e.kind == LedgerEventKind::RefundProcessed)
            .collect();
        assert_eq!(processed.len(), 1);
    }

    #[test]
    fn refund_rejected_before_capture_and_over_amount() {
        let (orch, _) = orchestrator();
        let (booking_id, _) = in_progress_booking(&orch);
        let intent = orch
            .create_payment_intent(booking_id, PaymentPurpose::Final)
            .unwrap();

        assert!(matches!(
            orch.initiate_refund(&intent.intent_id, 1_000, "too early"),
            Err(OrchestratorError::Ledger(
                karigar_ledger::LedgerError::NotCaptured { .. }
            ))
        ));

        let verifier = WebhookVerifier::new(WEBHOOK_SECRET);
        let (body, sig) = signed_captured_body(&verifier, &intent.intent_id, 98_900);
        orch.handle_webhook(&body, &sig).unwrap();
        assert!(matches!(
            orch.initiate_refund(&intent.intent_id, 200_000, "too much"),
            Err(OrchestratorError::Validation { .. })
        ));
    }

    #[test]
    fn unknown_booking_is_not_found() {
        let (orch, _) = orchestrator();
        assert!(matches!(
            orch.booking(BookingId::new()),
            Err(OrchestratorError::BookingNotFound { .. })
        ));
    }
}
