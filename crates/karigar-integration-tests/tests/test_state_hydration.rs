//! # State Hydration Round-Trip
//!
//! A restarted process rebuilds its in-memory stores from persisted
//! snapshots. These tests run the snapshot/restore cycle without a
//! database: everything a process would persist is taken from a live
//! orchestrator and loaded into a fresh one, which must then behave as
//! if it had never restarted. Idempotency guards still recognise
//! already-applied events, the ledger keeps appending above the restored
//! sequence, and wallet balances survive.
//!
//! The two orchestrators share one mock gateway: the payment provider
//! does not restart when our process does.

use std::sync::Arc;

use karigar_booking::{
    BookingOrchestrator, NoopSink, OrchestratorConfig, TransitionRequest, WebhookOutcome,
};
use karigar_core::{BookingId, CurrencyCode, CustomerId, PartnerId};
use karigar_gateway::{MockGateway, PaymentGateway, WebhookVerifier};
use karigar_ledger::{PaymentLedger, PaymentPurpose};
use karigar_state::BookingState;
use karigar_wallet::{WalletConfig, WalletService};

const WEBHOOK_SECRET: &[u8] = b"whsec_hydration";

fn orchestrator(gateway: Arc<dyn PaymentGateway>) -> Arc<BookingOrchestrator> {
    Arc::new(BookingOrchestrator::new(
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
        Arc::new(NoopSink),
        WebhookVerifier::new(WEBHOOK_SECRET),
    ))
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

/// Copy everything a process persists from one orchestrator to another.
fn hydrate_from(source: &BookingOrchestrator, target: &BookingOrchestrator) {
    target.ledger().restore(
        source.ledger().all_entries(),
        source.ledger().all_intents(),
        source.ledger().all_refunds(),
    );
    target.wallet().restore(
        source.wallet().all_accounts(),
        source.wallet().all_transactions(),
    );
}

#[test]
fn applied_webhook_is_still_a_duplicate_after_restart() {
    let gateway: Arc<MockGateway> = Arc::new(MockGateway::new());
    let old = orchestrator(gateway.clone());
    let verifier = WebhookVerifier::new(WEBHOOK_SECRET);

    let booking = old.create_booking(CustomerId::new(), 25_000).unwrap();
    let partner = PartnerId::new();
    old.request_transition(
        booking.id,
        TransitionRequest {
            partner_id: Some(partner),
            ..request(BookingState::Assigned)
        },
    )
    .unwrap();
    old.request_transition(booking.id, request(BookingState::Accepted))
        .unwrap();
    let otp = old.issue_otp(booking.id).unwrap();
    old.request_transition(
        booking.id,
        TransitionRequest {
            otp: Some(otp),
            ..request(BookingState::InProgress)
        },
    )
    .unwrap();
    old.set_service_charge(booking.id, 80_000).unwrap();
    let intent = old
        .create_payment_intent(booking.id, PaymentPurpose::Final)
        .unwrap();

    let body = serde_json::to_vec(&serde_json::json!({
        "event": "captured",
        "order_id": intent.intent_id.as_str(),
        "amount_minor": 98_900,
        "currency": "PKR",
    }))
    .unwrap();
    let sig = verifier.sign_hex(&body);
    assert_eq!(old.handle_webhook(&body, &sig).unwrap(), WebhookOutcome::Applied);

    // Restart: a fresh process hydrates from what the old one persisted.
    let fresh = orchestrator(gateway);
    fresh.restore_booking(old.booking(booking.id).unwrap());
    hydrate_from(&old, &fresh);

    // The restored ledger recognises the capture, so the gateway's
    // at-least-once redelivery lands as a duplicate.
    assert_eq!(
        fresh.handle_webhook(&body, &sig).unwrap(),
        WebhookOutcome::Duplicate
    );

    assert_eq!(
        fresh.booking(booking.id).unwrap().state(),
        BookingState::Completed
    );
    assert_eq!(
        fresh.booking(booking.id).unwrap().transition_log().len(),
        old.booking(booking.id).unwrap().transition_log().len()
    );
    assert_eq!(fresh.ledger().entry_count(), old.ledger().entry_count());

    let account = fresh.wallet().account(&partner).unwrap();
    assert_eq!(account.balance_hold, 80_000);
    assert_eq!(account.total_earned, 80_000);
}

#[test]
fn restored_ledger_keeps_appending_above_the_highest_seq() {
    let gateway: Arc<MockGateway> = Arc::new(MockGateway::new());
    let old = orchestrator(gateway.clone());
    let booking = old.create_booking(CustomerId::new(), 25_000).unwrap();
    old.create_payment_intent(booking.id, PaymentPurpose::Deposit)
        .unwrap();
    let high_seq = old.ledger().all_entries().last().map(|e| e.seq).unwrap();

    let fresh = orchestrator(gateway);
    fresh.restore_booking(old.booking(booking.id).unwrap());
    hydrate_from(&old, &fresh);

    // A retry after a failed deposit issues a new intent; its entry must
    // land above the restored sequence, never reusing it.
    let second = fresh
        .create_payment_intent(booking.id, PaymentPurpose::Deposit)
        .unwrap();
    let entries = fresh.ledger().all_entries();
    let new_entry = entries
        .iter()
        .find(|e| e.intent_id.as_ref() == Some(&second.intent_id))
        .unwrap();
    assert!(new_entry.seq > high_seq);
}

#[test]
fn wallet_invariant_survives_hydration_and_further_activity() {
    let gateway: Arc<MockGateway> = Arc::new(MockGateway::new());
    let old = orchestrator(gateway.clone());
    let partner = PartnerId::new();
    old.wallet().credit(partner, 120_000, BookingId::new()).unwrap();
    old.wallet().move_hold_to_available(partner, 90_000).unwrap();
    old.wallet().withdraw(partner, 40_000, "bank_transfer").unwrap();

    let fresh = orchestrator(gateway);
    hydrate_from(&old, &fresh);

    let account = fresh.wallet().account(&partner).unwrap();
    assert_eq!(account.balance_hold, 30_000);
    assert_eq!(account.balance_available, 50_000);
    assert_eq!(
        account.balance_hold + account.balance_available,
        account.total_earned - account.total_withdrawn
    );

    // The restored history keeps serving the service after restart.
    let txns_before = fresh.wallet().transactions_for_partner(&partner).len();
    fresh
        .wallet()
        .withdraw(partner, 50_000, "bank_transfer")
        .unwrap();
    assert_eq!(
        fresh.wallet().transactions_for_partner(&partner).len(),
        txns_before + 1
    );
    let drained = fresh.wallet().account(&partner).unwrap();
    assert_eq!(drained.balance_available, 0);
    assert_eq!(drained.total_withdrawn, 90_000);
}
