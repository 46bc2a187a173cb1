//! # The Booking Aggregate
//!
//! A [`Booking`] owns its current state and an immutable log of every
//! transition that got it there. State writes go through
//! [`Booking::apply_transition`], which validates against the transition
//! table and leaves the aggregate untouched on rejection.
//!
//! Only the orchestrator may call the mutating methods — no other
//! component writes booking state.

use serde::{Deserialize, Serialize};

use karigar_core::{BookingId, CurrencyCode, CustomerId, PartnerId, Timestamp};

use crate::machine::{is_transition_allowed, BookingState, StateError};

/// Record of a single state transition in the booking lifecycle.
///
/// Appended on every committed transition; never updated or removed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// State before the transition.
    pub from_state: BookingState,
    /// State after the transition.
    pub to_state: BookingState,
    /// When the transition was committed (UTC).
    pub timestamp: Timestamp,
    /// Who requested it (customer id, partner id, `admin:<name>`,
    /// or `gateway-webhook`).
    pub actor: String,
    /// Free-text reason, mandatory for administrative overrides.
    pub reason: Option<String>,
    /// True when the transition bypassed gate checks via the admin
    /// override path.
    pub forced: bool,
}

/// One customer service request tracked through the state machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    /// Unique booking identifier.
    pub id: BookingId,
    /// The requesting customer.
    pub customer: CustomerId,
    /// The assigned field partner, if any.
    pub partner: Option<PartnerId>,
    /// Current lifecycle state.
    state: BookingState,
    /// Booking currency.
    pub currency: CurrencyCode,
    /// Deposit collected at booking creation, in minor units.
    pub deposit_minor: i64,
    /// Variable service charge entered by the partner while on-site.
    pub service_charge_minor: Option<i64>,
    /// When the booking was created.
    pub created_at: Timestamp,
    /// When a partner was assigned.
    pub assigned_at: Option<Timestamp>,
    /// When the booking reached `COMPLETED`.
    pub completed_at: Option<Timestamp>,
    /// Immutable log of all state transitions.
    transition_log: Vec<TransitionRecord>,
}

impl Booking {
    /// Create a new booking in `CREATED` state.
    ///
    /// Creation is not a transition; the log starts empty.
    pub fn new(
        id: BookingId,
        customer: CustomerId,
        currency: CurrencyCode,
        deposit_minor: i64,
    ) -> Self {
        Self {
            id,
            customer,
            partner: None,
            state: BookingState::Created,
            currency,
            deposit_minor,
            service_charge_minor: None,
            created_at: Timestamp::now(),
            assigned_at: None,
            completed_at: None,
            transition_log: Vec::new(),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> BookingState {
        self.state
    }

    /// The immutable transition log.
    pub fn transition_log(&self) -> &[TransitionRecord] {
        &self.transition_log
    }

    /// Commit a state transition after table validation.
    ///
    /// On success the state is written, lifecycle timestamps are updated,
    /// and a [`TransitionRecord`] is appended. On rejection nothing
    /// changes. Gate checks (OTP, payment proof) are the caller's
    /// responsibility and happen *before* this call.
    pub fn apply_transition(
        &mut self,
        to: BookingState,
        actor: impl Into<String>,
        reason: Option<String>,
        forced: bool,
    ) -> Result<TransitionRecord, StateError> {
        if !is_transition_allowed(self.state, to) {
            return Err(StateError::IllegalTransition {
                from: self.state,
                to,
            });
        }

        let now = Timestamp::now();
        let record = TransitionRecord {
            from_state: self.state,
            to_state: to,
            timestamp: now,
            actor: actor.into(),
            reason,
            forced,
        };
        self.transition_log.push(record.clone());
        self.state = to;
        match to {
            BookingState::Assigned => self.assigned_at = Some(now),
            BookingState::Completed => self.completed_at = Some(now),
            _ => {}
        }
        Ok(record)
    }

    /// Attach the assigned partner. Legal only while `CREATED` (the
    /// orchestrator sets the partner and then commits the `ASSIGNED`
    /// transition).
    pub fn set_partner(&mut self, partner: PartnerId) -> Result<(), StateError> {
        if self.state != BookingState::Created {
            return Err(StateError::WrongState {
                state: self.state,
                operation: "set_partner",
            });
        }
        self.partner = Some(partner);
        Ok(())
    }

    /// Record the service charge the partner quoted on-site.
    ///
    /// Legal only while `IN_PROGRESS`; the charge feeds the final payment
    /// intent and the invoice.
    pub fn set_service_charge(&mut self, amount_minor: i64) -> Result<(), StateError> {
        if self.state != BookingState::InProgress {
            return Err(StateError::WrongState {
                state: self.state,
                operation: "set_service_charge",
            });
        }
        self.service_charge_minor = Some(amount_minor);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_booking() -> Booking {
        Booking::new(
            BookingId::new(),
            CustomerId::new(),
            CurrencyCode::new("PKR").unwrap(),
            25_000,
        )
    }

    fn advance(b: &mut Booking, to: BookingState) {
        b.apply_transition(to, "test", None, false).unwrap();
    }

    #[test]
    fn new_booking_starts_created_with_empty_log() {
        let b = make_booking();
        assert_eq!(b.state(), BookingState::Created);
        assert!(b.transition_log().is_empty());
        assert!(b.partner.is_none());
    }

    #[test]
    fn full_lifecycle_to_completed() {
        let mut b = make_booking();
        b.set_partner(PartnerId::new()).unwrap();
        advance(&mut b, BookingState::Assigned);
        advance(&mut b, BookingState::Accepted);
        advance(&mut b, BookingState::InProgress);
        b.set_service_charge(80_000).unwrap();
        advance(&mut b, BookingState::Completed);

        assert_eq!(b.state(), BookingState::Completed);
        assert_eq!(b.transition_log().len(), 4);
        assert!(b.assigned_at.is_some());
        assert!(b.completed_at.is_some());

        let log = b.transition_log();
        assert_eq!(log[0].from_state, BookingState::Created);
        assert_eq!(log[3].to_state, BookingState::Completed);
    }

    #[test]
    fn illegal_transition_leaves_booking_unchanged() {
        let mut b = make_booking();
        let err = b
            .apply_transition(BookingState::Completed, "test", None, false)
            .unwrap_err();
        assert_eq!(
            err,
            StateError::IllegalTransition {
                from: BookingState::Created,
                to: BookingState::Completed,
            }
        );
        assert_eq!(b.state(), BookingState::Created);
        assert!(b.transition_log().is_empty());
        assert!(b.completed_at.is_none());
    }

    #[test]
    fn same_state_request_is_rejected() {
        let mut b = make_booking();
        assert!(b
            .apply_transition(BookingState::Created, "test", None, false)
            .is_err());
    }

    #[test]
    fn forced_flag_is_recorded() {
        let mut b = make_booking();
        let record = b
            .apply_transition(
                BookingState::Cancelled,
                "admin:ops",
                Some("customer unreachable".into()),
                true,
            )
            .unwrap();
        assert!(record.forced);
        assert_eq!(record.actor, "admin:ops");
    }

    #[test]
    fn set_partner_only_while_created() {
        let mut b = make_booking();
        advance(&mut b, BookingState::Cancelled);
        assert!(b.set_partner(PartnerId::new()).is_err());
    }

    #[test]
    fn service_charge_only_while_in_progress() {
        let mut b = make_booking();
        assert!(b.set_service_charge(80_000).is_err());
        advance(&mut b, BookingState::Assigned);
        advance(&mut b, BookingState::Accepted);
        advance(&mut b, BookingState::InProgress);
        assert!(b.set_service_charge(80_000).is_ok());
        assert_eq!(b.service_charge_minor, Some(80_000));
    }

    #[test]
    fn booking_serializes_with_state_and_log() {
        let mut b = make_booking();
        advance(&mut b, BookingState::Assigned);
        let json = serde_json::to_string(&b).unwrap();
        assert!(json.contains("\"ASSIGNED\""));
        let parsed: Booking = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.state(), BookingState::Assigned);
        assert_eq!(parsed.transition_log().len(), 1);
    }
}
