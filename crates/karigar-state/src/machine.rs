//! # Transition Table and Gate Predicates
//!
//! The booking state machine as pure functions. No entity state lives
//! here — given a `(from, to)` pair these answer legality and which gate
//! must already be satisfied.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle state of a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingState {
    /// Customer has requested the service; no partner assigned yet.
    Created,
    /// A partner has been assigned but has not yet accepted.
    Assigned,
    /// The partner accepted the job.
    Accepted,
    /// The partner is on-site and work has started (OTP verified).
    InProgress,
    /// Work finished and final payment captured (terminal for money flow).
    Completed,
    /// Cancelled before work started (terminal).
    Cancelled,
    /// Under dispute; requires manual administrative resolution (terminal).
    Disputed,
}

/// All states, for exhaustive table tests and admin tooling.
pub const ALL_STATES: [BookingState; 7] = [
    BookingState::Created,
    BookingState::Assigned,
    BookingState::Accepted,
    BookingState::InProgress,
    BookingState::Completed,
    BookingState::Cancelled,
    BookingState::Disputed,
];

impl BookingState {
    /// Canonical state name (matches the serde representation).
    pub fn name(&self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Assigned => "ASSIGNED",
            Self::Accepted => "ACCEPTED",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
            Self::Disputed => "DISPUTED",
        }
    }

    /// Whether no further transitions are possible from this state.
    ///
    /// `Completed` is not terminal: the single `COMPLETED → DISPUTED`
    /// escape remains open.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Disputed)
    }
}

impl std::fmt::Display for BookingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether `from → to` appears in the transition table.
///
/// Pure lookup, no side effects. Anything not enumerated is illegal,
/// including `from == to`: a request for the current state is rejected,
/// not treated as idempotent success — callers track their own commits.
pub fn is_transition_allowed(from: BookingState, to: BookingState) -> bool {
    use BookingState::*;
    matches!(
        (from, to),
        (Created, Assigned)
            | (Created, Cancelled)
            | (Assigned, Accepted)
            | (Assigned, Cancelled)
            | (Accepted, InProgress)
            | (Accepted, Cancelled)
            | (InProgress, Completed)
            | (InProgress, Disputed)
            | (Completed, Disputed)
    )
}

/// The legal targets from a given state, in table order.
pub fn allowed_targets(from: BookingState) -> &'static [BookingState] {
    use BookingState::*;
    match from {
        Created => &[Assigned, Cancelled],
        Assigned => &[Accepted, Cancelled],
        Accepted => &[InProgress, Cancelled],
        InProgress => &[Completed, Disputed],
        Completed => &[Disputed],
        Cancelled | Disputed => &[],
    }
}

/// True only for `ACCEPTED → IN_PROGRESS`: the partner must prove they are
/// on-site via the customer's OTP before work may begin.
pub fn requires_presence_proof(from: BookingState, to: BookingState) -> bool {
    matches!((from, to), (BookingState::Accepted, BookingState::InProgress))
}

/// True only for `IN_PROGRESS → COMPLETED`: the final payment must be
/// captured and webhook-verified before the job can be marked done.
pub fn requires_payment_proof(from: BookingState, to: BookingState) -> bool {
    matches!((from, to), (BookingState::InProgress, BookingState::Completed))
}

/// Whether a booking in `state` may still be cancelled.
///
/// Cancellation is permitted only before work starts.
pub fn is_cancellable(state: BookingState) -> bool {
    matches!(
        state,
        BookingState::Created | BookingState::Assigned | BookingState::Accepted
    )
}

/// Structural state machine errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    /// The requested transition is not in the table.
    #[error("illegal booking transition: {from} -> {to}")]
    IllegalTransition {
        /// Current state.
        from: BookingState,
        /// Requested target state.
        to: BookingState,
    },

    /// A field write was attempted in a state that does not allow it.
    #[error("operation not permitted in state {state}: {operation}")]
    WrongState {
        /// The booking's current state.
        state: BookingState,
        /// What was attempted.
        operation: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use BookingState::*;

    /// The complete transition table. Everything else must be rejected.
    const TABLE: [(BookingState, BookingState); 9] = [
        (Created, Assigned),
        (Created, Cancelled),
        (Assigned, Accepted),
        (Assigned, Cancelled),
        (Accepted, InProgress),
        (Accepted, Cancelled),
        (InProgress, Completed),
        (InProgress, Disputed),
        (Completed, Disputed),
    ];

    #[test]
    fn every_enumerated_edge_is_allowed() {
        for (from, to) in TABLE {
            assert!(is_transition_allowed(from, to), "{from} -> {to}");
        }
    }

    #[test]
    fn every_non_enumerated_pair_is_rejected() {
        for from in ALL_STATES {
            for to in ALL_STATES {
                let in_table = TABLE.contains(&(from, to));
                assert_eq!(
                    is_transition_allowed(from, to),
                    in_table,
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn self_transitions_are_rejected() {
        for state in ALL_STATES {
            assert!(!is_transition_allowed(state, state), "{state} -> {state}");
        }
    }

    #[test]
    fn terminal_states_have_no_targets() {
        assert!(allowed_targets(Cancelled).is_empty());
        assert!(allowed_targets(Disputed).is_empty());
        assert!(Cancelled.is_terminal());
        assert!(Disputed.is_terminal());
        assert!(!Completed.is_terminal());
    }

    #[test]
    fn allowed_targets_agree_with_table() {
        for from in ALL_STATES {
            for &to in allowed_targets(from) {
                assert!(is_transition_allowed(from, to), "{from} -> {to}");
            }
            let count = TABLE.iter().filter(|(f, _)| *f == from).count();
            assert_eq!(allowed_targets(from).len(), count, "{from}");
        }
    }

    #[test]
    fn presence_gate_is_exactly_accept_to_in_progress() {
        for from in ALL_STATES {
            for to in ALL_STATES {
                let expected = (from, to) == (Accepted, InProgress);
                assert_eq!(requires_presence_proof(from, to), expected);
            }
        }
    }

    #[test]
    fn payment_gate_is_exactly_in_progress_to_completed() {
        for from in ALL_STATES {
            for to in ALL_STATES {
                let expected = (from, to) == (InProgress, Completed);
                assert_eq!(requires_payment_proof(from, to), expected);
            }
        }
    }

    #[test]
    fn cancellation_window_closes_at_in_progress() {
        assert!(is_cancellable(Created));
        assert!(is_cancellable(Assigned));
        assert!(is_cancellable(Accepted));
        assert!(!is_cancellable(InProgress));
        assert!(!is_cancellable(Completed));
        assert!(!is_cancellable(Cancelled));
        assert!(!is_cancellable(Disputed));
        // And the table agrees: no Cancelled edge from IN_PROGRESS onward.
        assert!(!is_transition_allowed(InProgress, Cancelled));
        assert!(!is_transition_allowed(Completed, Cancelled));
    }

    #[test]
    fn state_serde_is_screaming_snake() {
        let json = serde_json::to_string(&InProgress).unwrap();
        assert_eq!(json, "\"IN_PROGRESS\"");
        let parsed: BookingState = serde_json::from_str("\"COMPLETED\"").unwrap();
        assert_eq!(parsed, Completed);
    }
}
