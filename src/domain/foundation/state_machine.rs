//! State machine trait for lifecycle enums.
//!
//! Gives lifecycle enums (such as a WebSocket connection's
//! `Active → Closing → Closed`) one way to express and check transitions.

use super::ValidationError;

/// Trait for status enums that represent state machines.
///
/// Implementors define the allowed edges; validated transitions and the
/// terminal check come for free.
///
/// # Example
///
/// ```ignore
/// impl StateMachine for ConnectionState {
///     fn can_transition_to(&self, target: &Self) -> bool {
///         matches!((self, target), (Active, Closing) | (Closing, Closed))
///     }
///
///     fn valid_transitions(&self) -> Vec<Self> {
///         match self {
///             Active => vec![Closing],
///             Closing => vec![Closed],
///             Closed => vec![],
///         }
///     }
/// }
///
/// let next = ConnectionState::Active.transition_to(ConnectionState::Closing)?;
/// ```
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug {
    /// Returns true if transition from self to target is valid.
    fn can_transition_to(&self, target: &Self) -> bool;

    /// Returns all valid target states from current state.
    fn valid_transitions(&self) -> Vec<Self>;

    /// Performs transition with validation, returning error if invalid.
    fn transition_to(&self, target: Self) -> Result<Self, ValidationError> {
        if self.can_transition_to(&target) {
            Ok(target)
        } else {
            Err(ValidationError::invalid_format(
                "state_transition",
                format!("Cannot transition from {:?} to {:?}", self, target),
            ))
        }
    }

    /// Checks if current state is terminal (no valid outgoing transitions).
    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Door {
        Open,
        Ajar,
        Shut,
    }

    impl StateMachine for Door {
        fn can_transition_to(&self, target: &Self) -> bool {
            matches!((self, target), (Door::Open, Door::Ajar) | (Door::Ajar, Door::Shut))
        }

        fn valid_transitions(&self) -> Vec<Self> {
            match self {
                Door::Open => vec![Door::Ajar],
                Door::Ajar => vec![Door::Shut],
                Door::Shut => vec![],
            }
        }
    }

    #[test]
    fn transition_to_follows_allowed_edge() {
        assert!(matches!(Door::Open.transition_to(Door::Ajar), Ok(Door::Ajar)));
    }

    #[test]
    fn transition_to_rejects_skipped_state() {
        let err = Door::Open.transition_to(Door::Shut).unwrap_err();
        assert!(err.to_string().contains("Cannot transition from Open to Shut"));
    }

    #[test]
    fn transition_to_rejects_going_backwards() {
        assert!(Door::Shut.transition_to(Door::Open).is_err());
    }

    #[test]
    fn only_the_last_state_is_terminal() {
        assert!(!Door::Open.is_terminal());
        assert!(!Door::Ajar.is_terminal());
        assert!(Door::Shut.is_terminal());
    }
}
