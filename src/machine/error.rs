//! State machine errors.

use crate::machine::types::EngineId;

/// Errors raised by a state machine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateMachineError {
    /// The machine has not been fed a rule set yet.
    #[error("state machine not initialized")]
    NotInitialized,

    /// The rule set could not be ingested.
    #[error("invalid rule set: {0}")]
    InvalidRuleSet(String),

    /// No role with this name exists.
    #[error("unknown role: {0}")]
    UnknownRole(String),

    /// A sentence does not denote any move of this game.
    #[error("move definition error: {0}")]
    MoveDefinition(String),

    /// The joint move cannot be applied to the state.
    #[error("transition definition error: {0}")]
    TransitionDefinition(String),

    /// A state is missing facts the machine relies on.
    #[error("malformed state: {0}")]
    MalformedState(String),

    /// A value produced by another engine instance was passed in.
    #[error("{kind} from engine {got} passed to engine {expected}")]
    ForeignValue {
        /// Kind of value ("state", "role", "move").
        kind: &'static str,
        /// This engine.
        expected: EngineId,
        /// Engine that produced the value.
        got: EngineId,
    },
}

impl StateMachineError {
    /// Fail with [`StateMachineError::ForeignValue`] unless `got == expected`.
    pub fn check_origin(
        kind: &'static str,
        expected: EngineId,
        got: EngineId,
    ) -> Result<(), StateMachineError> {
        if expected == got {
            Ok(())
        } else {
            Err(StateMachineError::ForeignValue { kind, expected, got })
        }
    }
}
