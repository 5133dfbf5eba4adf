//! Gamer errors.
//!
//! Only [`MetaGamingError`] and [`MoveSelectionError`] cross the gamer's
//! public boundary. The richer internal kinds are logged and then collapsed.

use crate::machine::error::StateMachineError;

/// Metagaming (match start) failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("metagaming failed")]
pub struct MetaGamingError;

/// Advancing or selecting a move failed for this turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("move selection failed")]
pub struct MoveSelectionError;

/// Internal failure of an initialization or turn.
#[derive(Debug, thiserror::Error)]
pub enum GamerError {
    /// No match attached.
    #[error("no match attached")]
    NoMatch,

    /// No role name assigned.
    #[error("no role name assigned")]
    NoRoleName,

    /// Metagaming has not completed.
    #[error("gamer not initialized")]
    NotInitialized,

    /// Engine failure.
    #[error(transparent)]
    Machine(#[from] StateMachineError),

    /// Strategy failure.
    #[error("strategy failed: {0:#}")]
    Strategy(anyhow::Error),
}

/// Internal failure while switching state machines.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    /// Nothing to migrate yet.
    #[error("gamer not initialized")]
    NotInitialized,

    /// No match attached.
    #[error("no match attached")]
    NoMatch,

    /// No role name assigned.
    #[error("no role name assigned")]
    NoRoleName,

    /// The new engine could not build its initial state.
    #[error("initial state failed: {0}")]
    InitialState(#[source] StateMachineError),

    /// The new engine does not know our role.
    #[error("role {name} not resolvable: {source}")]
    Role {
        /// Role name looked up.
        name: String,
        /// Engine error.
        source: StateMachineError,
    },

    /// Replaying one recorded turn failed.
    #[error("replay failed at turn {turn}: {source}")]
    Replay {
        /// Zero-based turn index into the move history.
        turn: usize,
        /// Engine error.
        source: StateMachineError,
    },

    /// The new engine returned values it does not own.
    #[error("inconsistent triple: {0}")]
    Inconsistent(#[source] StateMachineError),
}
