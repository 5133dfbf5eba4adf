//! State machine trait for rules-evaluation engines.
//!
//! Engines implement `StateMachine` to define:
//! - How a rule set becomes an initial state and a list of roles
//! - How external move sentences decode into moves
//! - How a joint move transforms one state into the next
//!
//! The gamer calls into `StateMachine` through a trait object and never
//! interprets game-specific facts itself.

use crate::machine::error::StateMachineError;
use crate::machine::types::{EngineId, MachineState, Move, Role, RuleSet, Sentence};

/// Rules-evaluation engine.
///
/// ## Implementation Notes
///
/// - Every value an engine returns must carry its own [`EngineId`].
/// - `next_state` must be deterministic: replaying the same moves from the
///   initial state must reproduce the same contents.
/// - `next_state_destructively` may reuse its input; callers never look at
///   the input again.
/// - `do_per_move_work` is called exactly once per turn, before any move of
///   that turn is decoded.
pub trait StateMachine: Send {
    /// Identity of this engine instance.
    fn id(&self) -> EngineId;

    /// Human-readable engine name, for logs.
    fn name(&self) -> &str;

    /// Ingest a rule set. Must be called before any other query.
    fn initialize(&mut self, rules: &RuleSet) -> Result<(), StateMachineError>;

    /// Build the initial state of the game.
    fn initial_state(&self) -> Result<MachineState, StateMachineError>;

    /// All roles, in joint-move order.
    fn roles(&self) -> Result<Vec<Role>, StateMachineError>;

    /// Decode an external move sentence.
    fn move_from_sentence(&self, sentence: &Sentence) -> Result<Move, StateMachineError>;

    /// Legal moves for `role` in `state`. Empty in terminal states.
    fn legal_moves(&self, state: &MachineState, role: &Role) -> Result<Vec<Move>, StateMachineError>;

    /// Whether the game is over in `state`.
    fn is_terminal(&self, state: &MachineState) -> Result<bool, StateMachineError>;

    /// Compute the successor of `state` under `joint_move`.
    fn next_state(
        &self,
        state: &MachineState,
        joint_move: &[Move],
    ) -> Result<MachineState, StateMachineError>;

    /// Like `next_state`, but allowed to consume `state`.
    fn next_state_destructively(
        &self,
        state: MachineState,
        joint_move: &[Move],
    ) -> Result<MachineState, StateMachineError> {
        self.next_state(&state, joint_move)
    }

    /// Per-turn bookkeeping hook.
    fn do_per_move_work(&mut self) {}

    // === Convenience Methods ===

    /// Resolve a role by name.
    fn role_from_name(&self, name: &str) -> Result<Role, StateMachineError> {
        self.roles()?
            .into_iter()
            .find(|role| role.name() == name)
            .ok_or_else(|| StateMachineError::UnknownRole(name.to_string()))
    }
}

/// Decode one joint move, one sentence per participant, in order.
pub fn decode_joint_move(
    machine: &dyn StateMachine,
    sentences: &[Sentence],
) -> Result<Vec<Move>, StateMachineError> {
    sentences
        .iter()
        .map(|sentence| machine.move_from_sentence(sentence))
        .collect()
}
