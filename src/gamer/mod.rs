//! State-machine gamer.
//!
//! Keeps one authoritative (role, state, engine) triple in step with the
//! match record across metagaming, turns, and engine switches.
//!
//! ## Module Structure
//!
//! - `triple`: The (role, state, engine) consistency unit
//! - `state_machine_gamer`: Initialization, turn advancement, migration, teardown
//! - `strategy`: Pluggable metagaming and move selection
//! - `error`: Boundary and internal error kinds

pub mod triple;
pub mod state_machine_gamer;
pub mod strategy;
pub mod error;

#[cfg(test)]
pub(crate) mod testing;

/// Tracing target for every failure trace the gamer emits.
pub const GAMER_LOG_TARGET: &str = "GamePlayer";

// Re-export key types
pub use triple::StateTriple;
pub use state_machine_gamer::StateMachineGamer;
pub use strategy::{GameView, GamerStrategy, LegalStrategy, RandomStrategy};
pub use error::{GamerError, MetaGamingError, MigrationError, MoveSelectionError};
