//! Pluggable gamer strategies.
//!
//! A strategy decides which engine a gamer uses, what to do during
//! metagaming, and which move to play. The gamer handles all state
//! bookkeeping around these calls; a strategy only ever sees a read-only
//! [`GameView`] of the synchronized triple.

use std::time::Instant;
use anyhow::{anyhow, Context};
use tracing::debug;

use crate::config::GamerConfig;
use crate::core::rng::DeterministicRng;
use crate::gamer::triple::StateTriple;
use crate::machine::engine::StateMachine;
use crate::machine::error::StateMachineError;
use crate::machine::types::{MachineState, Move, Role};
use crate::record::game_match::Match;

/// Read-only view of the synchronized game position.
#[derive(Clone, Copy)]
pub struct GameView<'a> {
    /// Role this gamer plays.
    pub role: &'a Role,
    /// Current state.
    pub state: &'a MachineState,
    /// Installed engine.
    pub machine: &'a dyn StateMachine,
    /// Match record.
    pub game_match: &'a Match,
}

impl<'a> GameView<'a> {
    /// View over an installed triple.
    pub fn new(triple: &'a StateTriple, game_match: &'a Match) -> Self {
        Self {
            role: triple.role(),
            state: triple.state(),
            machine: triple.machine(),
            game_match,
        }
    }

    /// Legal moves for our role in the current state.
    pub fn legal_moves(&self) -> Result<Vec<Move>, StateMachineError> {
        self.machine.legal_moves(self.state, self.role)
    }
}

/// Move-selection and metagaming behavior.
pub trait GamerStrategy: Send {
    /// Name reported to the game manager.
    fn name(&self) -> &str;

    /// Engine to use for a new match. Must be uninitialized.
    fn initial_state_machine(&self) -> Box<dyn StateMachine>;

    /// Setup work during the start clock.
    fn meta_game(&mut self, _view: &GameView<'_>, _deadline: Instant) -> anyhow::Result<()> {
        Ok(())
    }

    /// Choose this turn's move from the current position.
    fn select_move(&mut self, view: &GameView<'_>, deadline: Instant) -> anyhow::Result<Move>;
}

// =============================================================================
// LEGAL STRATEGY
// =============================================================================

/// Always plays the first legal move.
#[derive(Clone, Debug)]
pub struct LegalStrategy {
    config: GamerConfig,
}

impl LegalStrategy {
    /// Create from configuration.
    pub fn new(config: GamerConfig) -> Self {
        Self { config }
    }
}

impl GamerStrategy for LegalStrategy {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn initial_state_machine(&self) -> Box<dyn StateMachine> {
        self.config.build_machine()
    }

    fn select_move(&mut self, view: &GameView<'_>, _deadline: Instant) -> anyhow::Result<Move> {
        view.legal_moves()
            .context("enumerating legal moves")?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("no legal moves for {}", view.role))
    }
}

// =============================================================================
// RANDOM STRATEGY
// =============================================================================

/// Plays a uniformly random legal move from a seeded RNG.
#[derive(Clone, Debug)]
pub struct RandomStrategy {
    config: GamerConfig,
    rng: DeterministicRng,
}

impl RandomStrategy {
    /// Create from configuration; the RNG is seeded from `config.seed`.
    pub fn new(config: GamerConfig) -> Self {
        let rng = DeterministicRng::new(config.seed);
        Self { config, rng }
    }
}

impl GamerStrategy for RandomStrategy {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn initial_state_machine(&self) -> Box<dyn StateMachine> {
        self.config.build_machine()
    }

    fn select_move(&mut self, view: &GameView<'_>, _deadline: Instant) -> anyhow::Result<Move> {
        let legal = view.legal_moves().context("enumerating legal moves")?;
        let chosen = self
            .rng
            .choose(&legal)
            .cloned()
            .ok_or_else(|| anyhow!("no legal moves for {}", view.role))?;
        debug!(role = %view.role, options = legal.len(), chosen = %chosen.contents(), "random move");
        Ok(chosen)
    }
}
