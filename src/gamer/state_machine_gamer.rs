//! State Machine Gamer
//!
//! Wraps a [`GamerStrategy`] with the bookkeeping that keeps a state-machine
//! view of the match up to date:
//!
//! - `meta_game`: build the engine, initial state and role, then metagame
//! - `select_move`: apply the last joint move, then let the strategy choose
//! - `switch_state_machine`: rebuild the triple under another engine by replay
//! - `cleanup_after_match`: drop everything when the gamer is recycled
//!
//! ## Failure Policy
//!
//! Internal failures are logged against [`GAMER_LOG_TARGET`] and collapsed
//! into [`MetaGamingError`] or [`MoveSelectionError`]. A failed engine switch
//! is logged and otherwise invisible; the old engine stays installed.
//!
//! ## Concurrency
//!
//! Every operation takes `&mut self`. Nothing here locks; a gamer shared
//! between threads needs external mutual exclusion.

use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

use crate::core::hash::short_hex;
use crate::gamer::error::{GamerError, MetaGamingError, MigrationError, MoveSelectionError};
use crate::gamer::strategy::{GameView, GamerStrategy};
use crate::gamer::triple::StateTriple;
use crate::gamer::GAMER_LOG_TARGET;
use crate::machine::engine::{decode_joint_move, StateMachine};
use crate::machine::error::StateMachineError;
use crate::machine::types::{MachineState, Role, Sentence};
use crate::record::game_match::Match;

/// A gamer that tracks the match as a state machine.
pub struct StateMachineGamer<S: GamerStrategy> {
    /// Metagaming and move selection.
    strategy: S,
    /// Match being played.
    game_match: Option<Match>,
    /// Role name assigned by the game manager.
    role_name: Option<String>,
    /// Synchronized view (after metagaming).
    triple: Option<StateTriple>,
}

impl<S: GamerStrategy> StateMachineGamer<S> {
    /// Create an idle gamer.
    pub fn new(strategy: S) -> Self {
        Self {
            strategy,
            game_match: None,
            role_name: None,
            triple: None,
        }
    }

    /// Name reported to the game manager.
    pub fn name(&self) -> &str {
        self.strategy.name()
    }

    /// Attach the match to play.
    pub fn set_match(&mut self, game_match: Match) {
        self.game_match = Some(game_match);
    }

    /// Attached match.
    pub fn game_match(&self) -> Option<&Match> {
        self.game_match.as_ref()
    }

    /// Attached match, for the outer lifecycle to record moves.
    pub fn game_match_mut(&mut self) -> Option<&mut Match> {
        self.game_match.as_mut()
    }

    /// Assign the role name to play.
    pub fn set_role_name(&mut self, role_name: impl Into<String>) {
        self.role_name = Some(role_name.into());
    }

    /// Assigned role name.
    pub fn role_name(&self) -> Option<&str> {
        self.role_name.as_deref()
    }

    /// The strategy.
    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// The strategy, mutably.
    pub fn strategy_mut(&mut self) -> &mut S {
        &mut self.strategy
    }

    /// Current state; `None` before metagaming.
    pub fn current_state(&self) -> Option<&MachineState> {
        self.triple.as_ref().map(StateTriple::state)
    }

    /// Current role; `None` before metagaming.
    pub fn role(&self) -> Option<&Role> {
        self.triple.as_ref().map(StateTriple::role)
    }

    /// Installed engine; `None` before metagaming.
    pub fn state_machine(&self) -> Option<&dyn StateMachine> {
        self.triple.as_ref().map(StateTriple::machine)
    }

    /// The whole triple; `None` before metagaming.
    pub fn triple(&self) -> Option<&StateTriple> {
        self.triple.as_ref()
    }

    // =========================================================================
    // INITIALIZATION
    // =========================================================================

    /// Start the match: install a fresh triple, record the initial state,
    /// then run the strategy's metagaming.
    #[instrument(skip_all, fields(player = %self.strategy.name()))]
    pub fn meta_game(&mut self, deadline: Instant) -> Result<(), MetaGamingError> {
        self.try_meta_game(deadline).map_err(|err| {
            error!(target: GAMER_LOG_TARGET, error = %err, details = ?err, "metagaming failed");
            MetaGamingError
        })
    }

    fn try_meta_game(&mut self, deadline: Instant) -> Result<(), GamerError> {
        self.initialize()?;

        let triple = self.triple.as_ref().ok_or(GamerError::NotInitialized)?;
        let game_match = self.game_match.as_ref().ok_or(GamerError::NoMatch)?;
        self.strategy
            .meta_game(&GameView::new(triple, game_match), deadline)
            .map_err(GamerError::Strategy)
    }

    /// Build and install the triple. Nothing is touched unless every step succeeds.
    fn initialize(&mut self) -> Result<(), GamerError> {
        let game_match = self.game_match.as_mut().ok_or(GamerError::NoMatch)?;
        let role_name = self.role_name.as_deref().ok_or(GamerError::NoRoleName)?;

        let mut machine = self.strategy.initial_state_machine();
        machine.initialize(&game_match.rules)?;
        let state = machine.initial_state()?;
        let role = machine.role_from_name(role_name)?;
        let triple = StateTriple::new(role, state, machine)?;

        game_match.append_state(triple.state().contents().clone());
        info!(
            engine = %triple.machine().id(),
            machine = triple.machine().name(),
            role = %triple.role(),
            state = %short_hex(&triple.state().fingerprint()),
            "installed initial state"
        );

        self.triple = Some(triple);
        Ok(())
    }

    // =========================================================================
    // TURN ADVANCEMENT
    // =========================================================================

    /// Apply the last joint move (if any), then let the strategy choose.
    ///
    /// Returns the chosen move's external sentence.
    #[instrument(skip_all, fields(player = %self.strategy.name()))]
    pub fn select_move(&mut self, deadline: Instant) -> Result<Sentence, MoveSelectionError> {
        self.try_select_move(deadline).map_err(|err| {
            error!(target: GAMER_LOG_TARGET, error = %err, details = ?err, "move selection failed");
            MoveSelectionError
        })
    }

    /// Apply the final joint move once the match is over, without selecting.
    #[instrument(skip_all, fields(player = %self.strategy.name()))]
    pub fn stop(&mut self) -> Result<(), MoveSelectionError> {
        self.advance().map_err(|err| {
            error!(target: GAMER_LOG_TARGET, error = %err, details = ?err, "final advancement failed");
            MoveSelectionError
        })
    }

    fn try_select_move(&mut self, deadline: Instant) -> Result<Sentence, GamerError> {
        self.advance()?;

        let triple = self.triple.as_ref().ok_or(GamerError::NotInitialized)?;
        let game_match = self.game_match.as_ref().ok_or(GamerError::NoMatch)?;
        let chosen = self
            .strategy
            .select_move(&GameView::new(triple, game_match), deadline)
            .map_err(GamerError::Strategy)?;
        StateMachineError::check_origin("move", triple.machine().id(), chosen.origin())?;

        debug!(role = %triple.role(), chosen = %chosen.contents(), "selected move");
        Ok(chosen.into_contents())
    }

    /// Bring the triple up to the most recent joint move.
    ///
    /// The per-move hook runs exactly once, before decoding, whether or not
    /// there is a move to apply. The state is only replaced once the whole
    /// transition succeeded.
    fn advance(&mut self) -> Result<(), GamerError> {
        let triple = self.triple.as_mut().ok_or(GamerError::NotInitialized)?;
        let game_match = self.game_match.as_mut().ok_or(GamerError::NoMatch)?;

        triple.machine_mut().do_per_move_work();

        let Some(last_moves) = game_match.most_recent_moves() else {
            debug!("no moves played yet; state unchanged");
            return Ok(());
        };

        let joint_move = decode_joint_move(triple.machine(), last_moves)?;
        let next = triple.machine().next_state(triple.state(), &joint_move)?;
        let contents = next.contents().clone();
        triple.set_state(next)?;
        game_match.append_state(contents);

        debug!(
            turn = game_match.turn_count(),
            state = %short_hex(&triple.state().fingerprint()),
            "advanced state"
        );
        Ok(())
    }

    // =========================================================================
    // ENGINE MIGRATION
    // =========================================================================

    /// Switch to `new_machine`, replaying the match history so the current
    /// state is expressed by the new engine.
    ///
    /// `new_machine` must already be initialized with the match rules. Call
    /// this when the triple is in step with the move history (after the
    /// turn's advancement). On any failure the old triple stays installed and
    /// the error is only logged.
    ///
    /// Not synchronized with the other operations of this gamer.
    #[instrument(skip_all, fields(player = %self.strategy.name()))]
    pub fn switch_state_machine(&mut self, new_machine: Box<dyn StateMachine>) {
        match self.replay_history(new_machine) {
            Ok(triple) => {
                info!(
                    engine = %triple.machine().id(),
                    machine = triple.machine().name(),
                    state = %short_hex(&triple.state().fingerprint()),
                    "switched state machine"
                );
                self.triple = Some(triple);
            }
            Err(err) => {
                error!(
                    target: GAMER_LOG_TARGET,
                    error = %err,
                    details = ?err,
                    "caught an error while switching state machine"
                );
            }
        }
    }

    /// Rebuild a triple under `machine` from the recorded move history.
    fn replay_history(&self, machine: Box<dyn StateMachine>) -> Result<StateTriple, MigrationError> {
        if self.triple.is_none() {
            return Err(MigrationError::NotInitialized);
        }
        let game_match = self.game_match.as_ref().ok_or(MigrationError::NoMatch)?;
        let role_name = self.role_name.as_deref().ok_or(MigrationError::NoRoleName)?;

        if game_match.state_history().len() != game_match.turn_count() + 1 {
            warn!(
                turns = game_match.turn_count(),
                states = game_match.state_history().len(),
                "move history is ahead of the installed state"
            );
        }

        let mut state = machine.initial_state().map_err(MigrationError::InitialState)?;
        let role = machine.role_from_name(role_name).map_err(|source| MigrationError::Role {
            name: role_name.to_string(),
            source,
        })?;

        for (turn, sentences) in game_match.move_history().iter().enumerate() {
            let joint_move = decode_joint_move(machine.as_ref(), sentences)
                .map_err(|source| MigrationError::Replay { turn, source })?;
            state = machine
                .next_state_destructively(state, &joint_move)
                .map_err(|source| MigrationError::Replay { turn, source })?;

            #[cfg(feature = "debug-tracing")]
            tracing::trace!(turn, state = %short_hex(&state.fingerprint()), "replayed turn");
        }

        StateTriple::new(role, state, machine).map_err(MigrationError::Inconsistent)
    }

    // =========================================================================
    // TEARDOWN
    // =========================================================================

    /// Clear the triple.
    pub fn reset(&mut self) {
        self.triple = None;
    }

    /// Clear the triple, the match and the role name.
    ///
    /// Only needed when the gamer is reused for another match.
    pub fn cleanup_after_match(&mut self) {
        self.reset();
        self.game_match = None;
        self.role_name = None;
    }
}
