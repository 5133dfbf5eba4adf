//! Shared fixtures for gamer tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use anyhow::anyhow;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

use crate::gamer::strategy::{GameView, GamerStrategy};
use crate::gamer::GAMER_LOG_TARGET;
use crate::machine::{
    LedgerMachine, MachineState, Move, Role, Rule, RuleSet, Sentence, StateMachine,
    StateMachineError, EngineId,
};
use crate::record::Match;

pub(crate) fn two_player_rules() -> RuleSet {
    RuleSet::default()
        .with(Rule::Role { name: "white".into() })
        .with(Rule::Role { name: "black".into() })
        .with(Rule::Init { fact: "(control white)".into() })
        .with(Rule::Legal { role: "white".into(), action: "(mark 1)".into() })
        .with(Rule::Legal { role: "white".into(), action: "(mark 2)".into() })
        .with(Rule::Legal { role: "white".into(), action: "noop".into() })
        .with(Rule::Legal { role: "black".into(), action: "(mark 3)".into() })
        .with(Rule::Legal { role: "black".into(), action: "(mark 4)".into() })
        .with(Rule::Legal { role: "black".into(), action: "noop".into() })
        .with(Rule::StepLimit { steps: 8 })
}

pub(crate) fn test_match() -> Match {
    Match::new("test-match", two_player_rules(), Duration::from_secs(10), Duration::from_secs(5))
}

pub(crate) fn joint(sentences: &[&str]) -> Vec<Sentence> {
    sentences.iter().map(|s| Sentence::from(*s)).collect()
}

pub(crate) fn deadline() -> Instant {
    Instant::now() + Duration::from_secs(5)
}

/// Fresh ledger engine already fed the two-player rules.
pub(crate) fn initialized_ledger() -> Box<dyn StateMachine> {
    let mut machine = LedgerMachine::new();
    machine.initialize(&two_player_rules()).unwrap();
    Box::new(machine)
}

// =============================================================================
// PROBE MACHINE
// =============================================================================

/// Counters shared between a test and the probes it hands out.
#[derive(Clone, Debug, Default)]
pub(crate) struct ProbeCounters {
    pub per_move_work: Arc<AtomicUsize>,
    pub transitions: Arc<AtomicUsize>,
}

impl ProbeCounters {
    pub fn per_move_work(&self) -> usize {
        self.per_move_work.load(Ordering::SeqCst)
    }
}

/// Ledger engine with call counters and injectable failures.
pub(crate) struct ProbeMachine {
    inner: LedgerMachine,
    counters: ProbeCounters,
    /// Decoding this sentence fails.
    pub fail_decode: Option<Sentence>,
    /// The transition with this zero-based call index fails.
    pub fail_transition: Option<usize>,
}

impl ProbeMachine {
    pub fn new(counters: ProbeCounters) -> Self {
        Self {
            inner: LedgerMachine::new(),
            counters,
            fail_decode: None,
            fail_transition: None,
        }
    }

    fn count_transition(&self) -> Result<(), StateMachineError> {
        let call = self.counters.transitions.fetch_add(1, Ordering::SeqCst);
        if self.fail_transition == Some(call) {
            return Err(StateMachineError::TransitionDefinition(format!(
                "injected failure at transition {}",
                call
            )));
        }
        Ok(())
    }
}

impl StateMachine for ProbeMachine {
    fn id(&self) -> EngineId {
        self.inner.id()
    }

    fn name(&self) -> &str {
        "probe"
    }

    fn initialize(&mut self, rules: &RuleSet) -> Result<(), StateMachineError> {
        self.inner.initialize(rules)
    }

    fn initial_state(&self) -> Result<MachineState, StateMachineError> {
        self.inner.initial_state()
    }

    fn roles(&self) -> Result<Vec<Role>, StateMachineError> {
        self.inner.roles()
    }

    fn move_from_sentence(&self, sentence: &Sentence) -> Result<Move, StateMachineError> {
        if self.fail_decode.as_ref() == Some(sentence) {
            return Err(StateMachineError::MoveDefinition(format!("injected failure for {}", sentence)));
        }
        self.inner.move_from_sentence(sentence)
    }

    fn legal_moves(&self, state: &MachineState, role: &Role) -> Result<Vec<Move>, StateMachineError> {
        self.inner.legal_moves(state, role)
    }

    fn is_terminal(&self, state: &MachineState) -> Result<bool, StateMachineError> {
        self.inner.is_terminal(state)
    }

    fn next_state(
        &self,
        state: &MachineState,
        joint_move: &[Move],
    ) -> Result<MachineState, StateMachineError> {
        self.count_transition()?;
        self.inner.next_state(state, joint_move)
    }

    fn next_state_destructively(
        &self,
        state: MachineState,
        joint_move: &[Move],
    ) -> Result<MachineState, StateMachineError> {
        self.count_transition()?;
        self.inner.next_state_destructively(state, joint_move)
    }

    fn do_per_move_work(&mut self) {
        self.counters.per_move_work.fetch_add(1, Ordering::SeqCst);
    }
}

// =============================================================================
// PROBE STRATEGY
// =============================================================================

/// Strategy handing out probe engines, with injectable failures.
pub(crate) struct ProbeStrategy {
    pub counters: ProbeCounters,
    pub fail_decode: Option<Sentence>,
    pub fail_meta_game: bool,
    pub fail_select: bool,
    pub meta_game_calls: usize,
}

impl ProbeStrategy {
    pub fn new() -> Self {
        Self {
            counters: ProbeCounters::default(),
            fail_decode: None,
            fail_meta_game: false,
            fail_select: false,
            meta_game_calls: 0,
        }
    }
}

impl GamerStrategy for ProbeStrategy {
    fn name(&self) -> &str {
        "ProbeGamer"
    }

    fn initial_state_machine(&self) -> Box<dyn StateMachine> {
        let mut machine = ProbeMachine::new(self.counters.clone());
        machine.fail_decode = self.fail_decode.clone();
        Box::new(machine)
    }

    fn meta_game(&mut self, _view: &GameView<'_>, _deadline: Instant) -> anyhow::Result<()> {
        self.meta_game_calls += 1;
        if self.fail_meta_game {
            return Err(anyhow!("injected metagaming failure"));
        }
        Ok(())
    }

    fn select_move(&mut self, view: &GameView<'_>, _deadline: Instant) -> anyhow::Result<Move> {
        if self.fail_select {
            return Err(anyhow!("injected selection failure"));
        }
        view.legal_moves()?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("no legal moves"))
    }
}

// =============================================================================
// ERROR COUNTING
// =============================================================================

/// Counts error-level events on the gamer target.
struct ErrorCounter(Arc<AtomicUsize>);

impl<S: Subscriber> Layer<S> for ErrorCounter {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        if *meta.level() == Level::ERROR && meta.target() == GAMER_LOG_TARGET {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Run `f` and return its result with the number of gamer error traces it emitted.
pub(crate) fn count_gamer_errors<T>(f: impl FnOnce() -> T) -> (T, usize) {
    let count = Arc::new(AtomicUsize::new(0));
    let subscriber = tracing_subscriber::registry().with(ErrorCounter(count.clone()));
    let result = tracing::subscriber::with_default(subscriber, f);
    (result, count.load(Ordering::SeqCst))
}
