//! Cached State Machine
//!
//! Decorator that memoizes `next_state` results of any engine. The cache is
//! keyed by the state fingerprint and the joint move, and is evicted from the
//! per-turn hook once it grows past its capacity.
//!
//! The decorator reports the wrapped engine's identity: it owns the inner
//! engine exclusively, so both are one engine instance from the outside.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use tracing::debug;

use crate::core::hash::{StateHash, StateHasher};
use crate::machine::engine::StateMachine;
use crate::machine::error::StateMachineError;
use crate::machine::types::{EngineId, MachineState, Move, Role, RuleSet, Sentence};

/// Default number of cached transitions before eviction.
pub const DEFAULT_CACHE_CAPACITY: usize = 4096;

/// Cache counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups forwarded to the inner engine.
    pub misses: u64,
    /// Transitions currently cached.
    pub entries: usize,
}

/// Memoizing wrapper around another engine.
pub struct CachedStateMachine {
    inner: Box<dyn StateMachine>,
    name: String,
    capacity: usize,
    transitions: RefCell<BTreeMap<StateHash, MachineState>>,
    hits: Cell<u64>,
    misses: Cell<u64>,
}

impl CachedStateMachine {
    /// Wrap `inner` with the default capacity.
    pub fn new(inner: Box<dyn StateMachine>) -> Self {
        Self::with_capacity(inner, DEFAULT_CACHE_CAPACITY)
    }

    /// Wrap `inner`, evicting once more than `capacity` transitions are cached.
    pub fn with_capacity(inner: Box<dyn StateMachine>, capacity: usize) -> Self {
        let name = format!("cached({})", inner.name());
        Self {
            inner,
            name,
            capacity,
            transitions: RefCell::new(BTreeMap::new()),
            hits: Cell::new(0),
            misses: Cell::new(0),
        }
    }

    /// Current cache counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.get(),
            misses: self.misses.get(),
            entries: self.transitions.borrow().len(),
        }
    }

    fn lookup(&self, key: &StateHash) -> Option<MachineState> {
        let cached = self.transitions.borrow().get(key).cloned();
        match cached {
            Some(_) => self.hits.set(self.hits.get() + 1),
            None => self.misses.set(self.misses.get() + 1),
        }
        cached
    }

    fn check_origins(&self, state: &MachineState, joint_move: &[Move]) -> Result<(), StateMachineError> {
        let id = self.id();
        StateMachineError::check_origin("state", id, state.origin())?;
        for mv in joint_move {
            StateMachineError::check_origin("move", id, mv.origin())?;
        }
        Ok(())
    }

    fn store(&self, key: StateHash, state: &MachineState) {
        self.transitions.borrow_mut().insert(key, state.clone());
    }
}

/// Key for one transition: state fingerprint followed by the joint move.
fn transition_key(state: &MachineState, joint_move: &[Move]) -> StateHash {
    let mut hasher = StateHasher::for_joint_move();
    hasher.update_bytes(&state.fingerprint());
    hasher.update_u64(joint_move.len() as u64);
    for mv in joint_move {
        hasher.update_str(mv.contents().as_str());
    }
    hasher.finalize()
}

impl StateMachine for CachedStateMachine {
    fn id(&self) -> EngineId {
        self.inner.id()
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn initialize(&mut self, rules: &RuleSet) -> Result<(), StateMachineError> {
        self.transitions.get_mut().clear();
        self.inner.initialize(rules)
    }

    fn initial_state(&self) -> Result<MachineState, StateMachineError> {
        self.inner.initial_state()
    }

    fn roles(&self) -> Result<Vec<Role>, StateMachineError> {
        self.inner.roles()
    }

    fn role_from_name(&self, name: &str) -> Result<Role, StateMachineError> {
        self.inner.role_from_name(name)
    }

    fn move_from_sentence(&self, sentence: &Sentence) -> Result<Move, StateMachineError> {
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
        // Foreign values must never be answered from the cache.
        self.check_origins(state, joint_move)?;
        let key = transition_key(state, joint_move);
        if let Some(cached) = self.lookup(&key) {
            return Ok(cached);
        }
        let next = self.inner.next_state(state, joint_move)?;
        self.store(key, &next);
        Ok(next)
    }

    fn next_state_destructively(
        &self,
        state: MachineState,
        joint_move: &[Move],
    ) -> Result<MachineState, StateMachineError> {
        self.check_origins(&state, joint_move)?;
        let key = transition_key(&state, joint_move);
        if let Some(cached) = self.lookup(&key) {
            return Ok(cached);
        }
        let next = self.inner.next_state_destructively(state, joint_move)?;
        self.store(key, &next);
        Ok(next)
    }

    fn do_per_move_work(&mut self) {
        self.inner.do_per_move_work();

        let transitions = self.transitions.get_mut();
        if transitions.len() > self.capacity {
            debug!(
                engine = %self.inner.id(),
                entries = transitions.len(),
                capacity = self.capacity,
                "evicting transition cache"
            );
            transitions.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::ledger::LedgerMachine;
    use crate::machine::types::Rule;

    fn rules() -> RuleSet {
        RuleSet::default()
            .with(Rule::Role { name: "white".into() })
            .with(Rule::Role { name: "black".into() })
            .with(Rule::Legal { role: "white".into(), action: "noop".into() })
            .with(Rule::Legal { role: "white".into(), action: "(mark 1)".into() })
            .with(Rule::Legal { role: "black".into(), action: "noop".into() })
    }

    fn cached(capacity: usize) -> CachedStateMachine {
        let mut machine = CachedStateMachine::with_capacity(Box::new(LedgerMachine::new()), capacity);
        machine.initialize(&rules()).unwrap();
        machine
    }

    fn joint(machine: &dyn StateMachine, sentences: &[&str]) -> Vec<Move> {
        sentences
            .iter()
            .map(|s| machine.move_from_sentence(&Sentence::from(*s)).unwrap())
            .collect()
    }

    #[test]
    fn test_shares_inner_identity() {
        let inner = LedgerMachine::new();
        let inner_id = inner.id();
        let machine = CachedStateMachine::new(Box::new(inner));

        assert_eq!(machine.id(), inner_id);
        assert_eq!(machine.name(), "cached(ledger)");
    }

    #[test]
    fn test_cache_hit_returns_same_state() {
        let machine = cached(16);
        let initial = machine.initial_state().unwrap();
        let moves = joint(&machine, &["(mark 1)", "noop"]);

        let first = machine.next_state(&initial, &moves).unwrap();
        let second = machine.next_state(&initial, &moves).unwrap();

        assert_eq!(first, second);
        assert_eq!(machine.stats(), CacheStats { hits: 1, misses: 1, entries: 1 });
    }

    #[test]
    fn test_cached_matches_uncached() {
        let machine = cached(16);
        let mut plain = LedgerMachine::new();
        plain.initialize(&rules()).unwrap();

        let mut cached_state = machine.initial_state().unwrap();
        let mut plain_state = plain.initial_state().unwrap();
        for sentences in [["noop", "noop"], ["(mark 1)", "noop"], ["noop", "noop"]] {
            cached_state = machine
                .next_state_destructively(cached_state, &joint(&machine, &sentences))
                .unwrap();
            plain_state = plain.next_state(&plain_state, &joint(&plain, &sentences)).unwrap();
        }

        assert_eq!(cached_state.contents(), plain_state.contents());
    }

    #[test]
    fn test_errors_are_not_cached() {
        let machine = cached(16);
        let initial = machine.initial_state().unwrap();
        let bad = joint(&machine, &["noop"]);

        assert!(machine.next_state(&initial, &bad).is_err());
        assert_eq!(machine.stats().entries, 0);
    }

    #[test]
    fn test_per_move_work_evicts_over_capacity() {
        let mut machine = cached(1);
        let initial = machine.initial_state().unwrap();

        machine.next_state(&initial, &joint(&machine, &["noop", "noop"])).unwrap();
        machine.do_per_move_work();
        assert_eq!(machine.stats().entries, 1);

        machine.next_state(&initial, &joint(&machine, &["(mark 1)", "noop"])).unwrap();
        machine.do_per_move_work();
        assert_eq!(machine.stats().entries, 0);
    }

    #[test]
    fn test_foreign_state_rejected_before_cache() {
        let machine = cached(16);
        let other = cached(16);
        let foreign = other.initial_state().unwrap();

        let result = machine.next_state(&foreign, &joint(&machine, &["noop", "noop"]));
        assert!(matches!(result, Err(StateMachineError::ForeignValue { kind: "state", .. })));
        assert_eq!(machine.stats().misses, 0);
    }

    #[test]
    fn test_foreign_move_rejected_after_warm_cache() {
        let machine = cached(16);
        let other = cached(16);
        let initial = machine.initial_state().unwrap();

        machine.next_state(&initial, &joint(&machine, &["noop", "noop"])).unwrap();
        let foreign = joint(&other, &["noop", "noop"]);

        let result = machine.next_state(&initial, &foreign);
        assert!(matches!(result, Err(StateMachineError::ForeignValue { kind: "move", .. })));
        let result = machine.next_state_destructively(initial, &foreign);
        assert!(matches!(result, Err(StateMachineError::ForeignValue { kind: "move", .. })));
        assert_eq!(machine.stats().hits, 0);
    }
}
