//! Ledger Machine
//!
//! Reference engine for declarative rule sets. A state holds the initial
//! facts, a `(step N)` counter, and one `(did ROLE ACTION N)` fact for every
//! move played so far, so two trajectories never share a state.
//!
//! ## Rule Interpretation
//!
//! - `Role`: participants, in joint-move order (at least one, no duplicates)
//! - `Init`: facts of the initial state
//! - `Legal`: the fixed action list per role (every role needs one)
//! - `StepLimit`: the game is terminal once `step` reaches the limit

use std::collections::{BTreeMap, BTreeSet};
use tracing::trace;

use crate::machine::engine::StateMachine;
use crate::machine::error::StateMachineError;
use crate::machine::types::{
    EngineId, MachineState, Move, Role, Rule, RuleSet, Sentence, StateContents,
};

const STEP_PREFIX: &str = "(step ";

/// Ingested rule set.
#[derive(Clone, Debug)]
struct LedgerRules {
    roles: Vec<String>,
    init: StateContents,
    legal: BTreeMap<String, Vec<Sentence>>,
    actions: BTreeSet<Sentence>,
    step_limit: Option<u32>,
}

impl LedgerRules {
    fn from_rule_set(rule_set: &RuleSet) -> Result<Self, StateMachineError> {
        let mut roles: Vec<String> = Vec::new();
        let mut init = StateContents::new();
        let mut legal: BTreeMap<String, Vec<Sentence>> = BTreeMap::new();
        let mut step_limit = None;

        for rule in rule_set.rules() {
            match rule {
                Rule::Role { name } => {
                    if roles.contains(name) {
                        return Err(StateMachineError::InvalidRuleSet(format!(
                            "role {} declared twice",
                            name
                        )));
                    }
                    roles.push(name.clone());
                }
                Rule::Init { fact } => {
                    if fact.as_str().starts_with(STEP_PREFIX) {
                        return Err(StateMachineError::InvalidRuleSet(
                            "step facts are reserved".to_string(),
                        ));
                    }
                    init.insert(fact.clone());
                }
                Rule::Legal { role, action } => {
                    let actions = legal.entry(role.clone()).or_default();
                    if !actions.contains(action) {
                        actions.push(action.clone());
                    }
                }
                Rule::StepLimit { steps } => {
                    if step_limit.replace(*steps).is_some() {
                        return Err(StateMachineError::InvalidRuleSet(
                            "step limit declared twice".to_string(),
                        ));
                    }
                }
            }
        }

        if roles.is_empty() {
            return Err(StateMachineError::InvalidRuleSet("no roles declared".to_string()));
        }
        if let Some(role) = legal.keys().find(|role| !roles.contains(role)) {
            return Err(StateMachineError::InvalidRuleSet(format!(
                "legal action for undeclared role {}",
                role
            )));
        }
        if let Some(role) = roles.iter().find(|role| !legal.contains_key(*role)) {
            return Err(StateMachineError::InvalidRuleSet(format!(
                "role {} has no legal actions",
                role
            )));
        }

        let actions = legal.values().flatten().cloned().collect();

        Ok(Self { roles, init, legal, actions, step_limit })
    }

    fn is_terminal_at(&self, step: u32) -> bool {
        self.step_limit.is_some_and(|limit| step >= limit)
    }
}

/// Declarative reference engine.
#[derive(Clone, Debug)]
pub struct LedgerMachine {
    id: EngineId,
    rules: Option<LedgerRules>,
}

impl Default for LedgerMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerMachine {
    /// Create an uninitialized machine with a fresh identity.
    pub fn new() -> Self {
        Self {
            id: EngineId::generate(),
            rules: None,
        }
    }

    fn rules(&self) -> Result<&LedgerRules, StateMachineError> {
        self.rules.as_ref().ok_or(StateMachineError::NotInitialized)
    }

    fn check_state(&self, state: &MachineState) -> Result<(), StateMachineError> {
        StateMachineError::check_origin("state", self.id, state.origin())
    }

    /// Apply a validated joint move to `contents` in place.
    fn advance_contents(
        &self,
        contents: &mut StateContents,
        joint_move: &[Move],
    ) -> Result<(), StateMachineError> {
        let rules = self.rules()?;
        let step = step_of(contents)?;

        if rules.is_terminal_at(step) {
            return Err(StateMachineError::TransitionDefinition(format!(
                "state at step {} is terminal",
                step
            )));
        }
        if joint_move.len() != rules.roles.len() {
            return Err(StateMachineError::TransitionDefinition(format!(
                "expected {} moves, got {}",
                rules.roles.len(),
                joint_move.len()
            )));
        }

        for (role, mv) in rules.roles.iter().zip(joint_move) {
            StateMachineError::check_origin("move", self.id, mv.origin())?;
            let legal = rules.legal.get(role).is_some_and(|actions| actions.contains(mv.contents()));
            if !legal {
                return Err(StateMachineError::TransitionDefinition(format!(
                    "{} is not legal for {}",
                    mv.contents(),
                    role
                )));
            }
        }

        contents.remove(&step_fact(step));
        for (role, mv) in rules.roles.iter().zip(joint_move) {
            contents.insert(Sentence::new(format!("(did {} {} {})", role, mv.contents(), step)));
        }
        contents.insert(step_fact(step + 1));

        Ok(())
    }
}

impl StateMachine for LedgerMachine {
    fn id(&self) -> EngineId {
        self.id
    }

    fn name(&self) -> &str {
        "ledger"
    }

    fn initialize(&mut self, rules: &RuleSet) -> Result<(), StateMachineError> {
        self.rules = Some(LedgerRules::from_rule_set(rules)?);
        Ok(())
    }

    fn initial_state(&self) -> Result<MachineState, StateMachineError> {
        let mut contents = self.rules()?.init.clone();
        contents.insert(step_fact(0));
        Ok(MachineState::new(self.id, contents))
    }

    fn roles(&self) -> Result<Vec<Role>, StateMachineError> {
        Ok(self
            .rules()?
            .roles
            .iter()
            .map(|name| Role::new(self.id, name.as_str()))
            .collect())
    }

    fn move_from_sentence(&self, sentence: &Sentence) -> Result<Move, StateMachineError> {
        if self.rules()?.actions.contains(sentence) {
            Ok(Move::new(self.id, sentence.clone()))
        } else {
            Err(StateMachineError::MoveDefinition(format!("unknown move {}", sentence)))
        }
    }

    fn legal_moves(&self, state: &MachineState, role: &Role) -> Result<Vec<Move>, StateMachineError> {
        self.check_state(state)?;
        StateMachineError::check_origin("role", self.id, role.origin())?;
        let rules = self.rules()?;

        if rules.is_terminal_at(step_of(state.contents())?) {
            return Ok(Vec::new());
        }

        let actions = rules
            .legal
            .get(role.name())
            .ok_or_else(|| StateMachineError::UnknownRole(role.name().to_string()))?;

        Ok(actions.iter().map(|action| Move::new(self.id, action.clone())).collect())
    }

    fn is_terminal(&self, state: &MachineState) -> Result<bool, StateMachineError> {
        self.check_state(state)?;
        Ok(self.rules()?.is_terminal_at(step_of(state.contents())?))
    }

    fn next_state(
        &self,
        state: &MachineState,
        joint_move: &[Move],
    ) -> Result<MachineState, StateMachineError> {
        self.check_state(state)?;
        let mut contents = state.contents().clone();
        self.advance_contents(&mut contents, joint_move)?;
        Ok(MachineState::new(self.id, contents))
    }

    fn next_state_destructively(
        &self,
        state: MachineState,
        joint_move: &[Move],
    ) -> Result<MachineState, StateMachineError> {
        self.check_state(&state)?;
        let mut contents = state.into_contents();
        self.advance_contents(&mut contents, joint_move)?;
        Ok(MachineState::new(self.id, contents))
    }

    fn do_per_move_work(&mut self) {
        trace!(engine = %self.id, "ledger per-move work");
    }
}

fn step_fact(step: u32) -> Sentence {
    Sentence::new(format!("{}{})", STEP_PREFIX, step))
}

/// Read the `(step N)` counter out of state contents.
fn step_of(contents: &StateContents) -> Result<u32, StateMachineError> {
    contents
        .iter()
        .find_map(|fact| {
            fact.as_str()
                .strip_prefix(STEP_PREFIX)
                .and_then(|rest| rest.strip_suffix(')'))
                .and_then(|n| n.parse().ok())
        })
        .ok_or_else(|| StateMachineError::MalformedState("missing step fact".to_string()))
}
