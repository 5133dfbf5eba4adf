//! Machine Value Types
//!
//! Opaque values handed out by a state machine. Every state, role and move
//! is tagged with the [`EngineId`] of the engine instance that produced it,
//! so values from two engines can never be mixed silently.

use std::collections::BTreeSet;
use std::fmt;
use serde::{Serialize, Deserialize};

use crate::core::hash::{StateHash, StateHasher, hash_sentences};

// =============================================================================
// SENTENCE
// =============================================================================

/// External representation of a fact or a move.
///
/// This is the engine-independent form that travels over the wire and is
/// written to the match record, e.g. `(mark 1 1)` or `noop`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sentence(String);

impl Sentence {
    /// Wrap a sentence string.
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Borrow the sentence text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Sentence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Sentence {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for Sentence {
    fn from(text: String) -> Self {
        Self(text)
    }
}

/// External representation of a full game position.
pub type StateContents = BTreeSet<Sentence>;

// =============================================================================
// ENGINE ID
// =============================================================================

/// Identity of one state machine instance (UUID as bytes).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EngineId(pub [u8; 16]);

impl EngineId {
    /// Generate a fresh random identity.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().into_bytes())
    }
}

impl fmt::Display for EngineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.0[..4]))
    }
}

// =============================================================================
// MACHINE STATE
// =============================================================================

/// Immutable snapshot of a game position, as produced by one engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MachineState {
    contents: StateContents,
    origin: EngineId,
}

impl MachineState {
    /// Create a state owned by `origin`.
    pub fn new(origin: EngineId, contents: StateContents) -> Self {
        Self { contents, origin }
    }

    /// External representation of this state.
    pub fn contents(&self) -> &StateContents {
        &self.contents
    }

    /// Consume the state, returning its contents.
    pub fn into_contents(self) -> StateContents {
        self.contents
    }

    /// Engine instance that produced this state.
    pub fn origin(&self) -> EngineId {
        self.origin
    }

    /// Engine-independent fingerprint of the contents.
    ///
    /// Two states with equal contents have equal fingerprints regardless of
    /// which engine produced them.
    pub fn fingerprint(&self) -> StateHash {
        hash_contents(&self.contents)
    }
}

/// Fingerprint raw state contents.
pub fn hash_contents(contents: &StateContents) -> StateHash {
    hash_sentences(
        StateHasher::for_machine_state(),
        contents.iter().map(Sentence::as_str),
    )
}

// =============================================================================
// ROLE
// =============================================================================

/// A participant, as resolved by one engine.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Role {
    name: String,
    origin: EngineId,
}

impl Role {
    /// Create a role owned by `origin`.
    pub fn new(origin: EngineId, name: impl Into<String>) -> Self {
        Self { name: name.into(), origin }
    }

    /// Role name as written in the rule set.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Engine instance that resolved this role.
    pub fn origin(&self) -> EngineId {
        self.origin
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

// =============================================================================
// MOVE
// =============================================================================

/// A decoded action, as understood by one engine.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Move {
    contents: Sentence,
    origin: EngineId,
}

impl Move {
    /// Create a move owned by `origin`.
    pub fn new(origin: EngineId, contents: Sentence) -> Self {
        Self { contents, origin }
    }

    /// External representation of this move.
    pub fn contents(&self) -> &Sentence {
        &self.contents
    }

    /// Consume the move, returning its external representation.
    pub fn into_contents(self) -> Sentence {
        self.contents
    }

    /// Engine instance that decoded this move.
    pub fn origin(&self) -> EngineId {
        self.origin
    }
}

// =============================================================================
// RULE SET
// =============================================================================

/// One declaration in a rule set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    /// Declares a participant. Declaration order is joint-move order.
    Role {
        /// Role name.
        name: String,
    },
    /// A fact true in the initial state.
    Init {
        /// Fact sentence.
        fact: Sentence,
    },
    /// An action the given role may take.
    Legal {
        /// Role name.
        role: String,
        /// Action sentence.
        action: Sentence,
    },
    /// Number of turns after which the game is over.
    StepLimit {
        /// Turn count.
        steps: u32,
    },
}

/// The rules of a game, as handed to an engine at match start.
///
/// The synchronization core never looks inside; only engines interpret it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Parse a JSON array of rules.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let rules: Vec<Rule> = serde_json::from_str(json)?;
        Ok(Self { rules })
    }

    /// Builder: append a rule.
    pub fn with(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// All declarations in order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Number of declarations.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// True if there are no declarations.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
