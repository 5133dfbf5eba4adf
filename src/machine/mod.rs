//! Rules-evaluation engines.
//!
//! ## Module Structure
//!
//! - `types`: Sentences, states, roles, moves, engine identity, rule sets
//! - `engine`: The `StateMachine` trait every engine implements
//! - `error`: Engine error type
//! - `ledger`: Declarative reference engine
//! - `cached`: Memoizing decorator over any engine

pub mod types;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod cached;

use std::fmt;
use std::str::FromStr;
use serde::{Serialize, Deserialize};

// Re-export key types
pub use types::{
    Sentence, StateContents, EngineId, MachineState, Role, Move, Rule, RuleSet, hash_contents,
};
pub use engine::{StateMachine, decode_joint_move};
pub use error::StateMachineError;
pub use ledger::LedgerMachine;
pub use cached::{CachedStateMachine, CacheStats, DEFAULT_CACHE_CAPACITY};

/// Which engine variant to build.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MachineKind {
    /// Plain [`LedgerMachine`].
    #[default]
    Ledger,
    /// [`LedgerMachine`] behind a [`CachedStateMachine`].
    Cached,
}

impl MachineKind {
    /// Build a fresh, uninitialized engine of this kind.
    pub fn build(self, cache_capacity: usize) -> Box<dyn StateMachine> {
        match self {
            MachineKind::Ledger => Box::new(LedgerMachine::new()),
            MachineKind::Cached => Box::new(CachedStateMachine::with_capacity(
                Box::new(LedgerMachine::new()),
                cache_capacity,
            )),
        }
    }
}

impl fmt::Display for MachineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MachineKind::Ledger => f.write_str("ledger"),
            MachineKind::Cached => f.write_str("cached"),
        }
    }
}

/// Error parsing a [`MachineKind`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown machine kind: {0}")]
pub struct UnknownMachineKind(pub String);

impl FromStr for MachineKind {
    type Err = UnknownMachineKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ledger" => Ok(MachineKind::Ledger),
            "cached" => Ok(MachineKind::Cached),
            other => Err(UnknownMachineKind(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_machine_kind_parse() {
        assert_eq!("ledger".parse::<MachineKind>(), Ok(MachineKind::Ledger));
        assert_eq!(" Cached ".parse::<MachineKind>(), Ok(MachineKind::Cached));
        assert!("prover".parse::<MachineKind>().is_err());
    }

    #[test]
    fn test_build_gives_fresh_instances() {
        let a = MachineKind::Ledger.build(DEFAULT_CACHE_CAPACITY);
        let b = MachineKind::Cached.build(DEFAULT_CACHE_CAPACITY);

        assert_ne!(a.id(), b.id());
        assert_eq!(a.name(), "ledger");
        assert_eq!(b.name(), "cached(ledger)");
    }
}
