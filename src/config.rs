//! Gamer configuration.

use serde::{Serialize, Deserialize};

use crate::machine::{MachineKind, StateMachine, DEFAULT_CACHE_CAPACITY};

/// Configuration for one gamer process.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GamerConfig {
    /// Name reported to the game manager.
    pub name: String,
    /// Engine variant for new matches.
    pub machine: MachineKind,
    /// Transition cache capacity (cached engine only).
    pub cache_capacity: usize,
    /// Default log filter when `RUST_LOG` is unset.
    pub log_level: String,
    /// Seed for randomized strategies.
    pub seed: u64,
}

impl Default for GamerConfig {
    fn default() -> Self {
        Self {
            name: "LegalGamer".to_string(),
            machine: MachineKind::Ledger,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            log_level: "info".to_string(),
            seed: 0,
        }
    }
}

impl GamerConfig {
    /// Create config from environment variables.
    ///
    /// Unset or unparsable variables keep their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            name: lookup("GGP_PLAYER_NAME").unwrap_or(defaults.name),
            machine: lookup("GGP_MACHINE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.machine),
            cache_capacity: lookup("GGP_CACHE_CAPACITY")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.cache_capacity),
            log_level: lookup("GGP_LOG_LEVEL").unwrap_or(defaults.log_level),
            seed: lookup("GGP_SEED")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.seed),
        }
    }

    /// Build a fresh, uninitialized engine of the configured kind.
    pub fn build_machine(&self) -> Box<dyn StateMachine> {
        self.machine.build(self.cache_capacity)
    }
}
