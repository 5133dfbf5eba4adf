//! # GGP Player
//!
//! State-machine synchronization core for general game playing agents.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        GGP PLAYER                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Engine-independent primitives             │
//! │  ├── hash.rs     - State fingerprints for logs and caches    │
//! │  └── rng.rs      - Deterministic Xorshift128+ PRNG           │
//! │                                                              │
//! │  machine/        - Rules-evaluation engines                  │
//! │  ├── types.rs    - Sentences, states, roles, moves, rules    │
//! │  ├── engine.rs   - StateMachine trait                        │
//! │  ├── ledger.rs   - Declarative reference engine              │
//! │  └── cached.rs   - Memoizing engine decorator                │
//! │                                                              │
//! │  record/         - Match record (rules, clocks, histories)   │
//! │                                                              │
//! │  gamer/          - Synchronized (role, state, engine) view   │
//! │  ├── triple.rs   - Consistency unit                          │
//! │  ├── state_machine_gamer.rs - Init, advance, migrate, reset  │
//! │  └── strategy.rs - Pluggable move selection                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Synchronization Guarantee
//!
//! After every successful operation the gamer's role and state were both
//! produced by the installed engine, and the state equals what that engine
//! computes by replaying the recorded moves from its initial state. Failed
//! operations leave the previous triple untouched.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod machine;
pub mod record;
pub mod gamer;
pub mod config;

// Re-export commonly used types
pub use config::GamerConfig;
pub use machine::{MachineKind, MachineState, Move, Role, RuleSet, Sentence, StateMachine};
pub use record::Match;
pub use gamer::{
    GamerStrategy, LegalStrategy, MetaGamingError, MoveSelectionError, RandomStrategy,
    StateMachineGamer, GAMER_LOG_TARGET,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
