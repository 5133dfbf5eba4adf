//! Core deterministic primitives.
//!
//! Engine-independent helpers shared by the machine and gamer layers.

pub mod hash;
pub mod rng;

// Re-export core types
pub use hash::{StateHash, StateHasher, hash_sentences, short_hex};
pub use rng::DeterministicRng;
