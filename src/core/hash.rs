//! State Fingerprinting
//!
//! Provides deterministic hashing of machine-state contents for:
//! - Comparing states produced by different engine instances
//! - Keying the next-state cache
//! - Compact state identifiers in logs

use sha2::{Sha256, Digest};

/// Hash output type (256 bits / 32 bytes)
pub type StateHash = [u8; 32];

/// Deterministic hasher for state contents.
///
/// Wraps SHA-256 with length-prefixed string updates so that
/// `["ab", "c"]` and `["a", "bc"]` never collide.
/// Order of updates is critical for determinism.
pub struct StateHasher {
    hasher: Sha256,
}

impl StateHasher {
    /// Create a new hasher with domain separator.
    pub fn new(domain: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        Self { hasher }
    }

    /// Create hasher for machine-state contents.
    pub fn for_machine_state() -> Self {
        Self::new(b"GGP_STATE_V1")
    }

    /// Create hasher for joint moves.
    pub fn for_joint_move() -> Self {
        Self::new(b"GGP_JOINT_MOVE_V1")
    }

    /// Update with raw bytes.
    #[inline]
    pub fn update_bytes(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
    }

    /// Update with a u64 value (little-endian).
    #[inline]
    pub fn update_u64(&mut self, value: u64) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with a length-prefixed string.
    #[inline]
    pub fn update_str(&mut self, value: &str) {
        self.update_u64(value.len() as u64);
        self.hasher.update(value.as_bytes());
    }

    /// Finalize and return the hash.
    pub fn finalize(self) -> StateHash {
        self.hasher.finalize().into()
    }
}

/// Hash an ordered sequence of sentences under the given hasher.
///
/// The element count is mixed in first, then every sentence in order.
pub fn hash_sentences<'a, I>(mut hasher: StateHasher, sentences: I) -> StateHash
where
    I: IntoIterator<Item = &'a str>,
    I::IntoIter: ExactSizeIterator,
{
    let iter = sentences.into_iter();
    hasher.update_u64(iter.len() as u64);
    for sentence in iter {
        hasher.update_str(sentence);
    }
    hasher.finalize()
}

/// First four bytes of a hash as hex, for log lines.
pub fn short_hex(hash: &StateHash) -> String {
    hex::encode(&hash[..4])
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_hasher_determinism() {
        let make_hash = || {
            hash_sentences(
                StateHasher::for_machine_state(),
                ["(cell 1 1 b)", "(control white)"],
            )
        };

        assert_eq!(make_hash(), make_hash());
    }

    #[test]
    fn test_hash_order_matters() {
        let hash1 = hash_sentences(StateHasher::new(b"test"), ["a", "b"]);
        let hash2 = hash_sentences(StateHasher::new(b"test"), ["b", "a"]);

        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_length_prefix_prevents_concatenation_collision() {
        let hash1 = hash_sentences(StateHasher::new(b"test"), ["ab", "c"]);
        let hash2 = hash_sentences(StateHasher::new(b"test"), ["a", "bc"]);

        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_domain_separation() {
        let hash1 = hash_sentences(StateHasher::for_machine_state(), ["noop"]);
        let hash2 = hash_sentences(StateHasher::for_joint_move(), ["noop"]);

        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_short_hex() {
        let mut hash = [0u8; 32];
        hash[0] = 0xde;
        hash[1] = 0xad;
        hash[2] = 0xbe;
        hash[3] = 0xef;
        assert_eq!(short_hex(&hash), "deadbeef");
    }
}
