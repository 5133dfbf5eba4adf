//! Match Record
//!
//! Everything the gamer is told about one match: its rules, clocks, the
//! joint moves played so far, and the state contents the gamer derived from
//! them. The outer lifecycle owns this record and appends moves; the gamer
//! reads moves and appends states.

use std::time::Duration;
use serde::{Serialize, Deserialize};

use crate::machine::types::{RuleSet, Sentence, StateContents};

/// Current match record version.
pub const MATCH_RECORD_VERSION: u8 = 1;

/// One match, as seen by one player.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Match {
    /// Version for forward compatibility.
    pub version: u8,

    /// Match identifier assigned by the game manager.
    pub match_id: String,

    /// Rules of the game being played.
    pub rules: RuleSet,

    /// Time allowed for metagaming.
    pub start_clock: Duration,

    /// Time allowed per move.
    pub play_clock: Duration,

    /// One joint move per completed turn, in participant order.
    move_history: Vec<Vec<Sentence>>,

    /// State contents derived by the gamer, starting with the initial state.
    state_history: Vec<StateContents>,
}

impl Match {
    /// Create an empty record.
    pub fn new(
        match_id: impl Into<String>,
        rules: RuleSet,
        start_clock: Duration,
        play_clock: Duration,
    ) -> Self {
        Self {
            version: MATCH_RECORD_VERSION,
            match_id: match_id.into(),
            rules,
            start_clock,
            play_clock,
            move_history: Vec::new(),
            state_history: Vec::new(),
        }
    }

    /// Record a completed turn.
    pub fn append_moves(&mut self, joint_move: Vec<Sentence>) {
        self.move_history.push(joint_move);
    }

    /// Record a state derived by the gamer.
    pub fn append_state(&mut self, contents: StateContents) {
        self.state_history.push(contents);
    }

    /// All joint moves, oldest first.
    pub fn move_history(&self) -> &[Vec<Sentence>] {
        &self.move_history
    }

    /// All recorded states, oldest first.
    pub fn state_history(&self) -> &[StateContents] {
        &self.state_history
    }

    /// Joint move of the last completed turn, or `None` before the first.
    pub fn most_recent_moves(&self) -> Option<&[Sentence]> {
        self.move_history.last().map(Vec::as_slice)
    }

    /// Number of completed turns.
    pub fn turn_count(&self) -> usize {
        self.move_history.len()
    }

    /// Serialize to bytes using bincode.
    pub fn to_bytes(&self) -> Result<Vec<u8>, MatchError> {
        Ok(bincode::serialize(self)?)
    }

    /// Deserialize from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self, MatchError> {
        let record: Match = bincode::deserialize(data)?;
        if record.version != MATCH_RECORD_VERSION {
            return Err(MatchError::VersionMismatch {
                expected: MATCH_RECORD_VERSION,
                got: record.version,
            });
        }
        Ok(record)
    }
}

/// Errors that can occur with match records.
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    /// Encoding or decoding failed.
    #[error("match record codec error: {0}")]
    Codec(#[from] bincode::Error),

    /// Version mismatch.
    #[error("version mismatch: expected {expected}, got {got}")]
    VersionMismatch {
        /// Expected version.
        expected: u8,
        /// Actual version.
        got: u8,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::types::Rule;

    fn create_test_match() -> Match {
        let rules = RuleSet::default()
            .with(Rule::Role { name: "white".into() })
            .with(Rule::Legal { role: "white".into(), action: "noop".into() });
        Match::new("match-1", rules, Duration::from_secs(30), Duration::from_secs(10))
    }

    #[test]
    fn test_match_creation() {
        let record = create_test_match();

        assert_eq!(record.version, MATCH_RECORD_VERSION);
        assert_eq!(record.turn_count(), 0);
        assert!(record.most_recent_moves().is_none());
        assert!(record.state_history().is_empty());
    }

    #[test]
    fn test_most_recent_moves() {
        let mut record = create_test_match();
        record.append_moves(vec!["a".into(), "b".into()]);
        record.append_moves(vec!["c".into(), "d".into()]);

        assert_eq!(record.turn_count(), 2);
        assert_eq!(
            record.most_recent_moves(),
            Some(&[Sentence::from("c"), Sentence::from("d")][..])
        );
    }

    #[test]
    fn test_serialization_keeps_history() {
        let mut record = create_test_match();
        record.append_moves(vec!["noop".into()]);
        record.append_state([Sentence::from("(step 0)")].into_iter().collect());

        let bytes = record.to_bytes().unwrap();
        let decoded = Match::from_bytes(&bytes).unwrap();

        assert_eq!(decoded.match_id, "match-1");
        assert_eq!(decoded.rules, record.rules);
        assert_eq!(decoded.move_history(), record.move_history());
        assert_eq!(decoded.state_history(), record.state_history());
        assert_eq!(decoded.play_clock, Duration::from_secs(10));
    }

    #[test]
    fn test_version_mismatch() {
        let mut record = create_test_match();
        record.version = 99;
        let bytes = record.to_bytes().unwrap();

        let result = Match::from_bytes(&bytes);
        assert!(matches!(result, Err(MatchError::VersionMismatch { expected: 1, got: 99 })));
    }

    #[test]
    fn test_truncated_bytes_rejected() {
        let bytes = create_test_match().to_bytes().unwrap();
        let result = Match::from_bytes(&bytes[..bytes.len() / 2]);
        assert!(matches!(result, Err(MatchError::Codec(_))));
    }
}
