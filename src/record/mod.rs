//! Match recording.
//!
//! - `game_match`: The match record shared with the outer lifecycle

pub mod game_match;

// Re-export key types
pub use game_match::{Match, MatchError, MATCH_RECORD_VERSION};
