//! Rounds and the three logical brackets of a double-elimination stop.

use crate::models::bracket_match::MatchId;
use serde::{Deserialize, Serialize};

/// Which bracket a round belongs to. A stop's elimination tree is partitioned
/// into winners, losers, and finals.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BracketType {
    Winner,
    Loser,
    Finals,
}

impl std::fmt::Display for BracketType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BracketType::Winner => write!(f, "winner"),
            BracketType::Loser => write!(f, "loser"),
            BracketType::Finals => write!(f, "finals"),
        }
    }
}

/// A round within one bracket of a stop.
///
/// `idx` is the 0-based position within the bracket, ascending toward the
/// bracket final; `depth` is the distance from that final (0 = final), so
/// `depth == max_idx - idx` always holds.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Round {
    pub idx: usize,
    pub bracket: BracketType,
    pub depth: usize,
    /// Matches in bracket-position order.
    pub matches: Vec<MatchId>,
}

impl Round {
    pub fn new(idx: usize, bracket: BracketType, depth: usize) -> Self {
        Self {
            idx,
            bracket,
            depth,
            matches: Vec::new(),
        }
    }
}
