//! Per-slot game records: the score ledger inside a match.

use serde::{Deserialize, Serialize};

/// Named game category within a match. `Tiebreaker` is the dedicated extra
/// game played only when the standard slots split evenly.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameSlot {
    MensDoubles,
    WomensDoubles,
    Mixed1,
    Mixed2,
    Tiebreaker,
}

impl GameSlot {
    /// The standard (non-tiebreaker) slot lineup, in play order.
    pub fn standard() -> [GameSlot; 4] {
        [
            GameSlot::MensDoubles,
            GameSlot::WomensDoubles,
            GameSlot::Mixed1,
            GameSlot::Mixed2,
        ]
    }

    pub fn is_tiebreaker(&self) -> bool {
        matches!(self, GameSlot::Tiebreaker)
    }
}

impl std::fmt::Display for GameSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            GameSlot::MensDoubles => "mens_doubles",
            GameSlot::WomensDoubles => "womens_doubles",
            GameSlot::Mixed1 => "mixed_1",
            GameSlot::Mixed2 => "mixed_2",
            GameSlot::Tiebreaker => "tiebreaker",
        };
        write!(f, "{}", s)
    }
}

/// One game within a match: a slot tag, two nullable scores, and a completion
/// flag. Scores are mutated by the scoring API; the engine only reads them.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub slot: GameSlot,
    pub team_a_score: Option<u32>,
    pub team_b_score: Option<u32>,
    pub is_complete: bool,
}

impl Game {
    /// Create an empty (unplayed) game for a slot.
    pub fn new(slot: GameSlot) -> Self {
        Self {
            slot,
            team_a_score: None,
            team_b_score: None,
            is_complete: false,
        }
    }

    /// Which side won this game, if it is complete with both scores present
    /// and strictly unequal. Incomplete, partial, or tied games count for
    /// neither side.
    pub fn winner_side(&self) -> Option<crate::models::Side> {
        if !self.is_complete {
            return None;
        }
        match (self.team_a_score, self.team_b_score) {
            (Some(a), Some(b)) if a > b => Some(crate::models::Side::A),
            (Some(a), Some(b)) if b > a => Some(crate::models::Side::B),
            _ => None,
        }
    }

    /// True once any score has been entered, complete or not.
    pub fn has_started(&self) -> bool {
        self.team_a_score.is_some() || self.team_b_score.is_some()
    }

    /// Clear scores and completion (used when a stale result is invalidated).
    pub fn reset(&mut self) {
        self.team_a_score = None;
        self.team_b_score = None;
        self.is_complete = false;
    }
}
