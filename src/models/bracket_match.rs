//! Bracket matches: team slots, source links, forfeit and winner bookkeeping.

use crate::models::game::{Game, GameSlot};
use crate::models::round::BracketType;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a match.
pub type MatchId = Uuid;

/// Unique identifier for a team. Teams are owned by the excluded
/// registration/roster layer; the engine only moves their ids around.
pub type TeamId = Uuid;

/// One of the two team slots of a match.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn other(&self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }
}

/// Observable lifecycle of a match, derived from its slots, games, winner,
/// and downstream links.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchState {
    /// One or both team slots still waiting on upstream results.
    PendingTeams,
    /// Both teams assigned, no scores entered yet.
    Ready,
    /// Some games have scores but no winner yet.
    InProgress,
    /// Winner set; no downstream match exists to advance into.
    Decided,
    /// Winner set and downstream slots updated (same unit of work).
    Advanced,
}

/// A match in the bracket graph.
///
/// `source_match_a` / `source_match_b` point at the upstream matches whose
/// results feed the two team slots; together they turn the round/match
/// collection into a DAG. Slots without a source are fixed at build time
/// (first winners round, and the absent side of drop-in bye matches).
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct BracketMatch {
    pub id: MatchId,
    /// Index of the owning round in `Stop::rounds`.
    pub round: usize,
    /// Denormalized from the owning round; advancement needs it constantly.
    pub bracket: BracketType,
    /// Position within the round.
    pub position: usize,
    pub team_a: Option<TeamId>,
    pub team_b: Option<TeamId>,
    /// Seed numbers, first winners round only.
    pub seed_a: Option<usize>,
    pub seed_b: Option<usize>,
    pub is_bye: bool,
    /// Which side forfeited, if any. The opposite team wins immediately.
    pub forfeit_team: Option<Side>,
    pub winner_id: Option<TeamId>,
    /// True once the match has a definitive result. A match fed only by
    /// phantom byes resolves with `winner_id = None` and propagates absence.
    pub resolved: bool,
    pub source_match_a: Option<MatchId>,
    pub source_match_b: Option<MatchId>,
    pub games: Vec<Game>,
}

impl BracketMatch {
    pub fn new(round: usize, bracket: BracketType, position: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            round,
            bracket,
            position,
            team_a: None,
            team_b: None,
            seed_a: None,
            seed_b: None,
            is_bye: false,
            forfeit_team: None,
            winner_id: None,
            resolved: false,
            source_match_a: None,
            source_match_b: None,
            games: Vec::new(),
        }
    }

    pub fn team(&self, side: Side) -> Option<TeamId> {
        match side {
            Side::A => self.team_a,
            Side::B => self.team_b,
        }
    }

    pub fn set_team(&mut self, side: Side, team: Option<TeamId>) {
        match side {
            Side::A => self.team_a = team,
            Side::B => self.team_b = team,
        }
    }

    pub fn source(&self, side: Side) -> Option<MatchId> {
        match side {
            Side::A => self.source_match_a,
            Side::B => self.source_match_b,
        }
    }

    /// The losing team of a resolved match, when a real opponent existed.
    /// Byes and void matches have no loser.
    pub fn loser_id(&self) -> Option<TeamId> {
        let winner = self.winner_id?;
        if self.team_a == Some(winner) {
            self.team_b
        } else if self.team_b == Some(winner) {
            self.team_a
        } else {
            None
        }
    }

    pub fn game(&self, slot: GameSlot) -> Option<&Game> {
        self.games.iter().find(|g| g.slot == slot)
    }

    pub fn game_mut(&mut self, slot: GameSlot) -> Option<&mut Game> {
        self.games.iter_mut().find(|g| g.slot == slot)
    }

    /// Games in the standard (non-tiebreaker) slots.
    pub fn standard_games(&self) -> impl Iterator<Item = &Game> {
        self.games.iter().filter(|g| !g.slot.is_tiebreaker())
    }

    /// True once any game has a score or a forfeit is recorded.
    pub fn has_started(&self) -> bool {
        self.forfeit_team.is_some() || self.games.iter().any(|g| g.has_started())
    }

    /// Derived lifecycle state. `has_children` says whether any downstream
    /// match sources this one; advancement runs in the same unit of work as
    /// deciding, so a resolved match with children is always `Advanced`.
    pub fn state(&self, has_children: bool) -> MatchState {
        if self.resolved {
            if has_children {
                MatchState::Advanced
            } else {
                MatchState::Decided
            }
        } else if self.team_a.is_some() && self.team_b.is_some() {
            if self.has_started() {
                MatchState::InProgress
            } else {
                MatchState::Ready
            }
        } else {
            MatchState::PendingTeams
        }
    }

    /// Clear any recorded result: winner, games, forfeit. Used when an
    /// upstream correction swaps a team out from under a played match.
    pub fn invalidate_result(&mut self) {
        self.winner_id = None;
        self.resolved = false;
        self.forfeit_team = None;
        for g in &mut self.games {
            g.reset();
        }
    }
}
