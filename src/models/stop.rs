//! Stop: the match arena for one tournament stop, plus engine errors.

use crate::models::bracket_match::{BracketMatch, MatchId, TeamId};
use crate::models::game::GameSlot;
use crate::models::round::{BracketType, Round};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Unique identifier for a stop.
pub type StopId = Uuid;

/// Errors that can occur during bracket operations.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum EngineError {
    /// Too few teams to build an elimination bracket (need at least 2).
    InvalidTopologyRequest { team_count: usize },
    /// The same team appears more than once in the seeding order.
    DuplicateTeam(TeamId),
    /// Stop not found in the store.
    StopNotFound(StopId),
    /// Match not found in the stop (or store).
    MatchNotFound(MatchId),
    /// The match has no game in this slot.
    SlotNotFound(GameSlot),
    /// Scores or forfeits cannot be recorded: the match is a bye or void,
    /// or a team slot is still waiting on an upstream result.
    MatchNotPlayable(MatchId),
    /// The bracket graph contradicts itself; the engine does not guess.
    DataInconsistency(String),
    /// Optimistic commit lost to a concurrent writer; retries exhausted.
    ConcurrentWriteConflict,
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::InvalidTopologyRequest { team_count } => {
                write!(f, "Need at least 2 teams to build a bracket (got {})", team_count)
            }
            EngineError::DuplicateTeam(id) => {
                write!(f, "Team {} appears more than once in the seeding order", id)
            }
            EngineError::StopNotFound(id) => write!(f, "Stop {} not found", id),
            EngineError::MatchNotFound(id) => write!(f, "Match {} not found", id),
            EngineError::SlotNotFound(slot) => write!(f, "No game in slot {}", slot),
            EngineError::MatchNotPlayable(id) => {
                write!(
                    f,
                    "Match {} is not playable (bye, or teams not yet assigned)",
                    id
                )
            }
            EngineError::DataInconsistency(msg) => write!(f, "Data inconsistency: {}", msg),
            EngineError::ConcurrentWriteConflict => {
                write!(f, "Concurrent write conflict; please retry")
            }
        }
    }
}

/// Full bracket state for one stop: rounds in bracket order plus an arena of
/// matches addressed by id. Source links are created once at build time and
/// never change; only team slots, games, and winners mutate afterwards.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Stop {
    pub id: StopId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    /// Teams in seeding order, as supplied at generation time.
    pub teams: Vec<TeamId>,
    /// Winner rounds, then loser rounds, then finals rounds.
    pub rounds: Vec<Round>,
    pub matches: HashMap<MatchId, BracketMatch>,
    /// Bumped on every committed mutation; backs optimistic store commits.
    pub version: u64,
}

impl Stop {
    pub fn new(name: impl Into<String>, teams: Vec<TeamId>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            created_at: Utc::now(),
            teams,
            rounds: Vec::new(),
            matches: HashMap::new(),
            version: 0,
        }
    }

    pub fn get_match(&self, id: MatchId) -> Result<&BracketMatch, EngineError> {
        self.matches.get(&id).ok_or(EngineError::MatchNotFound(id))
    }

    pub fn get_match_mut(&mut self, id: MatchId) -> Result<&mut BracketMatch, EngineError> {
        self.matches
            .get_mut(&id)
            .ok_or(EngineError::MatchNotFound(id))
    }

    /// Rounds of one bracket, in idx order.
    pub fn rounds_in(&self, bracket: BracketType) -> impl Iterator<Item = &Round> {
        self.rounds.iter().filter(move |r| r.bracket == bracket)
    }

    /// A specific round within a bracket.
    pub fn round_in(&self, bracket: BracketType, idx: usize) -> Option<&Round> {
        self.rounds_in(bracket).find(|r| r.idx == idx)
    }

    /// Map from each match to the downstream matches that source it, for
    /// advancement lookups. Built per engine entry; the link set is immutable
    /// so the index never goes stale within a transaction.
    pub fn child_index(&self) -> HashMap<MatchId, Vec<MatchId>> {
        let mut children: HashMap<MatchId, Vec<MatchId>> = HashMap::new();
        // Round order keeps the worklist deterministic.
        for round in &self.rounds {
            for &mid in &round.matches {
                if let Some(m) = self.matches.get(&mid) {
                    for src in [m.source_match_a, m.source_match_b].into_iter().flatten() {
                        let entry = children.entry(src).or_default();
                        if !entry.contains(&mid) {
                            entry.push(mid);
                        }
                    }
                }
            }
        }
        children
    }

    /// The finals match at the given depth (1 = first final, 0 = bracket
    /// reset), if the finals bracket exists.
    pub fn finals_match(&self, depth: usize) -> Option<MatchId> {
        self.rounds_in(BracketType::Finals)
            .find(|r| r.depth == depth)
            .and_then(|r| r.matches.first().copied())
    }

    /// Stop champion: bracket-reset winner when that match was played,
    /// otherwise the first finals winner.
    pub fn champion(&self) -> Option<TeamId> {
        let finals2 = self
            .finals_match(0)
            .and_then(|id| self.matches.get(&id))
            .and_then(|m| m.winner_id);
        if finals2.is_some() {
            return finals2;
        }
        self.finals_match(1)
            .and_then(|id| self.matches.get(&id))
            .and_then(|m| m.winner_id)
    }
}
