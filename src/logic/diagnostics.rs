//! Read-only invariant checks over a stop's bracket graph. These cover the
//! symptom patterns operators otherwise hunt by hand: wrong losers-round
//! counts, orphaned source references, and decided matches whose downstream
//! slots were never updated.

use crate::logic::advancement::{feed, SlotFeed};
use crate::models::{BracketType, GameSlot, MatchId, Side, Stop};
use serde::Serialize;
use std::collections::HashMap;

/// Which downstream path a winners-bracket match is missing.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DownstreamPath {
    Winner,
    Loser,
}

/// One finding from a diagnostic walk.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Inconsistency {
    /// Losers bracket does not have `2 * winner_rounds - 1` rounds.
    LoserRoundCount {
        winner_rounds: usize,
        loser_rounds: usize,
    },
    /// Round idx/depth sequence broken within a bracket.
    NonContiguousRounds { bracket: BracketType },
    /// A match references a source that does not exist.
    MissingSourceMatch { match_id: MatchId, source: MatchId },
    /// Source links loop; advancement cannot terminate.
    CycleDetected,
    /// A resolved match whose result never reached a downstream slot.
    UnadvancedDownstream { match_id: MatchId, child: MatchId },
    /// A winners-bracket match with no winner-path or loser-path target.
    MissingDownstream {
        match_id: MatchId,
        path: DownstreamPath,
    },
    /// A winner id that is not one of the match's teams.
    WinnerNotInMatch { match_id: MatchId },
    /// A completed tiebreaker game with tied scores; the match cannot be
    /// decided until it is re-played.
    TiedTiebreaker { match_id: MatchId },
}

impl std::fmt::Display for Inconsistency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Inconsistency::LoserRoundCount {
                winner_rounds,
                loser_rounds,
            } => write!(
                f,
                "losers bracket has {} rounds, expected {} for {} winner rounds",
                loser_rounds,
                2 * winner_rounds - 1,
                winner_rounds
            ),
            Inconsistency::NonContiguousRounds { bracket } => {
                write!(f, "{} bracket rounds are not a contiguous 0-based sequence", bracket)
            }
            Inconsistency::MissingSourceMatch { match_id, source } => {
                write!(f, "match {} references missing source {}", match_id, source)
            }
            Inconsistency::CycleDetected => write!(f, "source links form a cycle"),
            Inconsistency::UnadvancedDownstream { match_id, child } => write!(
                f,
                "match {} is resolved but downstream match {} holds a stale slot",
                match_id, child
            ),
            Inconsistency::MissingDownstream { match_id, path } => {
                write!(f, "winners-bracket match {} has no {:?}-path target", match_id, path)
            }
            Inconsistency::WinnerNotInMatch { match_id } => {
                write!(f, "match {} winner is not one of its teams", match_id)
            }
            Inconsistency::TiedTiebreaker { match_id } => {
                write!(f, "match {} tiebreaker completed tied", match_id)
            }
        }
    }
}

fn check_round_shape(stop: &Stop, findings: &mut Vec<Inconsistency>) {
    let winner_rounds = stop.rounds_in(BracketType::Winner).count();
    let loser_rounds = stop.rounds_in(BracketType::Loser).count();
    if winner_rounds > 0 && loser_rounds != 2 * winner_rounds - 1 {
        findings.push(Inconsistency::LoserRoundCount {
            winner_rounds,
            loser_rounds,
        });
    }
    for bracket in [BracketType::Winner, BracketType::Loser, BracketType::Finals] {
        let rounds: Vec<_> = stop.rounds_in(bracket).collect();
        let count = rounds.len();
        let contiguous = rounds
            .iter()
            .enumerate()
            .all(|(i, r)| r.idx == i && r.depth == count - 1 - i);
        if !contiguous {
            findings.push(Inconsistency::NonContiguousRounds { bracket });
        }
    }
}

fn check_sources_and_cycles(stop: &Stop, findings: &mut Vec<Inconsistency>) {
    let mut indegree: HashMap<MatchId, usize> = HashMap::new();
    let mut edges: HashMap<MatchId, Vec<MatchId>> = HashMap::new();
    for m in stop.matches.values() {
        indegree.entry(m.id).or_insert(0);
        for src in [m.source_match_a, m.source_match_b].into_iter().flatten() {
            if !stop.matches.contains_key(&src) {
                findings.push(Inconsistency::MissingSourceMatch {
                    match_id: m.id,
                    source: src,
                });
                continue;
            }
            *indegree.entry(m.id).or_insert(0) += 1;
            edges.entry(src).or_default().push(m.id);
        }
    }
    // Kahn walk over the source graph; leftovers mean a cycle.
    let mut queue: Vec<MatchId> = indegree
        .iter()
        .filter(|(_, &d)| d == 0)
        .map(|(&id, _)| id)
        .collect();
    let mut seen = 0usize;
    while let Some(id) = queue.pop() {
        seen += 1;
        if let Some(kids) = edges.get(&id) {
            for &kid in kids {
                let d = indegree.get_mut(&kid).map(|d| {
                    *d -= 1;
                    *d
                });
                if d == Some(0) {
                    queue.push(kid);
                }
            }
        }
    }
    if seen != indegree.len() {
        findings.push(Inconsistency::CycleDetected);
    }
}

fn check_advancement(stop: &Stop, findings: &mut Vec<Inconsistency>) {
    for round in &stop.rounds {
        for &mid in &round.matches {
            let m = match stop.matches.get(&mid) {
                Some(m) => m,
                None => continue,
            };
            for side in [Side::A, Side::B] {
                let src = match m.source(side) {
                    Some(s) if stop.matches.contains_key(&s) => s,
                    _ => continue,
                };
                if let Ok(SlotFeed::Settled(expected)) = feed(stop, src, m, side) {
                    if m.team(side) != expected {
                        findings.push(Inconsistency::UnadvancedDownstream {
                            match_id: src,
                            child: m.id,
                        });
                    }
                }
            }
        }
    }
}

fn check_match_results(stop: &Stop, findings: &mut Vec<Inconsistency>) {
    for round in &stop.rounds {
        for &mid in &round.matches {
            let m = match stop.matches.get(&mid) {
                Some(m) => m,
                None => continue,
            };
            if let Some(winner) = m.winner_id {
                if m.team_a != Some(winner) && m.team_b != Some(winner) {
                    findings.push(Inconsistency::WinnerNotInMatch { match_id: m.id });
                }
            }
            if let Some(tb) = m.game(GameSlot::Tiebreaker) {
                if tb.is_complete && tb.team_a_score.is_some() && tb.team_a_score == tb.team_b_score
                {
                    findings.push(Inconsistency::TiedTiebreaker { match_id: m.id });
                }
            }
        }
    }
}

fn check_winner_paths(stop: &Stop, findings: &mut Vec<Inconsistency>) {
    let children = stop.child_index();
    for round in stop.rounds_in(BracketType::Winner) {
        for &mid in &round.matches {
            let kids = children.get(&mid).cloned().unwrap_or_default();
            let mut has_winner_path = false;
            let mut has_loser_path = false;
            for kid in kids {
                if let Some(child) = stop.matches.get(&kid) {
                    match child.bracket {
                        BracketType::Loser => has_loser_path = true,
                        BracketType::Winner | BracketType::Finals => has_winner_path = true,
                    }
                }
            }
            if !has_winner_path {
                findings.push(Inconsistency::MissingDownstream {
                    match_id: mid,
                    path: DownstreamPath::Winner,
                });
            }
            if !has_loser_path {
                findings.push(Inconsistency::MissingDownstream {
                    match_id: mid,
                    path: DownstreamPath::Loser,
                });
            }
        }
    }
}

/// Walk the full round/match graph of a stop and report everything that
/// contradicts the bracket invariants. Read-only; never repairs.
pub fn check_stop(stop: &Stop) -> Vec<Inconsistency> {
    let mut findings = Vec::new();
    check_round_shape(stop, &mut findings);
    check_sources_and_cycles(stop, &mut findings);
    check_advancement(stop, &mut findings);
    check_match_results(stop, &mut findings);
    check_winner_paths(stop, &mut findings);
    for finding in &findings {
        log::warn!("stop {}: {}", stop.id, finding);
    }
    findings
}
