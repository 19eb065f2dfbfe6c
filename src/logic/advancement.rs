//! Bracket advancement: an iterative worklist that fills downstream team
//! slots from decided sources, auto-resolves byes, and reconciles the graph
//! after score corrections.

use crate::logic::outcome;
use crate::models::{
    BracketMatch, BracketType, EngineError, GameSlot, MatchId, MatchState, Side, Stop, TeamId,
};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// What an upstream source currently contributes to a downstream slot.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum SlotFeed {
    /// Source match not resolved yet; the slot must stay empty.
    Pending,
    /// Source resolved. `None` means no team arrives (bye loser, void chain,
    /// or a bracket reset that is not happening).
    Settled(Option<TeamId>),
}

/// Compute the team an upstream source feeds into one slot of `dest`.
///
/// Path selection is structural: a winners-bracket source feeding a
/// losers-bracket match contributes its loser; every other edge contributes
/// the winner. The bracket reset is the one special case: both its slots
/// source the first final, and they replay that match's teams only when the
/// losers-bracket champion (slot B) won it.
pub(crate) fn feed(
    stop: &Stop,
    source_id: MatchId,
    dest: &BracketMatch,
    side: Side,
) -> Result<SlotFeed, EngineError> {
    let src = stop.matches.get(&source_id).ok_or_else(|| {
        EngineError::DataInconsistency(format!(
            "match {} references missing source match {}",
            dest.id, source_id
        ))
    })?;
    if !src.resolved {
        return Ok(SlotFeed::Pending);
    }
    if dest.bracket == BracketType::Finals && dest.source_match_a == dest.source_match_b {
        let reset = src.winner_id.is_some() && src.winner_id == src.team_b;
        return Ok(SlotFeed::Settled(if reset { src.team(side) } else { None }));
    }
    let takes_loser = src.bracket == BracketType::Winner && dest.bracket == BracketType::Loser;
    Ok(SlotFeed::Settled(if takes_loser {
        src.loser_id()
    } else {
        src.winner_id
    }))
}

fn desired(want: Option<SlotFeed>, current: Option<TeamId>) -> Option<TeamId> {
    match want {
        // No source: the slot was fixed at build time.
        None => current,
        Some(SlotFeed::Pending) => None,
        Some(SlotFeed::Settled(t)) => t,
    }
}

fn settled(want: Option<SlotFeed>) -> bool {
    !matches!(want, Some(SlotFeed::Pending))
}

/// Bring one match in line with its sources and its own games. Returns true
/// when anything observable changed (slots, winner, resolution), which is the
/// signal to enqueue its children.
fn reconcile(stop: &mut Stop, id: MatchId) -> Result<bool, EngineError> {
    let (want_a, want_b) = {
        let m = stop.get_match(id)?;
        let want_a = match m.source_match_a {
            Some(src) => Some(feed(stop, src, m, Side::A)?),
            None => None,
        };
        let want_b = match m.source_match_b {
            Some(src) => Some(feed(stop, src, m, Side::B)?),
            None => None,
        };
        (want_a, want_b)
    };

    let m = stop.get_match_mut(id)?;
    let new_a = desired(want_a, m.team_a);
    let new_b = desired(want_b, m.team_b);
    let slots_changed = new_a != m.team_a || new_b != m.team_b;
    let mut changed = slots_changed;

    if slots_changed {
        let had_result = m.resolved || m.has_started();
        m.team_a = new_a;
        m.team_b = new_b;
        if had_result {
            // Whatever was recorded here was against the old occupants.
            log::warn!(
                "match {}: upstream correction changed a team slot; clearing stale result",
                m.id
            );
            m.invalidate_result();
        }
    }

    if settled(want_a) && settled(want_b) {
        // Sourced matches derive their bye status from what actually arrived;
        // fixed first-round matches keep the flag set at build time.
        if m.source_match_a.is_some() || m.source_match_b.is_some() {
            m.is_bye = m.team_a.is_none() || m.team_b.is_none();
        }
        if !m.is_bye && m.team_a.is_some() && m.team_b.is_some() {
            let out = outcome::evaluate(m)?;
            if m.winner_id != out.winner || m.resolved != out.decided {
                m.winner_id = out.winner;
                m.resolved = out.decided;
                changed = true;
                if let Some(winner) = out.winner {
                    log::info!(
                        "match {} decided: winner {} ({:?})",
                        m.id,
                        winner,
                        out.decided_by
                    );
                }
            }
        } else {
            // Bye with one team, or a void match both of whose inputs
            // settled empty. Either way it resolves without play.
            let winner = m.team_a.or(m.team_b);
            if !m.resolved || m.winner_id != winner {
                m.winner_id = winner;
                m.resolved = true;
                changed = true;
                if let Some(winner) = winner {
                    log::info!("match {} resolved as bye: winner {}", m.id, winner);
                }
            }
        }
    }

    Ok(changed)
}

/// Drain a worklist of matches needing reconciliation, following source
/// links downstream until the graph reaches a fixpoint. Every caller runs
/// this inside a single store transaction, so a decided match and its
/// downstream updates land (or roll back) together.
pub fn run_worklist(stop: &mut Stop, seeds: Vec<MatchId>) -> Result<Vec<MatchId>, EngineError> {
    let children = stop.child_index();
    let mut queue: VecDeque<MatchId> = seeds.into_iter().collect();
    let mut touched: Vec<MatchId> = Vec::new();
    // A DAG converges in far fewer reconciliations than this; exceeding it
    // means the source links loop.
    let limit = stop.matches.len() * stop.matches.len() + 64;
    let mut steps = 0usize;
    while let Some(id) = queue.pop_front() {
        steps += 1;
        if steps > limit {
            return Err(EngineError::DataInconsistency(
                "advancement did not converge; source links form a cycle".into(),
            ));
        }
        if reconcile(stop, id)? {
            if !touched.contains(&id) {
                touched.push(id);
            }
            if let Some(kids) = children.get(&id) {
                queue.extend(kids.iter().copied());
            }
        }
    }
    Ok(touched)
}

/// React to any game mutation on a match: re-evaluate it and propagate the
/// consequences. Must be called even for corrections to already-complete
/// games: a re-score can flip the winner, and the worklist then replaces
/// the stale team downstream and invalidates results built on it.
///
/// Returns the downstream matches that changed. Idempotent: re-running with
/// unchanged inputs touches nothing.
pub fn on_game_score_changed(
    stop: &mut Stop,
    match_id: MatchId,
) -> Result<Vec<MatchId>, EngineError> {
    stop.get_match(match_id)?;
    let touched = run_worklist(stop, vec![match_id])?;
    Ok(touched.into_iter().filter(|&m| m != match_id).collect())
}

/// Reconcile the whole stop in round order. Used once at topology-build time
/// so byes resolve and advance immediately, and available to operators as a
/// full repair sweep.
pub fn propagate_all(stop: &mut Stop) -> Result<Vec<MatchId>, EngineError> {
    let seeds: Vec<MatchId> = stop
        .rounds
        .iter()
        .flat_map(|r| r.matches.iter().copied())
        .collect();
    run_worklist(stop, seeds)
}

/// A per-slot score write from the scoring API.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct GameScoreUpdate {
    pub slot: GameSlot,
    pub team_a_score: Option<u32>,
    pub team_b_score: Option<u32>,
    pub is_complete: bool,
}

/// Record per-slot scores on a match. Byes and matches still waiting on
/// teams take no scores. The caller runs `on_game_score_changed` afterwards,
/// in the same transaction.
pub fn record_game_scores(
    stop: &mut Stop,
    match_id: MatchId,
    updates: &[GameScoreUpdate],
) -> Result<(), EngineError> {
    let m = stop.get_match_mut(match_id)?;
    if m.games.is_empty() || m.is_bye {
        return Err(EngineError::MatchNotPlayable(match_id));
    }
    if m.team_a.is_none() || m.team_b.is_none() {
        return Err(EngineError::MatchNotPlayable(match_id));
    }
    for u in updates {
        let game = m.game_mut(u.slot).ok_or(EngineError::SlotNotFound(u.slot))?;
        game.team_a_score = u.team_a_score;
        game.team_b_score = u.team_b_score;
        game.is_complete = u.is_complete;
    }
    Ok(())
}

/// Set or clear a match's forfeit flag. The caller runs
/// `on_game_score_changed` afterwards, in the same transaction.
pub fn set_forfeit(
    stop: &mut Stop,
    match_id: MatchId,
    team: Option<Side>,
) -> Result<(), EngineError> {
    let m = stop.get_match_mut(match_id)?;
    if m.is_bye || m.team_a.is_none() || m.team_b.is_none() {
        return Err(EngineError::MatchNotPlayable(match_id));
    }
    m.forfeit_team = team;
    Ok(())
}

/// Schedule/scoreboard view of one match.
#[derive(Clone, Debug, Serialize)]
pub struct MatchStateView {
    pub state: MatchState,
    pub winner_id: Option<TeamId>,
    pub ready_teams: Vec<TeamId>,
}

pub fn match_state(stop: &Stop, match_id: MatchId) -> Result<MatchStateView, EngineError> {
    let children = stop.child_index();
    let m = stop.get_match(match_id)?;
    let has_children = children.get(&match_id).is_some_and(|c| !c.is_empty());
    Ok(MatchStateView {
        state: m.state(has_children),
        winner_id: m.winner_id,
        ready_teams: [m.team_a, m.team_b].into_iter().flatten().collect(),
    })
}
