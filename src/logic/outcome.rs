//! Match outcome evaluation: forfeits, per-slot game wins, tiebreaker gate.

use crate::models::{BracketMatch, EngineError, GameSlot, Side, TeamId};

/// How a decided match was decided.
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecidedBy {
    Bye,
    Forfeit,
    Games,
    Tiebreaker,
}

/// Result of evaluating a match's games and flags.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Outcome {
    pub decided: bool,
    pub winner: Option<TeamId>,
    pub decided_by: Option<DecidedBy>,
}

impl Outcome {
    fn undecided() -> Self {
        Self {
            decided: false,
            winner: None,
            decided_by: None,
        }
    }

    fn won(winner: TeamId, decided_by: DecidedBy) -> Self {
        Self {
            decided: true,
            winner: Some(winner),
            decided_by: Some(decided_by),
        }
    }
}

/// Count completed standard-slot wins for each side. Incomplete games, games
/// with a missing score, and tied games count for neither.
fn standard_win_counts(m: &BracketMatch) -> (usize, usize) {
    let mut wins_a = 0;
    let mut wins_b = 0;
    for game in m.standard_games() {
        match game.winner_side() {
            Some(Side::A) => wins_a += 1,
            Some(Side::B) => wins_b += 1,
            None => {}
        }
    }
    (wins_a, wins_b)
}

fn all_standard_complete(m: &BracketMatch) -> bool {
    let mut any = false;
    for game in m.standard_games() {
        any = true;
        if !game.is_complete {
            return false;
        }
    }
    any
}

/// Whether the match is waiting on its tiebreaker game: no forfeit, every
/// standard slot complete, and the win counts exactly tied. Checked on every
/// game mutation, not only the tiebreaker's, since a late correction to a
/// regular slot can open or close the gate.
pub fn needs_tiebreaker(m: &BracketMatch) -> bool {
    if m.forfeit_team.is_some() || !all_standard_complete(m) {
        return false;
    }
    let (wins_a, wins_b) = standard_win_counts(m);
    if wins_a != wins_b {
        return false;
    }
    // Gate is open until the tiebreaker game decides the match.
    match m.game(GameSlot::Tiebreaker) {
        Some(tb) => tb.winner_side().is_none(),
        None => true,
    }
}

/// Evaluate a match to a definitive winner or "undecided".
///
/// Rules in priority order: bye, forfeit, standard-slot majority (only once
/// every standard slot is complete), tiebreaker. A completed tiebreaker that
/// is itself tied is an error condition: it is logged, the match stays
/// undecided, and diagnostics report it. The engine never picks a winner
/// arbitrarily.
pub fn evaluate(m: &BracketMatch) -> Result<Outcome, EngineError> {
    // Byes decide immediately with the present team; no game evaluation.
    if m.is_bye {
        return match (m.team_a, m.team_b) {
            (Some(t), None) | (None, Some(t)) => Ok(Outcome::won(t, DecidedBy::Bye)),
            _ => Ok(Outcome::undecided()),
        };
    }

    if let Some(forfeiting) = m.forfeit_team {
        let winner = m
            .team(forfeiting.other())
            .ok_or_else(|| {
                EngineError::DataInconsistency(format!(
                    "match {} forfeited by side {:?} but the opposite slot is empty",
                    m.id, forfeiting
                ))
            })?;
        return Ok(Outcome::won(winner, DecidedBy::Forfeit));
    }

    if !all_standard_complete(m) {
        return Ok(Outcome::undecided());
    }

    let (wins_a, wins_b) = standard_win_counts(m);
    if wins_a != wins_b {
        let side = if wins_a > wins_b { Side::A } else { Side::B };
        let winner = m.team(side).ok_or_else(|| {
            EngineError::DataInconsistency(format!(
                "match {} has game results but no team in slot {:?}",
                m.id, side
            ))
        })?;
        return Ok(Outcome::won(winner, DecidedBy::Games));
    }

    // Standard slots split evenly: the tiebreaker game alone decides.
    if let Some(tb) = m.game(GameSlot::Tiebreaker) {
        if tb.is_complete {
            match tb.winner_side() {
                Some(side) => {
                    let winner = m.team(side).ok_or_else(|| {
                        EngineError::DataInconsistency(format!(
                            "match {} tiebreaker won by empty slot {:?}",
                            m.id, side
                        ))
                    })?;
                    return Ok(Outcome::won(winner, DecidedBy::Tiebreaker));
                }
                None => {
                    // A tied tiebreaker cannot decide anything; the game must
                    // be re-played.
                    log::error!(
                        "match {}: tiebreaker game completed with tied or missing scores; match stays undecided",
                        m.id
                    );
                    return Ok(Outcome::undecided());
                }
            }
        }
    }

    Ok(Outcome::undecided())
}
