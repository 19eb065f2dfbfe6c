//! Double-elimination topology: winners, losers, and finals rounds plus the
//! source-match wiring that advancement follows.

use crate::logic::advancement;
use crate::models::{
    BracketMatch, BracketType, EngineError, Game, GameSlot, MatchId, Round, Stop, TeamId,
};
use std::collections::HashSet;

/// Game configuration for a stop's matches. Every playable match gets one
/// game per standard slot plus the dedicated tiebreaker game.
#[derive(Clone, Debug)]
pub struct BracketConfig {
    pub game_slots: Vec<GameSlot>,
}

impl Default for BracketConfig {
    fn default() -> Self {
        Self {
            game_slots: GameSlot::standard().to_vec(),
        }
    }
}

/// Number of winners-bracket rounds for a team count: `ceil(log2(n))`.
pub fn winner_round_count(team_count: usize) -> usize {
    debug_assert!(team_count >= 2);
    (usize::BITS - (team_count - 1).leading_zeros()) as usize
}

/// Standard first-round seed order for a bracket of `2^rounds` slots:
/// seed 1 meets the lowest seed, and mirrored halves keep the top seeds
/// apart until the late rounds.
fn seed_order(rounds: usize) -> Vec<usize> {
    let mut order = vec![1usize];
    for r in 1..=rounds {
        let len = 1 << r;
        let mut next = Vec::with_capacity(len);
        for &s in &order {
            next.push(s);
            next.push(len + 1 - s);
        }
        order = next;
    }
    order
}

fn attach_games(m: &mut BracketMatch, config: &BracketConfig) {
    for &slot in config.game_slots.iter().filter(|s| !s.is_tiebreaker()) {
        m.games.push(Game::new(slot));
    }
    m.games.push(Game::new(GameSlot::Tiebreaker));
}

/// Build the full bracket for a stop: winners rounds, `2w - 1` losers rounds,
/// and the two finals rounds, with every source link in place. Byes resolve
/// and propagate before the stop is returned, so later-round slots reachable
/// only through byes are already filled.
///
/// Teams are taken in caller-supplied seeding order; seeds past the team
/// count are absent and become byes.
pub fn build_bracket(
    name: impl Into<String>,
    teams: &[TeamId],
    config: &BracketConfig,
) -> Result<Stop, EngineError> {
    if teams.len() < 2 {
        return Err(EngineError::InvalidTopologyRequest {
            team_count: teams.len(),
        });
    }
    let mut seen = HashSet::new();
    for &t in teams {
        if !seen.insert(t) {
            return Err(EngineError::DuplicateTeam(t));
        }
    }
    if config.game_slots.iter().all(|s| s.is_tiebreaker()) {
        return Err(EngineError::DataInconsistency(
            "bracket config needs at least one standard game slot".into(),
        ));
    }

    let mut stop = Stop::new(name, teams.to_vec());
    let w = winner_round_count(teams.len());
    let size = 1usize << w;

    // Winners bracket: round r has size / 2^(r+1) matches.
    let order = seed_order(w);
    let mut winner_rounds: Vec<Vec<MatchId>> = Vec::new();
    for r in 0..w {
        let round_pos = stop.rounds.len();
        let mut round = Round::new(r, BracketType::Winner, w - 1 - r);
        let mut ids = Vec::new();
        for pos in 0..(size >> (r + 1)) {
            let mut m = BracketMatch::new(round_pos, BracketType::Winner, pos);
            if r == 0 {
                let seed_a = order[pos * 2];
                let seed_b = order[pos * 2 + 1];
                m.seed_a = Some(seed_a);
                m.seed_b = Some(seed_b);
                m.team_a = teams.get(seed_a - 1).copied();
                m.team_b = teams.get(seed_b - 1).copied();
                // The lower seed of each pair always exists, so at most one
                // slot is absent here.
                m.is_bye = m.team_b.is_none();
            } else {
                let prev = &winner_rounds[r - 1];
                m.source_match_a = Some(prev[pos * 2]);
                m.source_match_b = Some(prev[pos * 2 + 1]);
            }
            if !m.is_bye {
                attach_games(&mut m, config);
            }
            ids.push(m.id);
            round.matches.push(m.id);
            stop.matches.insert(m.id, m);
        }
        winner_rounds.push(ids);
        stop.rounds.push(round);
    }

    // Losers bracket: 2w - 1 rounds. Round 0 is the drop-in round taking the
    // first winners round's losers unopposed; after that, each winners round
    // k contributes a minor round (prior losers-round winners pair up) and a
    // major round (those winners meet the round-k droppers). Losers from
    // winners round k therefore enter the losers bracket at round 2k.
    let lb_round_count = 2 * w - 1;
    let mut prev_lb: Vec<MatchId> = Vec::new();
    {
        let round_pos = stop.rounds.len();
        let mut round = Round::new(0, BracketType::Loser, lb_round_count - 1);
        for pos in 0..(size / 2) {
            let mut m = BracketMatch::new(round_pos, BracketType::Loser, pos);
            m.source_match_a = Some(winner_rounds[0][pos]);
            // Side B is fixed-absent: the dropper advances unopposed.
            m.is_bye = true;
            prev_lb.push(m.id);
            round.matches.push(m.id);
            stop.matches.insert(m.id, m);
        }
        stop.rounds.push(round);
    }
    for k in 1..w {
        let matches_in_round = size >> (k + 1);

        // Minor round (idx 2k - 1): previous losers-round winners pair up.
        let round_pos = stop.rounds.len();
        let idx = 2 * k - 1;
        let mut round = Round::new(idx, BracketType::Loser, lb_round_count - 1 - idx);
        let mut minor_ids = Vec::new();
        for pos in 0..matches_in_round {
            let mut m = BracketMatch::new(round_pos, BracketType::Loser, pos);
            m.source_match_a = Some(prev_lb[pos * 2]);
            m.source_match_b = Some(prev_lb[pos * 2 + 1]);
            attach_games(&mut m, config);
            minor_ids.push(m.id);
            round.matches.push(m.id);
            stop.matches.insert(m.id, m);
        }
        stop.rounds.push(round);
        prev_lb = minor_ids;

        // Major round (idx 2k): minor winner vs winners-round-k dropper.
        // Dropper order reverses on alternate drop rounds so a team does not
        // immediately rematch the opponent that sent it down.
        let round_pos = stop.rounds.len();
        let idx = 2 * k;
        let mut round = Round::new(idx, BracketType::Loser, lb_round_count - 1 - idx);
        let mut major_ids = Vec::new();
        for pos in 0..matches_in_round {
            let dropper = if k % 2 == 1 {
                matches_in_round - 1 - pos
            } else {
                pos
            };
            let mut m = BracketMatch::new(round_pos, BracketType::Loser, pos);
            m.source_match_a = Some(prev_lb[pos]);
            m.source_match_b = Some(winner_rounds[k][dropper]);
            attach_games(&mut m, config);
            major_ids.push(m.id);
            round.matches.push(m.id);
            stop.matches.insert(m.id, m);
        }
        stop.rounds.push(round);
        prev_lb = major_ids;
    }

    // Finals: first final pulls both bracket champions; the second is the
    // conditional bracket reset, sourced twice from the first final.
    let winners_final = winner_rounds[w - 1][0];
    let losers_final = prev_lb[0];
    let finals1_id;
    {
        let round_pos = stop.rounds.len();
        let mut round = Round::new(0, BracketType::Finals, 1);
        let mut m = BracketMatch::new(round_pos, BracketType::Finals, 0);
        m.source_match_a = Some(winners_final);
        m.source_match_b = Some(losers_final);
        attach_games(&mut m, config);
        finals1_id = m.id;
        round.matches.push(m.id);
        stop.matches.insert(m.id, m);
        stop.rounds.push(round);
    }
    {
        let round_pos = stop.rounds.len();
        let mut round = Round::new(1, BracketType::Finals, 0);
        let mut m = BracketMatch::new(round_pos, BracketType::Finals, 0);
        m.source_match_a = Some(finals1_id);
        m.source_match_b = Some(finals1_id);
        attach_games(&mut m, config);
        round.matches.push(m.id);
        stop.matches.insert(m.id, m);
        stop.rounds.push(round);
    }

    // Byes resolve and propagate at build time.
    advancement::propagate_all(&mut stop)?;

    log::info!(
        "built bracket '{}': {} teams, {} winner rounds, {} loser rounds, {} matches",
        stop.name,
        teams.len(),
        w,
        lb_round_count,
        stop.matches.len()
    );
    Ok(stop)
}
