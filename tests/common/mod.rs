#![allow(dead_code)]

use pickleball_bracket_web::{
    build_bracket, on_game_score_changed, record_game_scores, BracketConfig, BracketType,
    GameScoreUpdate, GameSlot, MatchId, Side, Stop, TeamId,
};
use uuid::Uuid;

pub fn team_ids(n: usize) -> Vec<TeamId> {
    (0..n).map(|_| Uuid::new_v4()).collect()
}

/// Build a default-config bracket for `n` fresh teams, seeded in order.
pub fn bracket(n: usize) -> (Stop, Vec<TeamId>) {
    let teams = team_ids(n);
    let stop = build_bracket("Test Stop", &teams, &BracketConfig::default())
        .expect("bracket should build");
    (stop, teams)
}

/// Match id at a (bracket, round idx, position) coordinate.
pub fn match_at(stop: &Stop, bracket: BracketType, round_idx: usize, pos: usize) -> MatchId {
    stop.round_in(bracket, round_idx)
        .unwrap_or_else(|| panic!("{} round {} should exist", bracket, round_idx))
        .matches[pos]
}

/// Score updates sweeping all four standard slots for one side, 11-5.
pub fn sweep(winner: Side) -> Vec<GameScoreUpdate> {
    GameSlot::standard()
        .iter()
        .map(|&slot| GameScoreUpdate {
            slot,
            team_a_score: Some(if winner == Side::A { 11 } else { 5 }),
            team_b_score: Some(if winner == Side::B { 11 } else { 5 }),
            is_complete: true,
        })
        .collect()
}

/// Record a sweep for `winner` and run advancement.
pub fn play(stop: &mut Stop, id: MatchId, winner: Side) {
    record_game_scores(stop, id, &sweep(winner)).expect("scores should record");
    on_game_score_changed(stop, id).expect("advancement should run");
}

/// Play the match at a (bracket, round idx, position) coordinate.
pub fn play_at(stop: &mut Stop, bracket: BracketType, round_idx: usize, pos: usize, winner: Side) {
    let id = match_at(stop, bracket, round_idx, pos);
    play(stop, id, winner);
}
