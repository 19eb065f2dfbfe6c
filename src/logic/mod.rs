//! Bracket engine logic: outcome evaluation, topology, advancement, checks.

mod advancement;
mod diagnostics;
mod outcome;
mod topology;

pub use advancement::{
    match_state, on_game_score_changed, propagate_all, record_game_scores, run_worklist,
    set_forfeit, GameScoreUpdate, MatchStateView,
};
pub use diagnostics::{check_stop, DownstreamPath, Inconsistency};
pub use outcome::{evaluate, needs_tiebreaker, DecidedBy, Outcome};
pub use topology::{build_bracket, winner_round_count, BracketConfig};
