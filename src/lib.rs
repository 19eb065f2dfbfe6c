//! Pickleball league bracket engine: double-elimination topology, match
//! outcome evaluation, and winner/loser advancement.

pub mod logic;
pub mod models;
pub mod store;

pub use logic::{
    build_bracket, check_stop, evaluate, match_state, needs_tiebreaker, on_game_score_changed,
    propagate_all, record_game_scores, set_forfeit, winner_round_count, BracketConfig, DecidedBy,
    GameScoreUpdate, Inconsistency, MatchStateView, Outcome,
};
pub use models::{
    BracketMatch, BracketType, EngineError, Game, GameSlot, MatchId, MatchState, Round, Side,
    Stop, StopId, TeamId,
};
pub use store::{with_stop, InMemoryStore, Store};
