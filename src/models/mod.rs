//! Data structures for the bracket engine: games, matches, rounds, stops.

mod bracket_match;
mod game;
mod round;
mod stop;

pub use bracket_match::{BracketMatch, MatchId, MatchState, Side, TeamId};
pub use game::{Game, GameSlot};
pub use round::{BracketType, Round};
pub use stop::{EngineError, Stop, StopId};
