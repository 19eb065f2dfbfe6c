//! Explicit store handle for stops. The engine never reaches for a global
//! client: callers pass a `Store`, which makes test doubles trivial and keeps
//! the transaction boundary visible.

use crate::models::{EngineError, MatchId, Stop, StopId};
use std::collections::HashMap;
use std::time::Duration;

/// Attempts before a version conflict surfaces to the caller.
pub const WRITE_RETRY_LIMIT: u32 = 3;

/// Storage for stops, with snapshot reads and optimistic commits.
pub trait Store {
    /// Insert a freshly built stop. Fails if the id is already present.
    fn insert_stop(&mut self, stop: Stop) -> Result<(), EngineError>;

    /// Cloned snapshot of a stop; mutations only land via `commit_stop`.
    fn get_stop(&self, id: StopId) -> Result<Stop, EngineError>;

    /// Commit a mutated snapshot. Fails with `ConcurrentWriteConflict` when
    /// the stored version moved since the snapshot was taken.
    fn commit_stop(&mut self, expected_version: u64, stop: Stop) -> Result<(), EngineError>;

    /// Which stop owns a match.
    fn locate_match(&self, match_id: MatchId) -> Result<StopId, EngineError>;

    fn stop_ids(&self) -> Vec<StopId>;
}

/// Run a mutation against one stop as a transaction: snapshot, mutate,
/// commit-if-unchanged. An `Err` from `f` discards the snapshot, so nothing
/// partially persists. Version conflicts retry with doubling backoff up to
/// [`WRITE_RETRY_LIMIT`] times, then surface as `ConcurrentWriteConflict`.
pub fn with_stop<S, T, F>(store: &mut S, id: StopId, mut f: F) -> Result<T, EngineError>
where
    S: Store + ?Sized,
    F: FnMut(&mut Stop) -> Result<T, EngineError>,
{
    let mut backoff = Duration::from_millis(5);
    let mut attempt = 0;
    loop {
        attempt += 1;
        let mut stop = store.get_stop(id)?;
        let expected = stop.version;
        let out = f(&mut stop)?;
        match store.commit_stop(expected, stop) {
            Ok(()) => return Ok(out),
            Err(EngineError::ConcurrentWriteConflict) if attempt < WRITE_RETRY_LIMIT => {
                log::warn!(
                    "stop {}: write conflict on attempt {}, retrying",
                    id,
                    attempt
                );
                std::thread::sleep(backoff);
                backoff *= 2;
            }
            Err(e) => return Err(e),
        }
    }
}

/// In-memory store: a stop map plus a match-to-stop index for the
/// match-addressed triggers.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    stops: HashMap<StopId, Stop>,
    match_index: HashMap<MatchId, StopId>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn index_matches(&mut self, stop: &Stop) {
        for &mid in stop.matches.keys() {
            self.match_index.insert(mid, stop.id);
        }
    }
}

impl Store for InMemoryStore {
    fn insert_stop(&mut self, stop: Stop) -> Result<(), EngineError> {
        if self.stops.contains_key(&stop.id) {
            return Err(EngineError::DataInconsistency(format!(
                "stop {} already exists",
                stop.id
            )));
        }
        self.index_matches(&stop);
        self.stops.insert(stop.id, stop);
        Ok(())
    }

    fn get_stop(&self, id: StopId) -> Result<Stop, EngineError> {
        self.stops
            .get(&id)
            .cloned()
            .ok_or(EngineError::StopNotFound(id))
    }

    fn commit_stop(&mut self, expected_version: u64, mut stop: Stop) -> Result<(), EngineError> {
        let current = self
            .stops
            .get(&stop.id)
            .ok_or(EngineError::StopNotFound(stop.id))?;
        if current.version != expected_version {
            return Err(EngineError::ConcurrentWriteConflict);
        }
        stop.version = expected_version + 1;
        self.index_matches(&stop);
        self.stops.insert(stop.id, stop);
        Ok(())
    }

    fn locate_match(&self, match_id: MatchId) -> Result<StopId, EngineError> {
        self.match_index
            .get(&match_id)
            .copied()
            .ok_or(EngineError::MatchNotFound(match_id))
    }

    fn stop_ids(&self) -> Vec<StopId> {
        self.stops.keys().copied().collect()
    }
}
