mod common;

use common::{bracket, match_at, sweep};
use pickleball_bracket_web::store::WRITE_RETRY_LIMIT;
use pickleball_bracket_web::{
    on_game_score_changed, record_game_scores, with_stop, BracketType, EngineError, InMemoryStore,
    Side, Stop, StopId, Store,
};
use uuid::Uuid;

/// Store double that fails the next `failures_left` commits with a version
/// conflict, recording how often commit was attempted.
struct FlakyStore {
    inner: InMemoryStore,
    failures_left: u32,
    commit_attempts: u32,
}

impl FlakyStore {
    fn new(failures: u32) -> Self {
        Self {
            inner: InMemoryStore::new(),
            failures_left: failures,
            commit_attempts: 0,
        }
    }
}

impl Store for FlakyStore {
    fn insert_stop(&mut self, stop: Stop) -> Result<(), EngineError> {
        self.inner.insert_stop(stop)
    }

    fn get_stop(&self, id: StopId) -> Result<Stop, EngineError> {
        self.inner.get_stop(id)
    }

    fn commit_stop(&mut self, expected_version: u64, stop: Stop) -> Result<(), EngineError> {
        self.commit_attempts += 1;
        if self.failures_left > 0 {
            self.failures_left -= 1;
            return Err(EngineError::ConcurrentWriteConflict);
        }
        self.inner.commit_stop(expected_version, stop)
    }

    fn locate_match(&self, match_id: uuid::Uuid) -> Result<StopId, EngineError> {
        self.inner.locate_match(match_id)
    }

    fn stop_ids(&self) -> Vec<StopId> {
        self.inner.stop_ids()
    }
}

#[test]
fn transaction_commits_and_bumps_the_version() {
    let mut store = InMemoryStore::new();
    let (stop, _) = bracket(4);
    let stop_id = stop.id;
    let opener = match_at(&stop, BracketType::Winner, 0, 0);
    let base_version = stop.version;
    store.insert_stop(stop).unwrap();

    with_stop(&mut store, stop_id, |stop| {
        record_game_scores(stop, opener, &sweep(Side::A))?;
        on_game_score_changed(stop, opener)
    })
    .unwrap();

    let stored = store.get_stop(stop_id).unwrap();
    assert_eq!(stored.version, base_version + 1);
    assert!(stored.get_match(opener).unwrap().resolved);
}

#[test]
fn failed_transaction_persists_nothing() {
    let mut store = InMemoryStore::new();
    let (stop, _) = bracket(4);
    let stop_id = stop.id;
    let opener = match_at(&stop, BracketType::Winner, 0, 0);
    store.insert_stop(stop).unwrap();
    let before = serde_json::to_value(store.get_stop(stop_id).unwrap()).unwrap();

    // Scores land on the snapshot, then the closure errors out.
    let missing = Uuid::new_v4();
    let err = with_stop(&mut store, stop_id, |stop| {
        record_game_scores(stop, opener, &sweep(Side::A))?;
        record_game_scores(stop, missing, &sweep(Side::A))
    })
    .unwrap_err();
    assert_eq!(err, EngineError::MatchNotFound(missing));

    let after = serde_json::to_value(store.get_stop(stop_id).unwrap()).unwrap();
    assert_eq!(after, before, "snapshot changes must not leak into the store");
}

#[test]
fn write_conflicts_retry_then_succeed() {
    let (stop, _) = bracket(4);
    let stop_id = stop.id;
    let opener = match_at(&stop, BracketType::Winner, 0, 0);
    let mut store = FlakyStore::new(1);
    store.insert_stop(stop).unwrap();

    with_stop(&mut store, stop_id, |stop| {
        record_game_scores(stop, opener, &sweep(Side::A))?;
        on_game_score_changed(stop, opener)
    })
    .unwrap();

    assert_eq!(store.commit_attempts, 2);
    assert!(store.get_stop(stop_id).unwrap().get_match(opener).unwrap().resolved);
}

#[test]
fn write_conflicts_exhaust_the_retry_budget() {
    let (stop, _) = bracket(2);
    let stop_id = stop.id;
    let mut store = FlakyStore::new(u32::MAX);
    store.insert_stop(stop).unwrap();

    let err = with_stop(&mut store, stop_id, |_| Ok(())).unwrap_err();
    assert_eq!(err, EngineError::ConcurrentWriteConflict);
    assert_eq!(store.commit_attempts, WRITE_RETRY_LIMIT);
}

#[test]
fn match_index_locates_every_match() {
    let mut store = InMemoryStore::new();
    let (stop, _) = bracket(8);
    let stop_id = stop.id;
    let match_ids: Vec<_> = stop.matches.keys().copied().collect();
    store.insert_stop(stop).unwrap();

    for id in match_ids {
        assert_eq!(store.locate_match(id).unwrap(), stop_id);
    }
    let unknown = Uuid::new_v4();
    assert_eq!(
        store.locate_match(unknown).unwrap_err(),
        EngineError::MatchNotFound(unknown)
    );
}

#[test]
fn duplicate_stop_ids_are_rejected() {
    let mut store = InMemoryStore::new();
    let (stop, _) = bracket(2);
    let dup = stop.clone();
    store.insert_stop(stop).unwrap();
    assert!(store.insert_stop(dup).is_err());
    assert_eq!(store.stop_ids().len(), 1);
}
