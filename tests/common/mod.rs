//! Shared fixtures for the integration tests.

use chrono::{DateTime, TimeZone, Utc};
use sololevel::game::{create_initial_state, GameState, SledGameStore, SledGameStoreBuilder};
use tempfile::TempDir;

/// Fixed point in time (UTC) on `day` of June 2024 at `hour:minute`.
pub fn june(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, day, hour, minute, 0).unwrap()
}

/// Starter state created at 08:00 on June 1st 2024.
pub fn fresh_state(id: u64) -> GameState {
    create_initial_state(id, "jinwoo", june(1, 8, 0))
}

/// Throwaway sled store; keep the TempDir alive for the store's lifetime.
#[allow(dead_code)] // Not every test binary opens a store.
pub fn temp_store() -> (TempDir, SledGameStore) {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = SledGameStoreBuilder::new(dir.path().join("gamestate"))
        .open()
        .expect("open store");
    (dir, store)
}
