use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::IVec;

use crate::game::analytics::{AnalyticsData, ANALYTICS_SCHEMA_VERSION};
use crate::game::errors::GameError;
use crate::game::types::{GameState, GAME_STATE_SCHEMA_VERSION};

const TREE_GAMESTATE: &str = "gamestate";
const TREE_ANALYTICS: &str = "analytics";
const STATE_PREFIX: &str = "gamestate:";
const ANALYTICS_PREFIX: &str = "analytics:";

pub const DEFAULT_MAX_UPDATE_ATTEMPTS: u32 = 8;

/// Load/store of per-user game state snapshots.
///
/// `update` is the only read-modify-write path: the transition closure sees a
/// snapshot nobody else can overwrite in between, and its result replaces the
/// stored snapshot as a whole. Implementations may call the closure more than
/// once when they retry after a conflicting writer.
pub trait GameStateStore: Send + Sync {
    fn load(&self, user_id: u64) -> Result<GameState, GameError>;

    /// Insert or overwrite the snapshot for `state.id`.
    fn save(&self, state: &GameState) -> Result<(), GameError>;

    /// Insert a snapshot for a user that has none yet.
    fn create(&self, state: &GameState) -> Result<(), GameError>;

    fn exists(&self, user_id: u64) -> Result<bool, GameError>;

    fn list_user_ids(&self) -> Result<Vec<u64>, GameError>;

    /// Remove the user's snapshot and analytics. Returns whether a snapshot existed.
    fn delete(&self, user_id: u64) -> Result<bool, GameError>;

    fn update<T, F>(&self, user_id: u64, f: F) -> Result<T, GameError>
    where
        F: FnMut(GameState) -> Result<(GameState, T), GameError>;

    /// Analytics for the user, or an empty record if none was written yet.
    fn load_analytics(&self, user_id: u64) -> Result<AnalyticsData, GameError>;

    fn update_analytics<F>(&self, user_id: u64, f: F) -> Result<AnalyticsData, GameError>
    where
        F: FnMut(&mut AnalyticsData);
}

/// Helper builder so tests can easily create throwaway stores with custom paths.
pub struct SledGameStoreBuilder {
    path: PathBuf,
    max_update_attempts: u32,
}

impl SledGameStoreBuilder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_update_attempts: DEFAULT_MAX_UPDATE_ATTEMPTS,
        }
    }

    /// Compare-and-swap attempts per `update` before giving up with `Conflict`.
    pub fn max_update_attempts(mut self, attempts: u32) -> Self {
        self.max_update_attempts = attempts.max(1);
        self
    }

    pub fn open(self) -> Result<SledGameStore, GameError> {
        SledGameStore::open_with_options(self.path, self.max_update_attempts)
    }
}

/// Sled-backed persistence: one JSON document per user.
pub struct SledGameStore {
    _db: sled::Db,
    states: sled::Tree,
    analytics: sled::Tree,
    max_update_attempts: u32,
}

impl SledGameStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, GameError> {
        Self::open_with_options(path, DEFAULT_MAX_UPDATE_ATTEMPTS)
    }

    fn open_with_options<P: AsRef<Path>>(path: P, max_update_attempts: u32) -> Result<Self, GameError> {
        let path_ref = path.as_ref();
        std::fs::create_dir_all(path_ref)?;
        let db = sled::open(path_ref)?;
        let states = db.open_tree(TREE_GAMESTATE)?;
        let analytics = db.open_tree(TREE_ANALYTICS)?;
        debug!("opened game store at {}", path_ref.display());
        Ok(Self {
            _db: db,
            states,
            analytics,
            max_update_attempts: max_update_attempts.max(1),
        })
    }

    fn state_key(user_id: u64) -> Vec<u8> {
        format!("{STATE_PREFIX}{user_id}").into_bytes()
    }

    fn analytics_key(user_id: u64) -> Vec<u8> {
        format!("{ANALYTICS_PREFIX}{user_id}").into_bytes()
    }

    fn serialize<T: Serialize>(value: &T) -> Result<Vec<u8>, GameError> {
        Ok(serde_json::to_vec(value)?)
    }

    fn deserialize<T: DeserializeOwned>(bytes: &IVec) -> Result<T, GameError> {
        Ok(serde_json::from_slice::<T>(bytes)?)
    }

    fn decode_state(bytes: &IVec) -> Result<GameState, GameError> {
        let state: GameState = Self::deserialize(bytes)?;
        if state.schema_version != GAME_STATE_SCHEMA_VERSION {
            return Err(GameError::SchemaMismatch {
                entity: "gamestate",
                expected: GAME_STATE_SCHEMA_VERSION,
                found: state.schema_version,
            });
        }
        Ok(state)
    }

    fn decode_analytics(bytes: &IVec) -> Result<AnalyticsData, GameError> {
        let data: AnalyticsData = Self::deserialize(bytes)?;
        if data.schema_version != ANALYTICS_SCHEMA_VERSION {
            return Err(GameError::SchemaMismatch {
                entity: "analytics",
                expected: ANALYTICS_SCHEMA_VERSION,
                found: data.schema_version,
            });
        }
        Ok(data)
    }

    /// Flush both trees to disk.
    pub fn flush(&self) -> Result<(), GameError> {
        self.states.flush()?;
        self.analytics.flush()?;
        Ok(())
    }
}

impl GameStateStore for SledGameStore {
    fn load(&self, user_id: u64) -> Result<GameState, GameError> {
        let Some(bytes) = self.states.get(Self::state_key(user_id))? else {
            return Err(GameError::NotFound(format!("gamestate: {}", user_id)));
        };
        Self::decode_state(&bytes)
    }

    fn save(&self, state: &GameState) -> Result<(), GameError> {
        let mut state = state.clone();
        state.schema_version = GAME_STATE_SCHEMA_VERSION;
        let bytes = Self::serialize(&state)?;
        self.states.insert(Self::state_key(state.id), bytes)?;
        self.states.flush()?;
        Ok(())
    }

    fn create(&self, state: &GameState) -> Result<(), GameError> {
        let mut state = state.clone();
        state.schema_version = GAME_STATE_SCHEMA_VERSION;
        let bytes = Self::serialize(&state)?;
        let swapped = self
            .states
            .compare_and_swap(Self::state_key(state.id), None::<&[u8]>, Some(bytes))?;
        if swapped.is_err() {
            return Err(GameError::AlreadyExists(format!("gamestate: {}", state.id)));
        }
        self.states.flush()?;
        Ok(())
    }

    fn exists(&self, user_id: u64) -> Result<bool, GameError> {
        Ok(self.states.contains_key(Self::state_key(user_id))?)
    }

    fn list_user_ids(&self) -> Result<Vec<u64>, GameError> {
        let mut ids = Vec::new();
        for entry in self.states.scan_prefix(STATE_PREFIX.as_bytes()) {
            let (key, _) = entry?;
            let text = String::from_utf8_lossy(&key);
            if let Some(id) = text
                .strip_prefix(STATE_PREFIX)
                .and_then(|raw| raw.parse::<u64>().ok())
            {
                ids.push(id);
            }
        }
        ids.sort_unstable();
        Ok(ids)
    }

    fn delete(&self, user_id: u64) -> Result<bool, GameError> {
        let removed = self.states.remove(Self::state_key(user_id))?.is_some();
        self.analytics.remove(Self::analytics_key(user_id))?;
        self.flush()?;
        Ok(removed)
    }

    fn update<T, F>(&self, user_id: u64, mut f: F) -> Result<T, GameError>
    where
        F: FnMut(GameState) -> Result<(GameState, T), GameError>,
    {
        let key = Self::state_key(user_id);
        for attempt in 1..=self.max_update_attempts {
            let Some(current) = self.states.get(&key)? else {
                return Err(GameError::NotFound(format!("gamestate: {}", user_id)));
            };
            let (mut next, value) = f(Self::decode_state(&current)?)?;
            next.id = user_id;
            next.schema_version = GAME_STATE_SCHEMA_VERSION;
            let bytes = Self::serialize(&next)?;
            if self
                .states
                .compare_and_swap(&key, Some(&current), Some(bytes))?
                .is_ok()
            {
                self.states.flush()?;
                return Ok(value);
            }
            warn!(
                "gamestate {} changed during update (attempt {}/{})",
                user_id, attempt, self.max_update_attempts
            );
        }
        Err(GameError::Conflict {
            user: user_id,
            attempts: self.max_update_attempts,
        })
    }

    fn load_analytics(&self, user_id: u64) -> Result<AnalyticsData, GameError> {
        match self.analytics.get(Self::analytics_key(user_id))? {
            Some(bytes) => Self::decode_analytics(&bytes),
            None => Ok(AnalyticsData::new(user_id)),
        }
    }

    fn update_analytics<F>(&self, user_id: u64, mut f: F) -> Result<AnalyticsData, GameError>
    where
        F: FnMut(&mut AnalyticsData),
    {
        let key = Self::analytics_key(user_id);
        for attempt in 1..=self.max_update_attempts {
            let current = self.analytics.get(&key)?;
            let mut data = match &current {
                Some(bytes) => Self::decode_analytics(bytes)?,
                None => AnalyticsData::new(user_id),
            };
            f(&mut data);
            let bytes = Self::serialize(&data)?;
            if self
                .analytics
                .compare_and_swap(&key, current.as_ref(), Some(bytes))?
                .is_ok()
            {
                self.analytics.flush()?;
                return Ok(data);
            }
            warn!(
                "analytics {} changed during update (attempt {}/{})",
                user_id, attempt, self.max_update_attempts
            );
        }
        Err(GameError::Conflict {
            user: user_id,
            attempts: self.max_update_attempts,
        })
    }
}

/// In-memory store. `update` holds the lock for the whole read-modify-write,
/// so it never conflicts.
#[derive(Default)]
pub struct MemoryGameStore {
    states: Mutex<HashMap<u64, GameState>>,
    analytics: Mutex<HashMap<u64, AnalyticsData>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryGameStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GameStateStore for MemoryGameStore {
    fn load(&self, user_id: u64) -> Result<GameState, GameError> {
        lock(&self.states)
            .get(&user_id)
            .cloned()
            .ok_or_else(|| GameError::NotFound(format!("gamestate: {}", user_id)))
    }

    fn save(&self, state: &GameState) -> Result<(), GameError> {
        lock(&self.states).insert(state.id, state.clone());
        Ok(())
    }

    fn create(&self, state: &GameState) -> Result<(), GameError> {
        let mut states = lock(&self.states);
        if states.contains_key(&state.id) {
            return Err(GameError::AlreadyExists(format!("gamestate: {}", state.id)));
        }
        states.insert(state.id, state.clone());
        Ok(())
    }

    fn exists(&self, user_id: u64) -> Result<bool, GameError> {
        Ok(lock(&self.states).contains_key(&user_id))
    }

    fn list_user_ids(&self) -> Result<Vec<u64>, GameError> {
        let mut ids: Vec<u64> = lock(&self.states).keys().copied().collect();
        ids.sort_unstable();
        Ok(ids)
    }

    fn delete(&self, user_id: u64) -> Result<bool, GameError> {
        lock(&self.analytics).remove(&user_id);
        Ok(lock(&self.states).remove(&user_id).is_some())
    }

    fn update<T, F>(&self, user_id: u64, mut f: F) -> Result<T, GameError>
    where
        F: FnMut(GameState) -> Result<(GameState, T), GameError>,
    {
        let mut states = lock(&self.states);
        let Some(current) = states.get(&user_id).cloned() else {
            return Err(GameError::NotFound(format!("gamestate: {}", user_id)));
        };
        let (mut next, value) = f(current)?;
        next.id = user_id;
        states.insert(user_id, next);
        Ok(value)
    }

    fn load_analytics(&self, user_id: u64) -> Result<AnalyticsData, GameError> {
        Ok(lock(&self.analytics)
            .get(&user_id)
            .cloned()
            .unwrap_or_else(|| AnalyticsData::new(user_id)))
    }

    fn update_analytics<F>(&self, user_id: u64, mut f: F) -> Result<AnalyticsData, GameError>
    where
        F: FnMut(&mut AnalyticsData),
    {
        let mut analytics = lock(&self.analytics);
        let data = analytics
            .entry(user_id)
            .or_insert_with(|| AnalyticsData::new(user_id));
        f(data);
        Ok(data.clone())
    }
}
