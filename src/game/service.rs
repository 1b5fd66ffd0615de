//! In-process API over a [`GameStateStore`].
//!
//! Each mutating call validates its input, runs one pure transition inside
//! `store.update`, then folds the outcome into analytics and the process
//! metrics.

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::Serialize;

use crate::game::achievement::check_achievements_at;
use crate::game::analytics::AnalyticsData;
use crate::game::engine::{complete_task, TaskOutcome};
use crate::game::errors::GameError;
use crate::game::factory::{create_custom_quest, create_dungeon_run_at, create_streak_habit_at};
use crate::game::inventory::{toggle_equip_item, toggle_skill};
use crate::game::progression::{add_xp, required_xp};
use crate::game::state::create_initial_state;
use crate::game::storage::GameStateStore;
use crate::game::types::{GameState, LevelUpEvent, QuestType, StatType, TaskCompletionEvent};
use crate::logutil::escape_log;
use crate::metrics;
use crate::validation::{
    validate_description, validate_duration, validate_event, validate_name,
    validate_task_descriptions, validate_username, validate_xp,
};

pub const MESSAGE_COMPLETED: &str = "Task completed successfully";
pub const MESSAGE_NOTHING_TO_DO: &str = "Task already completed or not found";

/// Response body for a completion request.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompletionResponse {
    pub message: String,
    pub xp_gained: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level_up: Option<LevelUpEvent>,
    pub game_state: GameState,
}

/// Response body for a direct XP grant.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceResponse {
    pub xp_gained: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level_up: Option<LevelUpEvent>,
    pub game_state: GameState,
}

/// Input for [`GameService::create_quest`].
#[derive(Debug, Clone)]
pub struct NewQuest {
    pub name: String,
    pub description: String,
    pub quest_type: QuestType,
    pub tasks: Vec<String>,
    pub xp_reward: i64,
    pub deadline: Option<DateTime<Utc>>,
}

pub struct GameService<S> {
    store: S,
}

fn count_new_unlocks(before: &GameState, after: &GameState) -> usize {
    after
        .unlocked_achievement_ids()
        .len()
        .saturating_sub(before.unlocked_achievement_ids().len())
}

/// A client-supplied snapshot may rearrange content but never rewrite
/// progression: level and XP must be consistent, stats may not drop and
/// achievement unlocks must match what the engine recorded.
fn check_replacement(stored: &GameState, incoming: &GameState) -> Result<(), GameError> {
    if incoming.level < 1 {
        return Err(GameError::InvalidInput("level must be at least 1".to_string()));
    }
    if incoming.required_xp != required_xp(incoming.level) {
        return Err(GameError::InvalidInput(format!(
            "requiredXP {} does not match level {}",
            incoming.required_xp, incoming.level
        )));
    }
    if incoming.current_xp >= incoming.required_xp {
        return Err(GameError::InvalidInput(format!(
            "currentXP {} must be below requiredXP {}",
            incoming.current_xp, incoming.required_xp
        )));
    }
    if let Some(stat) = StatType::ALL
        .into_iter()
        .find(|&stat| incoming.stats.get(stat) < stored.stats.get(stat))
    {
        return Err(GameError::InvalidInput(format!(
            "{} cannot decrease",
            stat.as_str()
        )));
    }
    for achievement in &stored.achievements {
        let kept = incoming.achievement(&achievement.id).is_some_and(|candidate| {
            candidate.is_unlocked == achievement.is_unlocked
                && candidate.unlocked_at == achievement.unlocked_at
        });
        if !kept {
            return Err(GameError::InvalidInput(format!(
                "achievement {} cannot be changed by the client",
                achievement.id
            )));
        }
    }
    if let Some(extra) = incoming
        .achievements
        .iter()
        .find(|candidate| candidate.is_unlocked && stored.achievement(&candidate.id).is_none())
    {
        return Err(GameError::InvalidInput(format!(
            "achievement {} cannot be changed by the client",
            extra.id
        )));
    }
    Ok(())
}

impl<S: GameStateStore> GameService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run one transition through the store, counting conflicts.
    fn update<T, F>(&self, user_id: u64, f: F) -> Result<T, GameError>
    where
        F: FnMut(GameState) -> Result<(GameState, T), GameError>,
    {
        self.store.update(user_id, f).map_err(|err| {
            if matches!(err, GameError::Conflict { .. }) {
                metrics::inc_store_conflicts();
            }
            err
        })
    }

    /// Create the starter snapshot for a new user.
    pub fn register(&self, user_id: u64, username: &str) -> Result<GameState, GameError> {
        let username = validate_username(username)?;
        let state = create_initial_state(user_id, &username, Utc::now());
        self.store.create(&state)?;
        self.store
            .update_analytics(user_id, |data| data.sync_skills(&state))?;
        info!("registered user {} as '{}'", user_id, escape_log(&username));
        Ok(state)
    }

    pub fn game_data(&self, user_id: u64) -> Result<GameState, GameError> {
        self.store.load(user_id)
    }

    /// Overwrite a user's snapshot with a client-edited copy.
    ///
    /// The copy is checked against the stored snapshot inside the same update,
    /// so progression and achievements can only move through the engine.
    pub fn replace_game_data(&self, user_id: u64, state: GameState) -> Result<GameState, GameError> {
        if state.id != user_id {
            return Err(GameError::InvalidInput(format!(
                "game state id {} does not match user {}",
                state.id, user_id
            )));
        }
        let state = self.update(user_id, |stored| {
            check_replacement(&stored, &state)?;
            Ok((state.clone(), state.clone()))
        })?;
        debug!("replaced game state for user {}", user_id);
        Ok(state)
    }

    pub fn complete_task(
        &self,
        user_id: u64,
        event: TaskCompletionEvent,
    ) -> Result<CompletionResponse, GameError> {
        validate_event(&event)?;
        let (outcome, unlocked) = self.update(user_id, |state| {
            let before = state.clone();
            let outcome = complete_task(state, &event);
            let unlocked = count_new_unlocks(&before, &outcome.state);
            Ok((outcome.state.clone(), (outcome, unlocked)))
        })?;

        self.record_outcome(user_id, &event, &outcome, unlocked);

        let message = if outcome.applied {
            MESSAGE_COMPLETED
        } else {
            MESSAGE_NOTHING_TO_DO
        };
        Ok(CompletionResponse {
            message: message.to_string(),
            xp_gained: outcome.xp_gained,
            level_up: outcome.level_up,
            game_state: outcome.state,
        })
    }

    fn record_outcome(
        &self,
        user_id: u64,
        event: &TaskCompletionEvent,
        outcome: &TaskOutcome,
        unlocked: usize,
    ) {
        metrics::record_task_completion(event.task_type.as_str(), outcome.applied, outcome.xp_gained);
        metrics::add_xp_awarded(outcome.xp_gained);
        metrics::add_achievements_unlocked(unlocked);
        if outcome.level_up.is_some() {
            metrics::inc_level_ups();
        }
        if outcome.xp_gained > 0 {
            self.record_analytics(user_id, |data| data.record_completion(event, outcome));
        }
    }

    /// Analytics trail the committed state; a failed write is logged, not returned.
    fn record_analytics<F>(&self, user_id: u64, f: F)
    where
        F: FnMut(&mut AnalyticsData),
    {
        if let Err(err) = self.store.update_analytics(user_id, f) {
            warn!("analytics update for user {} failed: {}", user_id, err);
        }
    }

    /// Grant XP directly, then re-check achievements.
    pub fn add_experience(&self, user_id: u64, xp: i64) -> Result<ExperienceResponse, GameError> {
        let xp = validate_xp(xp)?;
        let now = Utc::now();
        let (state, level_up, unlocked) = self.update(user_id, |state| {
            let before = state.clone();
            let (next, level_up) = add_xp(state, xp);
            let next = check_achievements_at(next, now);
            let unlocked = count_new_unlocks(&before, &next);
            Ok((next.clone(), (next, level_up, unlocked)))
        })?;

        metrics::add_xp_awarded(xp);
        metrics::add_achievements_unlocked(unlocked);
        if level_up.is_some() {
            metrics::inc_level_ups();
        }
        if xp > 0 {
            let leveled = level_up.is_some();
            self.record_analytics(user_id, |data| data.record_experience(xp, leveled, now));
        }
        Ok(ExperienceResponse {
            xp_gained: xp,
            level_up,
            game_state: state,
        })
    }

    pub fn create_quest(&self, user_id: u64, quest: NewQuest) -> Result<GameState, GameError> {
        let name = validate_name("name", &quest.name)?;
        let description = validate_description(&quest.description)?;
        let tasks = validate_task_descriptions(&quest.tasks)?;
        let xp_reward = validate_xp(quest.xp_reward)?;
        let task_refs: Vec<&str> = tasks.iter().map(String::as_str).collect();

        self.update(user_id, |state| {
            let next = create_custom_quest(
                state,
                &name,
                &description,
                quest.quest_type,
                &task_refs,
                xp_reward,
                quest.deadline,
            );
            Ok((next.clone(), next))
        })
    }

    pub fn create_dungeon(
        &self,
        user_id: u64,
        name: &str,
        description: &str,
        duration_minutes: i64,
        xp_reward: i64,
    ) -> Result<GameState, GameError> {
        let name = validate_name("name", name)?;
        let description = validate_description(description)?;
        let duration = validate_duration(duration_minutes)?;
        let xp_reward = validate_xp(xp_reward)?;
        let now = Utc::now();

        self.update(user_id, |state| {
            let next = create_dungeon_run_at(state, &name, &description, duration, xp_reward, now);
            Ok((next.clone(), next))
        })
    }

    pub fn create_streak(&self, user_id: u64, name: &str, description: &str) -> Result<GameState, GameError> {
        let name = validate_name("name", name)?;
        let description = validate_description(description)?;
        let now = Utc::now();

        self.update(user_id, |state| {
            let next = create_streak_habit_at(state, &name, &description, now);
            Ok((next.clone(), next))
        })
    }

    pub fn toggle_equip(&self, user_id: u64, item_id: &str) -> Result<GameState, GameError> {
        self.update(user_id, |state| {
            let next = toggle_equip_item(state, item_id);
            Ok((next.clone(), next))
        })
    }

    pub fn toggle_skill(&self, user_id: u64, skill_id: &str) -> Result<GameState, GameError> {
        self.update(user_id, |state| {
            let next = toggle_skill(state, skill_id);
            Ok((next.clone(), next))
        })
    }

    /// Replace the user's progress with a fresh starter snapshot. The username
    /// is kept; analytics are cleared.
    pub fn reset(&self, user_id: u64) -> Result<GameState, GameError> {
        let now = Utc::now();
        let state = self.update(user_id, |state| {
            let next = create_initial_state(user_id, &state.username, now);
            Ok((next.clone(), next))
        })?;
        self.store.update_analytics(user_id, |data| {
            *data = AnalyticsData::new(user_id);
            data.sync_skills(&state);
        })?;
        info!("reset progress for user {}", user_id);
        Ok(state)
    }

    pub fn analytics(&self, user_id: u64) -> Result<AnalyticsData, GameError> {
        if !self.store.exists(user_id)? {
            return Err(GameError::NotFound(format!("gamestate: {}", user_id)));
        }
        self.store.load_analytics(user_id)
    }

    pub fn user_count(&self) -> Result<usize, GameError> {
        Ok(self.store.list_user_ids()?.len())
    }
}
