//! Progression engine: data model, XP and level math, task resolution,
//! achievements and entity factories, plus the store and service layers that
//! wrap them.
//!
//! Everything below `service` and `storage` is pure: functions take a
//! [`GameState`] by value and return the replacement snapshot.

pub mod achievement;
pub mod analytics;
pub mod engine;
pub mod errors;
pub mod factory;
pub mod inventory;
pub mod progression;
pub mod service;
pub mod state;
pub mod storage;
pub mod streak;
pub mod types;

pub use achievement::{
    check_achievements, check_achievements_at, newly_qualified, AchievementRule,
    ACHIEVEMENT_RULES, AWAKENED_ID, FIRST_LEVEL_ID, STREAK_THREE_ID,
};
pub use analytics::{AnalyticsData, XpHistory};
pub use engine::{complete_task, TaskOutcome};
pub use errors::GameError;
pub use factory::{
    create_custom_quest, create_dungeon_run, create_dungeon_run_at, create_streak_habit,
    create_streak_habit_at,
};
pub use inventory::{effective_stats, toggle_equip_item, toggle_skill};
pub use progression::{add_xp, required_xp, xp_progress_percentage, BASE_REQUIRED_XP};
pub use service::{CompletionResponse, ExperienceResponse, GameService, NewQuest};
pub use state::{
    create_initial_state, DAILY_ACTIVITY_STREAK_ID, DAILY_ROUTINE_QUEST_ID, TUTORIAL_QUEST_ID,
};
pub use storage::{GameStateStore, MemoryGameStore, SledGameStore, SledGameStoreBuilder};
pub use streak::{continuation_reward, StreakProgress};
pub use types::*;
