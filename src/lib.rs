//! # Sololevel - RPG progression for everyday productivity
//!
//! Sololevel turns tasks into experience: quests with checklists, daily streak
//! habits and timed focus sessions ("dungeon runs") award XP, XP drives levels,
//! levels raise stats and unlock achievements.
//!
//! ## Features
//!
//! - **Pure Engine**: every game rule is a function from one [`game::GameState`] snapshot to the next, with no I/O.
//! - **Idempotent Completion**: re-submitting a finished quest, task, dungeon run or same-day streak awards nothing.
//! - **Calendar Streaks**: streak continuity is decided by UTC calendar dates, not elapsed hours.
//! - **Sled Storage**: one JSON document per user with compare-and-swap updates, so concurrent writers never lose an update.
//! - **Backups**: checksummed tar.gz snapshots of the store with restore and retention.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chrono::Utc;
//! use sololevel::game::{GameService, SledGameStoreBuilder, TaskCompletionEvent, DAILY_ACTIVITY_STREAK_ID};
//!
//! fn main() -> anyhow::Result<()> {
//!     let store = SledGameStoreBuilder::new("./data/gamestate").open()?;
//!     let service = GameService::new(store);
//!     service.register(1, "jinwoo")?;
//!
//!     let event = TaskCompletionEvent::streak(DAILY_ACTIVITY_STREAK_ID, Utc::now());
//!     let response = service.complete_task(1, event)?;
//!     println!("+{} XP, level {}", response.xp_gained, response.game_state.level);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`game`] - Data model, progression engine, store and service
//! - [`config`] - TOML configuration
//! - [`backup`] - Backup and restore of the on-disk store
//! - [`validation`] - Input validation at the service boundary
//! - [`metrics`] - Process-wide engine counters
//! - [`logutil`] - Single-line log escaping

pub mod backup;
pub mod config;
pub mod game;
pub mod logutil;
pub mod metrics;
pub mod validation;
