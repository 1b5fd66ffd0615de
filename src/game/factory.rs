//! Constructors for user-authored quests, dungeon runs and streaks.
//!
//! Each factory takes the state by value and returns it with the new entity
//! appended. Generated ids are UUIDv4-based and never collide with any id the
//! state already carries.

use chrono::{DateTime, Duration, Utc};
use log::debug;
use uuid::Uuid;

use crate::game::types::{
    DungeonRewards, DungeonRun, GameState, Quest, QuestTask, QuestType, Streak,
};
use crate::logutil::escape_log;

pub const QUEST_ID_PREFIX: &str = "quest";
pub const DUNGEON_ID_PREFIX: &str = "dungeon";
pub const STREAK_ID_PREFIX: &str = "streak";

/// Fresh id of the form `<prefix>-<uuid>`, or a bare UUID when `prefix` is
/// `None`, that is not already taken in `state` or `reserved`.
fn unique_id(state: &GameState, reserved: &[String], prefix: Option<&str>) -> String {
    loop {
        let uuid = Uuid::new_v4();
        let candidate = match prefix {
            Some(prefix) => format!("{prefix}-{uuid}"),
            None => uuid.to_string(),
        };
        if !state.contains_id(&candidate) && !reserved.contains(&candidate) {
            return candidate;
        }
    }
}

/// Append a new incomplete quest with one incomplete task per description.
pub fn create_custom_quest(
    mut state: GameState,
    name: &str,
    description: &str,
    quest_type: QuestType,
    task_descriptions: &[&str],
    xp_reward: u32,
    deadline: Option<DateTime<Utc>>,
) -> GameState {
    let quest_id = unique_id(&state, &[], Some(QUEST_ID_PREFIX));
    let mut reserved = vec![quest_id.clone()];
    let mut requirements = Vec::with_capacity(task_descriptions.len());
    for task_description in task_descriptions {
        let task_id = unique_id(&state, &reserved, None);
        reserved.push(task_id.clone());
        requirements.push(QuestTask {
            id: task_id,
            description: task_description.to_string(),
            is_complete: false,
        });
    }

    debug!(
        "user {} created quest {} ('{}', {} tasks)",
        state.id,
        quest_id,
        escape_log(name),
        requirements.len()
    );
    state.quests.push(Quest {
        id: quest_id,
        name: name.to_string(),
        description: description.to_string(),
        quest_type,
        requirements,
        xp_reward,
        item_reward: None,
        skill_reward: None,
        is_complete: false,
        deadline,
    });
    state
}

pub fn create_dungeon_run(
    state: GameState,
    name: &str,
    description: &str,
    duration_minutes: u32,
    xp_reward: u32,
) -> GameState {
    create_dungeon_run_at(state, name, description, duration_minutes, xp_reward, Utc::now())
}

/// As [`create_dungeon_run`], with an explicit creation time.
pub fn create_dungeon_run_at(
    mut state: GameState,
    name: &str,
    description: &str,
    duration_minutes: u32,
    xp_reward: u32,
    now: DateTime<Utc>,
) -> GameState {
    let id = unique_id(&state, &[], Some(DUNGEON_ID_PREFIX));
    debug!(
        "user {} created dungeon {} ('{}', {} min)",
        state.id,
        id,
        escape_log(name),
        duration_minutes
    );
    state.dungeon_runs.push(DungeonRun {
        id,
        name: name.to_string(),
        description: description.to_string(),
        duration: duration_minutes,
        completed: false,
        rewards: DungeonRewards {
            xp: xp_reward,
            items: None,
        },
        created_at: now,
        completed_at: None,
    });
    state
}

pub fn create_streak_habit(state: GameState, name: &str, description: &str) -> GameState {
    create_streak_habit_at(state, name, description, Utc::now())
}

/// As [`create_streak_habit`], with an explicit creation time. The streak is
/// backdated one day so a completion on the creation day counts as day one.
pub fn create_streak_habit_at(
    mut state: GameState,
    name: &str,
    description: &str,
    now: DateTime<Utc>,
) -> GameState {
    let id = unique_id(&state, &[], Some(STREAK_ID_PREFIX));
    debug!("user {} created streak {} ('{}')", state.id, id, escape_log(name));
    state.streaks.push(Streak {
        id,
        name: name.to_string(),
        description: description.to_string(),
        days: 0,
        last_completed: now - Duration::days(1),
        is_active: true,
    });
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::create_initial_state;
    use chrono::TimeZone;
    use std::collections::HashSet;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 10, 18, 0, 0).unwrap()
    }

    #[test]
    fn custom_quest_starts_incomplete() {
        let before = create_initial_state(3, "hunter", now());
        let after = create_custom_quest(
            before.clone(),
            "Read",
            "Finish a book",
            QuestType::Achievement,
            &["chapter 1", "chapter 2", "chapter 3"],
            75,
            Some(now()),
        );
        assert_eq!(after.quests.len(), before.quests.len() + 1);
        let quest = after.quests.last().unwrap();
        assert!(quest.id.starts_with("quest-"));
        assert!(!quest.is_complete);
        assert_eq!(quest.xp_reward, 75);
        assert_eq!(quest.deadline, Some(now()));
        assert_eq!(quest.requirements.len(), 3);
        assert!(quest.requirements.iter().all(|task| !task.is_complete));
        assert!(quest
            .requirements
            .iter()
            .all(|task| Uuid::parse_str(&task.id).is_ok()));
    }

    #[test]
    fn generated_ids_are_unique_within_state() {
        let mut state = create_initial_state(3, "hunter", now());
        for i in 0..20 {
            state = create_custom_quest(state, "q", "d", QuestType::Daily, &["a", "b"], i, None);
            state = create_dungeon_run_at(state, "d", "d", 30, i, now());
            state = create_streak_habit_at(state, "s", "d", now());
        }
        let mut seen = HashSet::new();
        for quest in &state.quests {
            assert!(seen.insert(quest.id.clone()));
            for task in &quest.requirements {
                assert!(seen.insert(task.id.clone()));
            }
        }
        for run in &state.dungeon_runs {
            assert!(seen.insert(run.id.clone()));
        }
        for streak in &state.streaks {
            assert!(seen.insert(streak.id.clone()));
        }
    }

    #[test]
    fn dungeon_run_defaults() {
        let state = create_dungeon_run_at(create_initial_state(3, "hunter", now()), "Focus", "Deep work", 45, 80, now());
        let run = &state.dungeon_runs[0];
        assert!(run.id.starts_with("dungeon-"));
        assert!(!run.completed);
        assert_eq!(run.duration, 45);
        assert_eq!(run.rewards.xp, 80);
        assert!(run.rewards.items.is_none());
        assert_eq!(run.created_at, now());
        assert!(run.completed_at.is_none());
    }

    #[test]
    fn streak_habit_is_backdated() {
        let state = create_streak_habit_at(create_initial_state(3, "hunter", now()), "Walk", "10k steps", now());
        let streak = state.streaks.last().unwrap();
        assert!(streak.id.starts_with("streak-"));
        assert_eq!(streak.days, 0);
        assert!(streak.is_active);
        assert_eq!(streak.last_completed, now() - Duration::days(1));
    }
}
