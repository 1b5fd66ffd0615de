//! Task resolution: applies one "task completed" event to a game state.
//!
//! Quests pay out once, when their last task completes. Dungeon runs pay out
//! once. Streaks pay out at most once per calendar day. Events that name an
//! unknown entity, target something already finished or carry an unknown task
//! type leave the state untouched and award nothing.

use chrono::{DateTime, Utc};
use log::debug;

use crate::game::achievement::check_achievements_at;
use crate::game::progression::add_xp;
use crate::game::streak::{self, StreakProgress};
use crate::game::types::{GameState, LevelUpEvent, TaskCompletionEvent, TaskType};

/// Result of applying one completion event.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskOutcome {
    pub state: GameState,
    pub xp_gained: u32,
    pub level_up: Option<LevelUpEvent>,
    /// Whether the event changed anything (partial quest progress counts).
    pub applied: bool,
}

/// How a branch handled its target, before rewards are paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resolution {
    Applied { xp: u32 },
    AlreadyDone,
    NotFound,
}

/// Apply `event` to `state`.
///
/// Never fails: anything that cannot be applied comes back as the original
/// state with zero XP. After XP resolution, achievements are re-evaluated so
/// unlocks triggered by this event show up immediately.
pub fn complete_task(state: GameState, event: &TaskCompletionEvent) -> TaskOutcome {
    let mut next = state.clone();
    let resolution = match event.task_type {
        TaskType::Quest => match event.task_id.as_deref() {
            Some(task_id) => resolve_quest(&mut next, &event.id, task_id),
            None => Resolution::NotFound,
        },
        TaskType::Streak => resolve_streak(&mut next, &event.id, event.completion_time),
        TaskType::Dungeon => resolve_dungeon(&mut next, &event.id, event.completion_time),
        TaskType::Unknown => Resolution::NotFound,
    };

    let xp_gained = match resolution {
        Resolution::Applied { xp } => xp,
        Resolution::AlreadyDone => {
            debug!(
                "{} {} for user {} already complete; nothing to apply",
                event.task_type.as_str(),
                event.id,
                state.id
            );
            0
        }
        Resolution::NotFound => {
            debug!(
                "{} {} not found for user {}; ignoring",
                event.task_type.as_str(),
                event.id,
                state.id
            );
            return TaskOutcome {
                state,
                xp_gained: 0,
                level_up: None,
                applied: false,
            };
        }
    };

    let (next, level_up) = if xp_gained > 0 {
        add_xp(next, xp_gained)
    } else {
        (next, None)
    };
    let next = check_achievements_at(next, event.completion_time);

    TaskOutcome {
        state: next,
        xp_gained,
        level_up,
        applied: matches!(resolution, Resolution::Applied { .. }),
    }
}

fn resolve_quest(state: &mut GameState, quest_id: &str, task_id: &str) -> Resolution {
    let Some(quest) = state.quests.iter_mut().find(|quest| quest.id == quest_id) else {
        return Resolution::NotFound;
    };
    let Some(task_index) = quest.requirements.iter().position(|task| task.id == task_id) else {
        return Resolution::NotFound;
    };
    if quest.is_complete || quest.requirements[task_index].is_complete {
        return Resolution::AlreadyDone;
    }

    quest.requirements[task_index].is_complete = true;
    if !quest.all_tasks_complete() {
        return Resolution::Applied { xp: 0 };
    }

    quest.is_complete = true;
    Resolution::Applied {
        xp: quest.xp_reward,
    }
}

fn resolve_streak(state: &mut GameState, streak_id: &str, at: DateTime<Utc>) -> Resolution {
    let Some(streak) = state.streaks.iter_mut().find(|streak| streak.id == streak_id) else {
        return Resolution::NotFound;
    };

    let xp = match streak::evaluate(streak, at) {
        StreakProgress::SameDay | StreakProgress::OutOfOrder => return Resolution::AlreadyDone,
        StreakProgress::Continued { days } => {
            streak.days = days;
            streak::continuation_reward(days)
        }
        StreakProgress::Reset => {
            streak.days = 1;
            streak::reset_reward()
        }
    };
    streak.last_completed = at;
    streak.is_active = true;
    Resolution::Applied { xp }
}

fn resolve_dungeon(state: &mut GameState, run_id: &str, at: DateTime<Utc>) -> Resolution {
    let Some(run) = state.dungeon_runs.iter_mut().find(|run| run.id == run_id) else {
        return Resolution::NotFound;
    };
    if run.completed {
        return Resolution::AlreadyDone;
    }
    run.completed = true;
    run.completed_at = Some(at);
    Resolution::Applied { xp: run.rewards.xp }
}
