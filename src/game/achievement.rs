//! Achievement evaluation.
//!
//! Each rule pairs a predicate over the game state with the achievement it
//! unlocks. All predicates are evaluated against the same input snapshot
//! before anything is unlocked, so rule order never matters.
use chrono::{DateTime, Utc};
use log::info;

use crate::game::types::GameState;

pub const AWAKENED_ID: &str = "achievement-awakened";
pub const FIRST_LEVEL_ID: &str = "achievement-first-level";
pub const STREAK_THREE_ID: &str = "achievement-streak-3";

/// A declarative unlock condition.
pub struct AchievementRule {
    pub achievement_id: &'static str,
    pub qualifies: fn(&GameState) -> bool,
}

/// Built-in rules, checked on every evaluation pass.
pub static ACHIEVEMENT_RULES: &[AchievementRule] = &[
    AchievementRule {
        achievement_id: FIRST_LEVEL_ID,
        qualifies: reached_second_level,
    },
    AchievementRule {
        achievement_id: STREAK_THREE_ID,
        qualifies: held_three_day_streak,
    },
];

fn reached_second_level(state: &GameState) -> bool {
    state.level >= 2
}

fn held_three_day_streak(state: &GameState) -> bool {
    state.streaks.iter().any(|streak| streak.days >= 3)
}

/// Ids of locked achievements whose rule is satisfied by `state`.
///
/// Achievements the state does not carry are ignored; rules never create new
/// achievement entries.
pub fn newly_qualified(state: &GameState) -> Vec<&'static str> {
    newly_qualified_with(state, ACHIEVEMENT_RULES)
}

fn newly_qualified_with(state: &GameState, rules: &[AchievementRule]) -> Vec<&'static str> {
    rules
        .iter()
        .filter(|rule| {
            state
                .achievement(rule.achievement_id)
                .is_some_and(|achievement| !achievement.is_unlocked)
        })
        .filter(|rule| (rule.qualifies)(state))
        .map(|rule| rule.achievement_id)
        .collect()
}

/// Unlock every newly qualifying achievement, stamped with the wall clock.
pub fn check_achievements(state: GameState) -> GameState {
    check_achievements_at(state, Utc::now())
}

/// Unlock every newly qualifying achievement, stamped with `now`.
/// Idempotent: a second pass over the result changes nothing.
pub fn check_achievements_at(state: GameState, now: DateTime<Utc>) -> GameState {
    apply_rules(state, ACHIEVEMENT_RULES, now)
}

fn apply_rules(mut state: GameState, rules: &[AchievementRule], now: DateTime<Utc>) -> GameState {
    let qualified = newly_qualified_with(&state, rules);
    if qualified.is_empty() {
        return state;
    }

    for achievement in state
        .achievements
        .iter_mut()
        .filter(|achievement| qualified.contains(&achievement.id.as_str()))
    {
        achievement.is_unlocked = true;
        achievement.unlocked_at = Some(now);
        info!(
            "user {} unlocked achievement {}",
            state.id, achievement.id
        );
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::create_initial_state;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 4, 12, 0, 0).unwrap()
    }

    #[test]
    fn starter_state_has_nothing_new() {
        let state = create_initial_state(1, "hunter", now());
        assert!(newly_qualified(&state).is_empty());
        let checked = check_achievements_at(state.clone(), now());
        assert_eq!(checked, state);
    }

    #[test]
    fn level_two_unlocks_first_level_once() {
        let mut state = create_initial_state(1, "hunter", now());
        state.level = 2;
        let unlocked = check_achievements_at(state, now());
        let achievement = unlocked.achievement(FIRST_LEVEL_ID).unwrap();
        assert!(achievement.is_unlocked);
        assert_eq!(achievement.unlocked_at, Some(now()));

        let later = now() + chrono::Duration::hours(5);
        let again = check_achievements_at(unlocked.clone(), later);
        assert_eq!(again, unlocked);
    }

    #[test]
    fn both_rules_fire_in_one_pass() {
        let mut state = create_initial_state(1, "hunter", now());
        state.level = 4;
        state.streaks[0].days = 3;
        assert_eq!(newly_qualified(&state).len(), 2);
        let unlocked = check_achievements_at(state, now());
        assert!(unlocked.achievement(FIRST_LEVEL_ID).unwrap().is_unlocked);
        assert!(unlocked.achievement(STREAK_THREE_ID).unwrap().is_unlocked);
    }

    #[test]
    fn rule_order_does_not_change_result() {
        let forward = [
            AchievementRule {
                achievement_id: FIRST_LEVEL_ID,
                qualifies: reached_second_level,
            },
            AchievementRule {
                achievement_id: STREAK_THREE_ID,
                qualifies: held_three_day_streak,
            },
        ];
        let reversed = [
            AchievementRule {
                achievement_id: STREAK_THREE_ID,
                qualifies: held_three_day_streak,
            },
            AchievementRule {
                achievement_id: FIRST_LEVEL_ID,
                qualifies: reached_second_level,
            },
        ];
        let mut state = create_initial_state(1, "hunter", now());
        state.level = 2;
        state.streaks[0].days = 5;
        assert_eq!(
            apply_rules(state.clone(), &forward, now()),
            apply_rules(state, &reversed, now())
        );
    }

    #[test]
    fn missing_achievement_entries_are_ignored() {
        let mut state = create_initial_state(1, "hunter", now());
        state.achievements.clear();
        state.level = 9;
        let checked = check_achievements_at(state.clone(), now());
        assert_eq!(checked, state);
    }
}
