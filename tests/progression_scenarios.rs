/// Integration tests for XP grants and level math through the public API.
mod common;

use common::fresh_state;
use sololevel::game::{
    add_xp, check_achievements, required_xp, xp_progress_percentage, StatType, FIRST_LEVEL_ID,
};

#[test]
fn test_ninety_plus_twenty_reaches_level_two() {
    let mut state = fresh_state(1);
    state.current_xp = 90;

    let (after, event) = add_xp(state, 20);
    assert_eq!(after.level, 2);
    assert_eq!(after.current_xp, 10);
    assert_eq!(after.required_xp, 150);
    for stat in StatType::ALL {
        assert_eq!(after.stats.get(stat), 6, "{}", stat.as_str());
    }

    let event = event.expect("level up");
    assert_eq!(event.old_level, 1);
    assert_eq!(event.new_level, 2);
    assert_eq!(event.new_stats, after.stats);
    assert!(event.unlocked_skills.is_empty());
    assert!(event.unlocked_items.is_empty());
}

#[test]
fn test_two_threshold_grant_yields_one_event() {
    let state = fresh_state(1);
    let grant = required_xp(1) + required_xp(2);

    let (after, event) = add_xp(state.clone(), grant);
    let event = event.expect("level up");
    assert_eq!(event.old_level, 1);
    assert_eq!(event.new_level, 3);
    assert_eq!(after.current_xp, 0);
    for stat in StatType::ALL {
        assert_eq!(after.stats.get(stat), state.stats.get(stat) + 2);
    }
}

#[test]
fn test_level_and_stats_never_decrease() {
    let mut state = fresh_state(1);
    let grants = [0u32, 5, 95, 149, 1, 1_000, 37, 20_000, 0, 3];
    for xp in grants {
        let before = state.clone();
        let (after, event) = add_xp(state, xp);
        assert!(after.level >= before.level);
        assert!(after.current_xp < after.required_xp);
        assert_eq!(after.required_xp, required_xp(after.level));
        for stat in StatType::ALL {
            assert!(after.stats.get(stat) >= before.stats.get(stat));
        }
        assert_eq!(event.is_some(), after.level > before.level);
        state = after;
    }
}

#[test]
fn test_first_level_achievement_unlocks_once() {
    let state = fresh_state(1);
    assert!(!state.achievement(FIRST_LEVEL_ID).unwrap().is_unlocked);

    let (leveled, _) = add_xp(state, 100);
    assert_eq!(leveled.level, 2);

    let checked = check_achievements(leveled);
    let achievement = checked.achievement(FIRST_LEVEL_ID).unwrap();
    assert!(achievement.is_unlocked);
    let stamped = achievement.unlocked_at;
    assert!(stamped.is_some());

    let again = check_achievements(checked.clone());
    assert_eq!(again, checked);
    assert_eq!(again.achievement(FIRST_LEVEL_ID).unwrap().unlocked_at, stamped);
}

#[test]
fn test_progress_percentage_tracks_state() {
    let (state, _) = add_xp(fresh_state(1), 175);
    assert_eq!(state.level, 2);
    assert_eq!(state.current_xp, 75);
    assert_eq!(xp_progress_percentage(state.current_xp, state.required_xp), 50);
}
