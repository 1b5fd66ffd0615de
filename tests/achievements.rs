/// Achievement evaluation over whole game states.
mod common;

use common::{fresh_state, june};
use sololevel::game::{
    add_xp, check_achievements_at, newly_qualified, FIRST_LEVEL_ID, STREAK_THREE_ID,
};

#[test]
fn test_fresh_state_has_nothing_to_unlock() {
    let state = fresh_state(1);
    assert!(newly_qualified(&state).is_empty());
    assert_eq!(check_achievements_at(state.clone(), june(2, 9, 0)), state);
}

#[test]
fn test_both_rules_unlock_in_one_pass() {
    let (mut state, _) = add_xp(fresh_state(1), 100);
    state.streaks[0].days = 3;

    let mut qualified = newly_qualified(&state);
    qualified.sort_unstable();
    assert_eq!(qualified, vec![FIRST_LEVEL_ID, STREAK_THREE_ID]);

    let unlocked = check_achievements_at(state, june(2, 9, 0));
    for id in [FIRST_LEVEL_ID, STREAK_THREE_ID] {
        let achievement = unlocked.achievement(id).unwrap();
        assert!(achievement.is_unlocked);
        assert_eq!(achievement.unlocked_at, Some(june(2, 9, 0)));
    }
}

#[test]
fn test_unlocks_survive_losing_the_condition() {
    let mut state = fresh_state(1);
    state.streaks[0].days = 4;
    let unlocked = check_achievements_at(state, june(2, 9, 0));

    let mut reset = unlocked.clone();
    reset.streaks[0].days = 1;
    let rechecked = check_achievements_at(reset, june(9, 9, 0));
    let achievement = rechecked.achievement(STREAK_THREE_ID).unwrap();
    assert!(achievement.is_unlocked);
    assert_eq!(achievement.unlocked_at, Some(june(2, 9, 0)));
}

#[test]
fn test_missing_achievement_entry_is_ignored() {
    let (mut state, _) = add_xp(fresh_state(1), 500);
    state.achievements.retain(|a| a.id != FIRST_LEVEL_ID);
    let checked = check_achievements_at(state.clone(), june(2, 9, 0));
    assert_eq!(checked.achievements, state.achievements);
}
