//! Equipment and skill toggles.

use log::debug;

use crate::game::types::{GameState, Stats};

/// Flip `is_equipped` on the item with `item_id`. Unknown ids are a no-op.
pub fn toggle_equip_item(mut state: GameState, item_id: &str) -> GameState {
    match state.inventory.iter_mut().find(|item| item.id == item_id) {
        Some(item) => {
            item.is_equipped = !item.is_equipped;
            debug!(
                "user {} item {} equipped={}",
                state.id, item.id, item.is_equipped
            );
        }
        None => debug!("user {} has no item {}", state.id, item_id),
    }
    state
}

/// Flip `is_active` on the skill with `skill_id`. Unknown ids are a no-op.
pub fn toggle_skill(mut state: GameState, skill_id: &str) -> GameState {
    match state.skills.iter_mut().find(|skill| skill.id == skill_id) {
        Some(skill) => {
            skill.is_active = !skill.is_active;
            debug!(
                "user {} skill {} active={}",
                state.id, skill.id, skill.is_active
            );
        }
        None => debug!("user {} has no skill {}", state.id, skill_id),
    }
    state
}

/// Base stats plus the boosts of every equipped item. Display only; the
/// stored stats are never changed by equipment.
pub fn effective_stats(state: &GameState) -> Stats {
    state
        .inventory
        .iter()
        .filter(|item| item.is_equipped)
        .filter_map(|item| item.stat_boosts.as_ref())
        .fold(state.stats, |stats, boosts| stats.boosted_by(boosts))
}
