//! XP and level math.
//!
//! Level `n` needs `floor(100 * 1.5^(n-1))` XP. Overflow XP carries into the
//! next level, so one large grant can span several levels; each level adds one
//! point to every stat.

use log::info;

use crate::game::types::{GameState, LevelUpEvent};

/// XP needed to clear level 1.
pub const BASE_REQUIRED_XP: u32 = 100;

/// Exponents beyond this already exceed `u32::MAX` once multiplied out.
const MAX_EXACT_EXPONENT: u32 = 60;

/// XP required to clear `level`. Computed in integers as `100 * 3^k / 2^k`
/// (k = level - 1) so the floor is exact; saturates at `u32::MAX`.
pub fn required_xp(level: u32) -> u32 {
    let exponent = level.max(1) - 1;
    if exponent > MAX_EXACT_EXPONENT {
        return u32::MAX;
    }
    let numerator = u128::from(BASE_REQUIRED_XP) * 3u128.pow(exponent);
    let value = numerator >> exponent;
    u32::try_from(value).unwrap_or(u32::MAX)
}

/// Add `xp` to the state and resolve any level-ups.
///
/// Returns at most one event; several level-ups from one grant collapse into a
/// single event reporting the starting level and the final level and stats.
/// A grant of zero returns the state untouched.
pub fn add_xp(mut state: GameState, xp: u32) -> (GameState, Option<LevelUpEvent>) {
    if xp == 0 {
        return (state, None);
    }

    let old_level = state.level;
    state.current_xp = state.current_xp.saturating_add(xp);

    while state.current_xp >= state.required_xp {
        state.current_xp -= state.required_xp;
        state.level = state.level.saturating_add(1);
        state.required_xp = required_xp(state.level);
        state.stats.grow(1);
    }

    if state.level == old_level {
        return (state, None);
    }

    info!(
        "user {} leveled up {} -> {}",
        state.id, old_level, state.level
    );
    let event = LevelUpEvent {
        old_level,
        new_level: state.level,
        new_stats: state.stats,
        unlocked_skills: Vec::new(),
        unlocked_items: Vec::new(),
    };
    (state, Some(event))
}

/// Progress toward the next level as a whole percentage, capped at 100.
pub fn xp_progress_percentage(current_xp: u32, required_xp: u32) -> u32 {
    if required_xp == 0 {
        return 100;
    }
    let percent = u64::from(current_xp) * 100 / u64::from(required_xp);
    percent.min(100) as u32
}
