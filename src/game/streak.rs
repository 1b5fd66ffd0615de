//! Streak continuity rules.
//!
//! Continuity is decided by calendar dates (UTC), never by elapsed hours: two
//! completions on the same date are one completion, the next date extends the
//! streak, and any larger gap starts over at day one.

use chrono::{DateTime, Utc};

use crate::game::types::Streak;

/// XP for any counted streak completion.
pub const STREAK_BASE_XP: u32 = 10;
/// Every this many consecutive days raises the continuation bonus.
pub const STREAK_BONUS_INTERVAL_DAYS: u32 = 3;
/// Bonus XP per completed interval.
pub const STREAK_BONUS_XP: u32 = 5;

/// What a completion at a given moment does to a streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakProgress {
    /// Already completed on this calendar day.
    SameDay,
    /// Completed on the following calendar day; carries the new day count.
    Continued { days: u32 },
    /// One or more days were skipped; the streak restarts at day one.
    Reset,
    /// Completion is dated before the last recorded completion.
    OutOfOrder,
}

/// Signed number of calendar days from `earlier` to `later`.
pub fn calendar_day_gap(earlier: DateTime<Utc>, later: DateTime<Utc>) -> i64 {
    (later.date_naive() - earlier.date_naive()).num_days()
}

pub fn evaluate(streak: &Streak, at: DateTime<Utc>) -> StreakProgress {
    match calendar_day_gap(streak.last_completed, at) {
        0 => StreakProgress::SameDay,
        1 => StreakProgress::Continued {
            days: streak.days.saturating_add(1),
        },
        gap if gap > 1 => StreakProgress::Reset,
        _ => StreakProgress::OutOfOrder,
    }
}

/// Reward for extending a streak to `days`: `10 + floor(days / 3) * 5`.
pub fn continuation_reward(days: u32) -> u32 {
    let intervals = days / STREAK_BONUS_INTERVAL_DAYS;
    STREAK_BASE_XP.saturating_add(intervals.saturating_mul(STREAK_BONUS_XP))
}

/// Reward for restarting a broken streak.
pub fn reset_reward() -> u32 {
    STREAK_BASE_XP
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
    }

    fn streak(days: u32, last: DateTime<Utc>) -> Streak {
        Streak {
            id: "streak-test".to_string(),
            name: "Read".to_string(),
            description: "Read ten pages".to_string(),
            days,
            last_completed: last,
            is_active: true,
        }
    }

    #[test]
    fn gap_uses_dates_not_hours() {
        assert_eq!(calendar_day_gap(at(1, 23), at(2, 0)), 1);
        assert_eq!(calendar_day_gap(at(1, 0), at(1, 23)), 0);
        assert_eq!(calendar_day_gap(at(3, 0), at(1, 12)), -2);
    }

    #[test]
    fn evaluate_covers_all_cases() {
        let s = streak(5, at(10, 8));
        assert_eq!(evaluate(&s, at(10, 22)), StreakProgress::SameDay);
        assert_eq!(evaluate(&s, at(11, 1)), StreakProgress::Continued { days: 6 });
        assert_eq!(evaluate(&s, at(13, 9)), StreakProgress::Reset);
        assert_eq!(evaluate(&s, at(9, 9)), StreakProgress::OutOfOrder);
    }

    #[test]
    fn reward_is_monotonic_in_days() {
        assert_eq!(continuation_reward(1), 10);
        assert_eq!(continuation_reward(2), 10);
        assert_eq!(continuation_reward(3), 15);
        assert_eq!(continuation_reward(6), 20);
        let mut previous = 0;
        for days in 0..100 {
            let reward = continuation_reward(days);
            assert!(reward >= previous);
            previous = reward;
        }
        assert_eq!(reset_reward(), 10);
    }
}
