//! Per-user progress analytics.
//!
//! XP history is bucketed by calendar position of the completion time (UTC):
//! `daily` by weekday starting Sunday, `weekly` by week of the month (days
//! 29-31 fold into the last bucket) and `monthly` by month. Buckets are
//! cumulative and never roll over.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::game::engine::TaskOutcome;
use crate::game::types::{GameState, TaskCompletionEvent, TaskType};

pub const ANALYTICS_SCHEMA_VERSION: u8 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct XpHistory {
    pub daily: [u64; 7],
    pub weekly: [u64; 4],
    pub monthly: [u64; 12],
}

impl XpHistory {
    pub fn record(&mut self, xp: u32, at: DateTime<Utc>) {
        let xp = u64::from(xp);
        let day = at.weekday().num_days_from_sunday() as usize;
        let week = ((at.day0() / 7) as usize).min(self.weekly.len() - 1);
        let month = at.month0() as usize;
        self.daily[day] = self.daily[day].saturating_add(xp);
        self.weekly[week] = self.weekly[week].saturating_add(xp);
        self.monthly[month] = self.monthly[month].saturating_add(xp);
    }

    pub fn total(&self) -> u64 {
        self.monthly.iter().sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsData {
    pub user_id: u64,
    pub xp_gained: XpHistory,
    pub quests_completed: u64,
    pub dungeon_runs_completed: u64,
    pub streak_longest: u32,
    pub skills_learned: u32,
    pub level_ups: u64,
    #[serde(default = "default_schema_version")]
    pub schema_version: u8,
}

fn default_schema_version() -> u8 {
    ANALYTICS_SCHEMA_VERSION
}

impl AnalyticsData {
    pub fn new(user_id: u64) -> Self {
        Self {
            user_id,
            xp_gained: XpHistory::default(),
            quests_completed: 0,
            dungeon_runs_completed: 0,
            streak_longest: 0,
            skills_learned: 0,
            level_ups: 0,
            schema_version: ANALYTICS_SCHEMA_VERSION,
        }
    }

    /// Fold one completion outcome in. Outcomes that awarded no XP leave the
    /// record untouched.
    pub fn record_completion(&mut self, event: &TaskCompletionEvent, outcome: &TaskOutcome) {
        if outcome.xp_gained == 0 {
            return;
        }
        self.xp_gained.record(outcome.xp_gained, event.completion_time);

        match event.task_type {
            TaskType::Quest => self.quests_completed += 1,
            TaskType::Dungeon => self.dungeon_runs_completed += 1,
            TaskType::Streak => {
                if let Some(streak) = outcome.state.streak(&event.id) {
                    self.streak_longest = self.streak_longest.max(streak.days);
                }
            }
            TaskType::Unknown => {}
        }

        if outcome.level_up.is_some() {
            self.level_ups += 1;
        }
        self.sync_skills(&outcome.state);
    }

    /// Fold in a direct XP grant.
    pub fn record_experience(&mut self, xp: u32, leveled_up: bool, at: DateTime<Utc>) {
        if xp == 0 {
            return;
        }
        self.xp_gained.record(xp, at);
        if leveled_up {
            self.level_ups += 1;
        }
    }

    pub fn sync_skills(&mut self, state: &GameState) {
        self.skills_learned = state.skills.iter().filter(|skill| skill.unlocked).count() as u32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::engine::complete_task;
    use crate::game::factory::create_dungeon_run_at;
    use crate::game::state::{create_initial_state, DAILY_ACTIVITY_STREAK_ID};
    use chrono::TimeZone;

    #[test]
    fn buckets_follow_calendar_position() {
        let mut history = XpHistory::default();
        // Sunday 2024-03-31
        history.record(40, Utc.with_ymd_and_hms(2024, 3, 31, 12, 0, 0).unwrap());
        // Monday 2024-04-08
        history.record(10, Utc.with_ymd_and_hms(2024, 4, 8, 12, 0, 0).unwrap());
        assert_eq!(history.daily[0], 40);
        assert_eq!(history.daily[1], 10);
        assert_eq!(history.weekly[3], 40);
        assert_eq!(history.weekly[1], 10);
        assert_eq!(history.monthly[2], 40);
        assert_eq!(history.monthly[3], 10);
        assert_eq!(history.total(), 50);
    }

    #[test]
    fn dungeon_completion_counts_and_levels() {
        let at = Utc.with_ymd_and_hms(2024, 3, 5, 9, 0, 0).unwrap();
        let state = create_dungeon_run_at(create_initial_state(1, "hunter", at), "Focus", "", 60, 150, at);
        let event = TaskCompletionEvent::dungeon(&state.dungeon_runs[0].id.clone(), at);
        let outcome = complete_task(state, &event);

        let mut analytics = AnalyticsData::new(1);
        analytics.record_completion(&event, &outcome);
        assert_eq!(analytics.dungeon_runs_completed, 1);
        assert_eq!(analytics.level_ups, 1);
        assert_eq!(analytics.skills_learned, 3);
        assert_eq!(analytics.xp_gained.total(), 150);

        let replay = complete_task(outcome.state.clone(), &event);
        analytics.record_completion(&event, &replay);
        assert_eq!(analytics.dungeon_runs_completed, 1);
    }

    #[test]
    fn streak_completion_tracks_longest() {
        let at = Utc.with_ymd_and_hms(2024, 3, 5, 9, 0, 0).unwrap();
        let mut state = create_initial_state(1, "hunter", at);
        state.streaks[0].days = 7;
        let event = TaskCompletionEvent::streak(DAILY_ACTIVITY_STREAK_ID, at);
        let outcome = complete_task(state, &event);

        let mut analytics = AnalyticsData::new(1);
        analytics.record_completion(&event, &outcome);
        assert_eq!(analytics.streak_longest, 8);
        assert_eq!(analytics.quests_completed, 0);
    }

    #[test]
    fn serializes_with_camel_case_names() {
        let json = serde_json::to_value(AnalyticsData::new(4)).unwrap();
        assert!(json.get("xpGained").is_some());
        assert!(json.get("dungeonRunsCompleted").is_some());
        assert_eq!(json["xpGained"]["monthly"].as_array().unwrap().len(), 12);
    }
}
