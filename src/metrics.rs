//! Process-wide engine counters.
//! Plain atomics plus a per-task-type table; reported by `sololevel status`.
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock, PoisonError};

use serde::Serialize;

static XP_AWARDED: AtomicU64 = AtomicU64::new(0);
static LEVEL_UPS: AtomicU64 = AtomicU64::new(0);
static ACHIEVEMENTS_UNLOCKED: AtomicU64 = AtomicU64::new(0);
static STORE_CONFLICTS: AtomicU64 = AtomicU64::new(0);

static TASK_COUNTERS: OnceLock<Mutex<HashMap<String, TaskCounter>>> = OnceLock::new();

pub fn add_xp_awarded(xp: u32) {
    XP_AWARDED.fetch_add(u64::from(xp), Ordering::Relaxed);
}

pub fn inc_level_ups() {
    LEVEL_UPS.fetch_add(1, Ordering::Relaxed);
}

pub fn add_achievements_unlocked(count: usize) {
    ACHIEVEMENTS_UNLOCKED.fetch_add(count as u64, Ordering::Relaxed);
}

pub fn inc_store_conflicts() {
    STORE_CONFLICTS.fetch_add(1, Ordering::Relaxed);
}

/// Completion events seen for one task type.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TaskCounter {
    pub applied: u64,
    pub ignored: u64,
    pub xp: u64,
}

fn task_counter_lock() -> &'static Mutex<HashMap<String, TaskCounter>> {
    TASK_COUNTERS.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Count one completion event. `applied` is false for no-ops.
pub fn record_task_completion(task_type: &str, applied: bool, xp: u32) -> TaskCounter {
    let mut guard = task_counter_lock()
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    let counter = guard.entry(task_type.to_string()).or_default();
    if applied {
        counter.applied = counter.applied.saturating_add(1);
    } else {
        counter.ignored = counter.ignored.saturating_add(1);
    }
    counter.xp = counter.xp.saturating_add(u64::from(xp));
    *counter
}

pub fn task_counters_snapshot() -> HashMap<String, TaskCounter> {
    task_counter_lock()
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub xp_awarded: u64,
    pub level_ups: u64,
    pub achievements_unlocked: u64,
    pub store_conflicts: u64,
    pub tasks: HashMap<String, TaskCounter>,
}

pub fn snapshot() -> MetricsSnapshot {
    MetricsSnapshot {
        xp_awarded: XP_AWARDED.load(Ordering::Relaxed),
        level_ups: LEVEL_UPS.load(Ordering::Relaxed),
        achievements_unlocked: ACHIEVEMENTS_UNLOCKED.load(Ordering::Relaxed),
        store_conflicts: STORE_CONFLICTS.load(Ordering::Relaxed),
        tasks: task_counters_snapshot(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_counters_split_applied_and_ignored() {
        // Unique key so parallel tests touching "quest" etc. do not interfere.
        let key = "metrics-test-kind";
        let first = record_task_completion(key, true, 30);
        assert_eq!(first.applied, 1);
        assert_eq!(first.ignored, 0);
        assert_eq!(first.xp, 30);

        let second = record_task_completion(key, false, 0);
        assert_eq!(second.applied, 1);
        assert_eq!(second.ignored, 1);
        assert_eq!(second.xp, 30);

        let snap = snapshot();
        assert_eq!(snap.tasks.get(key), Some(&second));
    }

    #[test]
    fn global_counters_only_grow() {
        let before = snapshot();
        add_xp_awarded(15);
        inc_level_ups();
        add_achievements_unlocked(2);
        let after = snapshot();
        assert!(after.xp_awarded >= before.xp_awarded + 15);
        assert!(after.level_ups > before.level_ups);
        assert!(after.achievements_unlocked >= before.achievements_unlocked + 2);
    }
}
