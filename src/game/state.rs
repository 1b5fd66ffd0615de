//! Starter content for brand-new players.
//!
//! Every new account begins at level 1 with uniform stats, a small kit of
//! skills and items, the tutorial quest chain and a daily activity streak.

use chrono::{DateTime, Duration, TimeZone, Utc};
use uuid::Uuid;

use crate::game::achievement::{AWAKENED_ID, FIRST_LEVEL_ID, STREAK_THREE_ID};
use crate::game::progression::required_xp;
use crate::game::types::{
    Achievement, GameState, Item, ItemRarity, ItemType, Quest, QuestTask, QuestType, Skill,
    SkillType, StatBoosts, Stats, Streak, GAME_STATE_SCHEMA_VERSION,
};

pub const STARTING_STAT_VALUE: u32 = 5;
pub const TUTORIAL_QUEST_ID: &str = "quest-tutorial";
pub const DAILY_ROUTINE_QUEST_ID: &str = "quest-daily-routine";
pub const DAILY_ACTIVITY_STREAK_ID: &str = "streak-daily-activity";

/// Build the full starting snapshot for `username`.
pub fn create_initial_state(id: u64, username: &str, now: DateTime<Utc>) -> GameState {
    GameState {
        id,
        username: username.to_string(),
        level: 1,
        current_xp: 0,
        required_xp: required_xp(1),
        stats: Stats::uniform(STARTING_STAT_VALUE),
        achievements: seed_starter_achievements(now),
        skills: seed_starter_skills(),
        inventory: seed_starter_items(),
        quests: seed_starter_quests(now),
        streaks: seed_starter_streaks(now),
        dungeon_runs: Vec::new(),
        schema_version: GAME_STATE_SCHEMA_VERSION,
    }
}

fn skill(id: &str, name: &str, description: &str, skill_type: SkillType, effect: &str, icon: &str) -> Skill {
    Skill {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        level: 1,
        skill_type,
        effect: effect.to_string(),
        icon: icon.to_string(),
        unlocked: true,
        parent_skill_id: None,
        is_active: true,
    }
}

pub fn seed_starter_skills() -> Vec<Skill> {
    vec![
        skill(
            "skill-basic-fitness",
            "Basic Fitness",
            "The foundation of physical development",
            SkillType::Combat,
            "Increases strength gains by 5%",
            "dumbbell",
        ),
        skill(
            "skill-focused-study",
            "Focused Study",
            "Ability to concentrate on learning tasks",
            SkillType::Intellect,
            "Increases intelligence gains by 5%",
            "book-open",
        ),
        skill(
            "skill-basic-meditation",
            "Basic Meditation",
            "Simple meditation techniques for mental clarity",
            SkillType::Utility,
            "Increases willpower gains by 5%",
            "brain",
        ),
    ]
}

pub fn seed_starter_items() -> Vec<Item> {
    vec![
        Item {
            id: "item-novice-journal".to_string(),
            name: "Novice Journal".to_string(),
            description: "A simple journal to track your progress".to_string(),
            item_type: ItemType::Accessory,
            rarity: ItemRarity::Common,
            effect: "Increases XP gain by 2%".to_string(),
            icon: "book".to_string(),
            is_equipped: true,
            stat_boosts: Some(StatBoosts {
                intelligence: Some(1),
                ..Default::default()
            }),
        },
        Item {
            id: "item-basic-training-gear".to_string(),
            name: "Basic Training Gear".to_string(),
            description: "Simple workout clothes for beginners".to_string(),
            item_type: ItemType::Armor,
            rarity: ItemRarity::Common,
            effect: "Increases physical activity XP by 3%".to_string(),
            icon: "shirt".to_string(),
            is_equipped: true,
            stat_boosts: Some(StatBoosts {
                strength: Some(1),
                endurance: Some(1),
                ..Default::default()
            }),
        },
    ]
}

fn tasks(descriptions: &[&str]) -> Vec<QuestTask> {
    descriptions
        .iter()
        .map(|description| QuestTask {
            id: Uuid::new_v4().to_string(),
            description: description.to_string(),
            is_complete: false,
        })
        .collect()
}

/// Last millisecond of the UTC calendar day containing `now`.
fn end_of_day(now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    now.date_naive()
        .and_hms_milli_opt(23, 59, 59, 999)
        .map(|naive| Utc.from_utc_datetime(&naive))
}

pub fn seed_starter_quests(now: DateTime<Utc>) -> Vec<Quest> {
    vec![
        Quest {
            id: TUTORIAL_QUEST_ID.to_string(),
            name: "Awakening".to_string(),
            description: "Complete the tutorial to understand your new powers".to_string(),
            quest_type: QuestType::Storyline,
            requirements: tasks(&[
                "Create your first task",
                "Complete your first task",
                "View your skill tree",
            ]),
            xp_reward: 50,
            item_reward: None,
            skill_reward: None,
            is_complete: false,
            deadline: None,
        },
        Quest {
            id: DAILY_ROUTINE_QUEST_ID.to_string(),
            name: "Daily Routine".to_string(),
            description: "Establish a daily habit to increase your power".to_string(),
            quest_type: QuestType::Daily,
            requirements: tasks(&[
                "Complete one physical activity",
                "Complete one mental activity",
            ]),
            xp_reward: 30,
            item_reward: None,
            skill_reward: None,
            is_complete: false,
            deadline: end_of_day(now),
        },
    ]
}

pub fn seed_starter_achievements(now: DateTime<Utc>) -> Vec<Achievement> {
    vec![
        Achievement {
            id: AWAKENED_ID.to_string(),
            name: "Awakened".to_string(),
            description: "Start your journey as a Hunter".to_string(),
            icon: "sunrise".to_string(),
            is_unlocked: true,
            unlocked_at: Some(now),
        },
        Achievement {
            id: FIRST_LEVEL_ID.to_string(),
            name: "The Beginning".to_string(),
            description: "Reach level 2".to_string(),
            icon: "trending-up".to_string(),
            is_unlocked: false,
            unlocked_at: None,
        },
        Achievement {
            id: STREAK_THREE_ID.to_string(),
            name: "Consistent".to_string(),
            description: "Maintain a streak for 3 days".to_string(),
            icon: "calendar".to_string(),
            is_unlocked: false,
            unlocked_at: None,
        },
    ]
}

/// The daily activity streak is backdated one day so the first completion
/// counts as a continuation.
pub fn seed_starter_streaks(now: DateTime<Utc>) -> Vec<Streak> {
    vec![Streak {
        id: DAILY_ACTIVITY_STREAK_ID.to_string(),
        name: "Daily Activity".to_string(),
        description: "Complete at least one activity every day".to_string(),
        days: 0,
        last_completed: now - Duration::days(1),
        is_active: true,
    }]
}
