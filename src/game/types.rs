use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const GAME_STATE_SCHEMA_VERSION: u8 = 1;

fn default_schema_version() -> u8 {
    GAME_STATE_SCHEMA_VERSION
}

/// The six attributes that grow by one point per level.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum StatType {
    Strength,
    Intelligence,
    Endurance,
    Willpower,
    Charisma,
    Dexterity,
}

impl StatType {
    pub const ALL: [StatType; 6] = [
        StatType::Strength,
        StatType::Intelligence,
        StatType::Endurance,
        StatType::Willpower,
        StatType::Charisma,
        StatType::Dexterity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strength => "strength",
            Self::Intelligence => "intelligence",
            Self::Endurance => "endurance",
            Self::Willpower => "willpower",
            Self::Charisma => "charisma",
            Self::Dexterity => "dexterity",
        }
    }

    /// Icon name used by the dashboard for this attribute.
    pub fn icon(&self) -> &'static str {
        match self {
            Self::Strength => "dumbbell",
            Self::Intelligence => "brain",
            Self::Endurance => "heart",
            Self::Willpower => "shield",
            Self::Charisma => "users",
            Self::Dexterity => "target",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Stats {
    pub strength: u32,
    pub intelligence: u32,
    pub endurance: u32,
    pub willpower: u32,
    pub charisma: u32,
    pub dexterity: u32,
}

impl Stats {
    pub fn uniform(value: u32) -> Self {
        Self {
            strength: value,
            intelligence: value,
            endurance: value,
            willpower: value,
            charisma: value,
            dexterity: value,
        }
    }

    pub fn get(&self, stat: StatType) -> u32 {
        match stat {
            StatType::Strength => self.strength,
            StatType::Intelligence => self.intelligence,
            StatType::Endurance => self.endurance,
            StatType::Willpower => self.willpower,
            StatType::Charisma => self.charisma,
            StatType::Dexterity => self.dexterity,
        }
    }

    fn slot_mut(&mut self, stat: StatType) -> &mut u32 {
        match stat {
            StatType::Strength => &mut self.strength,
            StatType::Intelligence => &mut self.intelligence,
            StatType::Endurance => &mut self.endurance,
            StatType::Willpower => &mut self.willpower,
            StatType::Charisma => &mut self.charisma,
            StatType::Dexterity => &mut self.dexterity,
        }
    }

    /// Raise every attribute by `points`. Stats never decrease.
    pub fn grow(&mut self, points: u32) {
        for stat in StatType::ALL {
            let slot = self.slot_mut(stat);
            *slot = slot.saturating_add(points);
        }
    }

    /// Apply a partial boost (e.g. from an equipped item).
    pub fn boosted_by(mut self, boosts: &StatBoosts) -> Self {
        for stat in StatType::ALL {
            if let Some(extra) = boosts.get(stat) {
                let slot = self.slot_mut(stat);
                *slot = slot.saturating_add(extra);
            }
        }
        self
    }
}

/// Sparse stat bonus carried by items.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct StatBoosts {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strength: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intelligence: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endurance: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub willpower: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charisma: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dexterity: Option<u32>,
}

impl StatBoosts {
    pub fn get(&self, stat: StatType) -> Option<u32> {
        match stat {
            StatType::Strength => self.strength,
            StatType::Intelligence => self.intelligence,
            StatType::Endurance => self.endurance,
            StatType::Willpower => self.willpower,
            StatType::Charisma => self.charisma,
            StatType::Dexterity => self.dexterity,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SkillType {
    Combat,
    Intellect,
    Utility,
    Special,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    pub id: String,
    pub name: String,
    pub description: String,
    pub level: u32,
    #[serde(rename = "type")]
    pub skill_type: SkillType,
    pub effect: String,
    pub icon: String,
    pub unlocked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_skill_id: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Weapon,
    Armor,
    Accessory,
    Consumable,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ItemRarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub rarity: ItemRarity,
    pub effect: String,
    pub icon: String,
    pub is_equipped: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stat_boosts: Option<StatBoosts>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum QuestType {
    Daily,
    Weekly,
    Achievement,
    Storyline,
}

impl QuestType {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "daily" => Some(Self::Daily),
            "weekly" => Some(Self::Weekly),
            "achievement" => Some(Self::Achievement),
            "storyline" => Some(Self::Storyline),
            _ => None,
        }
    }
}

/// One step of a quest. Flips from incomplete to complete exactly once.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QuestTask {
    pub id: String,
    pub description: String,
    pub is_complete: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Quest {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub quest_type: QuestType,
    pub requirements: Vec<QuestTask>,
    pub xp_reward: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_reward: Option<Item>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill_reward: Option<Skill>,
    pub is_complete: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,
}

impl Quest {
    pub fn task(&self, task_id: &str) -> Option<&QuestTask> {
        self.requirements.iter().find(|task| task.id == task_id)
    }

    pub fn all_tasks_complete(&self) -> bool {
        !self.requirements.is_empty() && self.requirements.iter().all(|task| task.is_complete)
    }

    pub fn completed_task_count(&self) -> usize {
        self.requirements.iter().filter(|task| task.is_complete).count()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub is_unlocked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unlocked_at: Option<DateTime<Utc>>,
}

/// Daily habit counter keyed on calendar-day gaps between completions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Streak {
    pub id: String,
    pub name: String,
    pub description: String,
    pub days: u32,
    pub last_completed: DateTime<Utc>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct DungeonRewards {
    pub xp: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<Item>>,
}

/// A timed focus session. `duration` is in minutes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DungeonRun {
    pub id: String,
    pub name: String,
    pub description: String,
    pub duration: u32,
    pub completed: bool,
    pub rewards: DungeonRewards,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Root aggregate: the full progression snapshot of one user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub id: u64,
    pub username: String,
    pub level: u32,
    #[serde(rename = "currentXP")]
    pub current_xp: u32,
    #[serde(rename = "requiredXP")]
    pub required_xp: u32,
    pub stats: Stats,
    #[serde(default)]
    pub achievements: Vec<Achievement>,
    #[serde(default)]
    pub skills: Vec<Skill>,
    #[serde(default)]
    pub inventory: Vec<Item>,
    #[serde(default)]
    pub quests: Vec<Quest>,
    #[serde(default)]
    pub streaks: Vec<Streak>,
    #[serde(default)]
    pub dungeon_runs: Vec<DungeonRun>,
    #[serde(default = "default_schema_version")]
    pub schema_version: u8,
}

impl GameState {
    pub fn quest(&self, quest_id: &str) -> Option<&Quest> {
        self.quests.iter().find(|quest| quest.id == quest_id)
    }

    pub fn streak(&self, streak_id: &str) -> Option<&Streak> {
        self.streaks.iter().find(|streak| streak.id == streak_id)
    }

    pub fn dungeon_run(&self, run_id: &str) -> Option<&DungeonRun> {
        self.dungeon_runs.iter().find(|run| run.id == run_id)
    }

    pub fn achievement(&self, achievement_id: &str) -> Option<&Achievement> {
        self.achievements
            .iter()
            .find(|achievement| achievement.id == achievement_id)
    }

    pub fn unlocked_achievement_ids(&self) -> Vec<&str> {
        self.achievements
            .iter()
            .filter(|achievement| achievement.is_unlocked)
            .map(|achievement| achievement.id.as_str())
            .collect()
    }

    /// True when any entity (or quest task) in this snapshot already uses `id`.
    pub fn contains_id(&self, id: &str) -> bool {
        self.quests.iter().any(|quest| {
            quest.id == id || quest.requirements.iter().any(|task| task.id == id)
        }) || self.streaks.iter().any(|streak| streak.id == id)
            || self.dungeon_runs.iter().any(|run| run.id == id)
            || self.achievements.iter().any(|achievement| achievement.id == id)
            || self.skills.iter().any(|skill| skill.id == id)
            || self.inventory.iter().any(|item| item.id == id)
    }
}

/// Transient report of a level change produced by one XP grant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LevelUpEvent {
    pub old_level: u32,
    pub new_level: u32,
    pub new_stats: Stats,
    #[serde(default)]
    pub unlocked_skills: Vec<Skill>,
    #[serde(default)]
    pub unlocked_items: Vec<Item>,
}

impl LevelUpEvent {
    pub fn levels_gained(&self) -> u32 {
        self.new_level.saturating_sub(self.old_level)
    }
}

/// Kind of task a completion event targets. Unrecognised kinds are kept as
/// `Unknown` so a malformed-but-well-typed event degrades to a no-op.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(from = "String", into = "String")]
pub enum TaskType {
    Quest,
    Streak,
    Dungeon,
    Unknown,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Quest => "quest",
            Self::Streak => "streak",
            Self::Dungeon => "dungeon",
            Self::Unknown => "unknown",
        }
    }
}

impl From<String> for TaskType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "quest" => Self::Quest,
            "streak" => Self::Streak,
            "dungeon" => Self::Dungeon,
            _ => Self::Unknown,
        }
    }
}

impl From<TaskType> for String {
    fn from(value: TaskType) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskCompletionEvent {
    pub task_type: TaskType,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    pub completion_time: DateTime<Utc>,
}

impl TaskCompletionEvent {
    pub fn quest_task(quest_id: &str, task_id: &str, at: DateTime<Utc>) -> Self {
        Self {
            task_type: TaskType::Quest,
            id: quest_id.to_string(),
            task_id: Some(task_id.to_string()),
            completion_time: at,
        }
    }

    pub fn streak(streak_id: &str, at: DateTime<Utc>) -> Self {
        Self {
            task_type: TaskType::Streak,
            id: streak_id.to_string(),
            task_id: None,
            completion_time: at,
        }
    }

    pub fn dungeon(run_id: &str, at: DateTime<Utc>) -> Self {
        Self {
            task_type: TaskType::Dungeon,
            id: run_id.to_string(),
            task_id: None,
            completion_time: at,
        }
    }
}
