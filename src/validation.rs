//! Boundary validation for everything that reaches the engine from outside:
//! usernames, entity names, XP amounts, durations and completion events.
//!
//! The core transition functions trust their inputs; these checks run in the
//! service layer before a snapshot is loaded.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::game::errors::GameError;
use crate::game::types::{TaskCompletionEvent, TaskType};

pub const MAX_NAME_LEN: usize = 80;
pub const MAX_DESCRIPTION_LEN: usize = 500;
pub const MAX_QUEST_TASKS: usize = 20;
/// One day; longer focus sessions are almost certainly a typo.
pub const MAX_DUNGEON_MINUTES: i64 = 24 * 60;

/// Username validation errors with helpful messages
#[derive(Debug, thiserror::Error)]
pub enum UsernameError {
    #[error("Username is too short (minimum {min} characters)")]
    TooShort { min: usize },

    #[error("Username is too long (maximum {max} characters)")]
    TooLong { max: usize },

    #[error("Username cannot start or end with whitespace")]
    InvalidWhitespace,

    #[error("Username contains invalid characters: {chars}")]
    InvalidCharacters { chars: String },

    #[error("Username is a reserved system name")]
    Reserved,
}

/// Errors for free-text fields (quest names, descriptions, task text).
#[derive(Debug, thiserror::Error)]
pub enum FieldError {
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    #[error("{field} is too long (maximum {max} characters)")]
    TooLong { field: &'static str, max: usize },

    #[error("{field} contains control characters")]
    ControlCharacters { field: &'static str },
}

impl From<UsernameError> for GameError {
    fn from(err: UsernameError) -> Self {
        GameError::InvalidInput(err.to_string())
    }
}

impl From<FieldError> for GameError {
    fn from(err: FieldError) -> Self {
        GameError::InvalidInput(err.to_string())
    }
}

/// Username validation rules configuration
#[derive(Debug, Clone)]
pub struct UsernameRules {
    pub min_length: usize,
    pub max_length: usize,
    pub allow_spaces: bool,
    pub allow_unicode: bool,
}

impl Default for UsernameRules {
    fn default() -> Self {
        UsernameRules {
            min_length: 2,
            max_length: 30,
            allow_spaces: true,
            allow_unicode: true,
        }
    }
}

fn reserved_names() -> HashSet<&'static str> {
    [
        "admin", "administrator", "root", "system", "operator", "guest", "anonymous",
        "null", "undefined", "sololevel",
    ]
    .iter()
    .copied()
    .collect()
}

/// Validate a username according to the given rules
pub fn validate_username_with(username: &str, rules: &UsernameRules) -> Result<String, UsernameError> {
    let trimmed = username.trim();
    let length = trimmed.chars().count();

    if length < rules.min_length {
        return Err(UsernameError::TooShort { min: rules.min_length });
    }
    if length > rules.max_length {
        return Err(UsernameError::TooLong { max: rules.max_length });
    }
    if trimmed != username {
        return Err(UsernameError::InvalidWhitespace);
    }
    if reserved_names().contains(trimmed.to_lowercase().as_str()) {
        return Err(UsernameError::Reserved);
    }

    let invalid: HashSet<char> = trimmed
        .chars()
        .filter(|&ch| {
            let valid = if ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' || ch == '.' {
                true
            } else if ch == ' ' {
                rules.allow_spaces
            } else if !ch.is_ascii() && !ch.is_control() {
                rules.allow_unicode
            } else {
                false
            };
            !valid
        })
        .collect();
    if !invalid.is_empty() {
        let mut chars: Vec<char> = invalid.into_iter().collect();
        chars.sort_unstable();
        return Err(UsernameError::InvalidCharacters {
            chars: chars.into_iter().collect(),
        });
    }

    Ok(trimmed.to_string())
}

pub fn validate_username(username: &str) -> Result<String, UsernameError> {
    validate_username_with(username, &UsernameRules::default())
}

/// Required single-line text: trimmed, non-empty, no control characters.
pub fn validate_name(field: &'static str, value: &str) -> Result<String, FieldError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(FieldError::Empty { field });
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(FieldError::TooLong {
            field,
            max: MAX_NAME_LEN,
        });
    }
    if trimmed.chars().any(char::is_control) {
        return Err(FieldError::ControlCharacters { field });
    }
    Ok(trimmed.to_string())
}

/// Optional multi-line text. Newlines and tabs are kept.
pub fn validate_description(value: &str) -> Result<String, FieldError> {
    let field = "description";
    let trimmed = value.trim();
    if trimmed.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(FieldError::TooLong {
            field,
            max: MAX_DESCRIPTION_LEN,
        });
    }
    if trimmed
        .chars()
        .any(|c| c.is_control() && c != '\n' && c != '\t')
    {
        return Err(FieldError::ControlCharacters { field });
    }
    Ok(trimmed.to_string())
}

pub fn validate_task_descriptions(tasks: &[String]) -> Result<Vec<String>, GameError> {
    if tasks.is_empty() {
        return Err(GameError::InvalidInput(
            "a quest needs at least one task".to_string(),
        ));
    }
    if tasks.len() > MAX_QUEST_TASKS {
        return Err(GameError::InvalidInput(format!(
            "a quest can have at most {} tasks",
            MAX_QUEST_TASKS
        )));
    }
    tasks
        .iter()
        .map(|task| validate_name("task", task).map_err(GameError::from))
        .collect()
}

/// Reject negative or out-of-range XP before it reaches the engine.
pub fn validate_xp(xp: i64) -> Result<u32, GameError> {
    if xp < 0 {
        return Err(GameError::InvalidInput(format!(
            "xp must not be negative (got {})",
            xp
        )));
    }
    u32::try_from(xp)
        .map_err(|_| GameError::InvalidInput(format!("xp {} is out of range", xp)))
}

pub fn validate_duration(minutes: i64) -> Result<u32, GameError> {
    if !(1..=MAX_DUNGEON_MINUTES).contains(&minutes) {
        return Err(GameError::InvalidInput(format!(
            "duration must be between 1 and {} minutes (got {})",
            MAX_DUNGEON_MINUTES, minutes
        )));
    }
    Ok(minutes as u32)
}

/// Parse an ISO-8601 / RFC 3339 timestamp into UTC.
pub fn parse_completion_time(raw: &str) -> Result<DateTime<Utc>, GameError> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|err| GameError::InvalidInput(format!("invalid timestamp '{}': {}", raw, err)))
}

/// Shape checks for a completion event. Unknown task types pass; the engine
/// treats them as no-ops.
pub fn validate_event(event: &TaskCompletionEvent) -> Result<(), GameError> {
    if event.id.trim().is_empty() {
        return Err(GameError::InvalidInput("event id cannot be empty".to_string()));
    }
    if event.task_type == TaskType::Quest
        && event
            .task_id
            .as_deref()
            .map_or(true, |task_id| task_id.trim().is_empty())
    {
        return Err(GameError::InvalidInput(
            "quest completion requires a task id".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_validation() {
        assert!(validate_username("jinwoo").is_ok());
        assert!(validate_username("Sung Jin-Woo").is_ok());
        assert!(validate_username("성진우").is_ok());

        assert!(matches!(validate_username("a"), Err(UsernameError::TooShort { .. })));
        assert!(matches!(validate_username(" hunter"), Err(UsernameError::InvalidWhitespace)));
        assert!(matches!(validate_username("ADMIN"), Err(UsernameError::Reserved)));
        assert!(matches!(
            validate_username("hunter/../x"),
            Err(UsernameError::InvalidCharacters { .. })
        ));
        assert!(validate_username(&"x".repeat(31)).is_err());
    }

    #[test]
    fn test_strict_rules() {
        let rules = UsernameRules {
            allow_spaces: false,
            allow_unicode: false,
            ..UsernameRules::default()
        };
        assert!(validate_username_with("shadow_monarch", &rules).is_ok());
        assert!(validate_username_with("shadow monarch", &rules).is_err());
        assert!(validate_username_with("진우", &rules).is_err());
    }

    #[test]
    fn test_name_and_description() {
        assert_eq!(validate_name("name", "  Morning run ").unwrap(), "Morning run");
        assert!(matches!(validate_name("name", "   "), Err(FieldError::Empty { .. })));
        assert!(matches!(
            validate_name("name", "bad\nname"),
            Err(FieldError::ControlCharacters { .. })
        ));
        assert!(validate_description("").is_ok());
        assert!(validate_description("line one\nline two").is_ok());
        assert!(validate_description("bell\u{7}").is_err());
    }

    #[test]
    fn test_xp_and_duration_bounds() {
        assert_eq!(validate_xp(0).unwrap(), 0);
        assert_eq!(validate_xp(250).unwrap(), 250);
        assert!(matches!(validate_xp(-1), Err(GameError::InvalidInput(_))));
        assert!(validate_xp(i64::from(u32::MAX) + 1).is_err());

        assert_eq!(validate_duration(45).unwrap(), 45);
        assert!(validate_duration(0).is_err());
        assert!(validate_duration(MAX_DUNGEON_MINUTES + 1).is_err());
    }

    #[test]
    fn test_task_descriptions() {
        assert!(validate_task_descriptions(&[]).is_err());
        let tasks = vec!["a".to_string(), " b ".to_string()];
        assert_eq!(validate_task_descriptions(&tasks).unwrap(), vec!["a", "b"]);
        let too_many = vec!["t".to_string(); MAX_QUEST_TASKS + 1];
        assert!(validate_task_descriptions(&too_many).is_err());
    }

    #[test]
    fn test_completion_time_parsing() {
        let parsed = parse_completion_time("2024-03-01T23:30:00-05:00").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2024-03-02T04:30:00+00:00");
        assert!(parse_completion_time("yesterday").is_err());
    }

    #[test]
    fn test_event_shape() {
        let at = Utc::now();
        assert!(validate_event(&TaskCompletionEvent::quest_task("quest-1", "t1", at)).is_ok());
        assert!(validate_event(&TaskCompletionEvent::streak("streak-1", at)).is_ok());

        let mut missing_task = TaskCompletionEvent::quest_task("quest-1", "t1", at);
        missing_task.task_id = None;
        assert!(validate_event(&missing_task).is_err());
        missing_task.task_id = Some("  ".to_string());
        assert!(validate_event(&missing_task).is_err());

        assert!(validate_event(&TaskCompletionEvent::dungeon("", at)).is_err());
    }
}
