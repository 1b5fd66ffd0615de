use thiserror::Error;

/// Errors raised around the progression engine: storage, boundary validation
/// and concurrency. The transition functions themselves never fail.
#[derive(Debug, Error)]
pub enum GameError {
    /// Wrapper around sled's error type.
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    /// Wrapper around JSON serialization and deserialization errors.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Wrapper around IO errors (directory creation, backups, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Returned when no game state exists for the requested user.
    #[error("record not found: {0}")]
    NotFound(String),

    /// Returned when a game state already exists where a new one was expected.
    #[error("record already exists: {0}")]
    AlreadyExists(String),

    /// Request data that fails boundary validation (negative XP, missing task id, ...).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Optimistic concurrency gave up after repeated conflicting writers.
    #[error("concurrent update conflict for user {user} after {attempts} attempts")]
    Conflict { user: u64, attempts: u32 },

    /// Returned when deserializing a record with an unexpected schema version.
    #[error("schema mismatch for {entity}: expected {expected}, got {found}")]
    SchemaMismatch {
        entity: &'static str,
        expected: u8,
        found: u8,
    },
}
