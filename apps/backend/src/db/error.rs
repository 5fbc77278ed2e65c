//! Database error types.

use srs_core::{SessionId, StudyError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("session {session_id} is stale (expected version {expected})")]
    StaleSession { session_id: SessionId, expected: u64 },
}

impl From<DbError> for StudyError {
    fn from(error: DbError) -> Self {
        match error {
            DbError::StaleSession {
                session_id,
                expected,
            } => StudyError::Conflict {
                session_id,
                expected,
            },
            other => StudyError::Storage(other.to_string()),
        }
    }
}
