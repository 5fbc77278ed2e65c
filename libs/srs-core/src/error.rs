//! Error types for srs-core.

use thiserror::Error;

use crate::types::{CardId, DeckId, SessionId, SessionStatus, StudyMode, UserId};

/// Result type alias using StudyError.
pub type Result<T> = std::result::Result<T, StudyError>;

/// Errors raised by the scheduler, the session state machine and the
/// collaborators behind them.
#[derive(Debug, Error)]
pub enum StudyError {
    #[error("invalid quality {0}: must be an integer between 0 and 5")]
    InvalidQuality(i64),

    #[error("session is {0}, no further changes accepted")]
    SessionClosed(SessionStatus),

    #[error("answer for card {got} does not match current card {expected:?}")]
    CardMismatch { expected: Option<CardId>, got: CardId },

    #[error("no eligible cards in deck {deck_id} for {mode} mode")]
    EmptyDeck { deck_id: DeckId, mode: StudyMode },

    #[error("user {user_id} cannot access deck {deck_id}")]
    AccessDenied { user_id: UserId, deck_id: DeckId },

    #[error("session {0} not found")]
    SessionNotFound(SessionId),

    #[error("session is already on a break")]
    AlreadyOnBreak,

    #[error("session is not on a break")]
    NotOnBreak,

    #[error("session {session_id} was modified concurrently (expected version {expected})")]
    Conflict { session_id: SessionId, expected: u64 },

    #[error("storage error: {0}")]
    Storage(String),
}
