//! API request and response types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{CardRecord, DeckSummary, NewCard};
use srs_core::{
    CardId, DeckId, SessionCounters, SessionId, SessionStatus, SessionSummary, SessionTargets,
    StudyMode, StudySession,
};

// Re-export the core types that appear on the wire unchanged.
pub use srs_core::{DueCards, ProgressSnapshot, StartRequest};

// === User Types ===

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub token: String,
}

// === Deck Types ===

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDeckRequest {
    pub name: String,
    #[serde(default)]
    pub cards: Vec<NewCard>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeckListResponse {
    pub decks: Vec<DeckSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeckResponse {
    pub id: DeckId,
    pub name: String,
    pub owner_id: Uuid,
    pub cards: Vec<CardRecord>,
}

/// Share a deck with another user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrantAccessRequest {
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DueCardsQuery {
    pub limit: Option<usize>,
}

// === Session Types ===

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitAnswerRequest {
    pub card_id: CardId,
    /// Kept wide so out-of-range ratings reach validation.
    pub quality: i64,
    #[serde(default)]
    pub response_time_ms: u64,
}

/// Client view of a session; internal policy state stays server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub id: SessionId,
    pub deck_id: DeckId,
    pub mode: StudyMode,
    pub status: SessionStatus,
    pub current_card: Option<CardId>,
    pub cards_total: usize,
    pub cards_remaining: usize,
    pub completion_percentage: f64,
    pub counters: SessionCounters,
    pub targets: SessionTargets,
    pub started_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub break_started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_break_reminder: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abandoned_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<SessionSummary>,
}

impl From<&StudySession> for SessionResponse {
    fn from(session: &StudySession) -> Self {
        Self {
            id: session.id,
            deck_id: session.deck_id,
            mode: session.mode,
            status: session.status,
            current_card: session.queue.current(),
            cards_total: session.queue.len(),
            cards_remaining: session.queue.remaining(),
            completion_percentage: session.queue.completion_percentage(),
            counters: session.counters.clone(),
            targets: session.targets,
            started_at: session.started_at,
            last_activity_at: session.last_activity_at,
            break_started_at: session.break_started_at,
            next_break_reminder: session.next_break_reminder,
            completed_at: session.completed_at,
            abandoned_at: session.abandoned_at,
            summary: session.summary.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionListResponse {
    pub sessions: Vec<SessionResponse>,
}
