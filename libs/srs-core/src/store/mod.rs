//! Collaborator interfaces the session manager depends on.
//!
//! Implementations live outside the core: [`MemoryStore`] for tests and
//! embedding, and the SQLite repository in the backend.

pub mod memory;

use crate::error::{Result, StudyError};
use crate::session::StudySession;
use crate::types::{CardId, CardProgress, CardScheduleState, DeckId, SessionId, UserId};

pub use memory::MemoryStore;

/// Card metadata lookup.
pub trait CardCatalog {
    /// Card ids of a deck in deck order.
    fn cards_for_deck(&self, deck_id: DeckId) -> Result<Vec<CardId>>;
}

/// Deck access checks.
pub trait AccessControl {
    fn can_access_deck(&self, user_id: UserId, deck_id: DeckId) -> Result<bool>;
}

/// Per-user card schedule states.
pub trait ProgressStore {
    fn load_state(&self, user_id: UserId, card_id: CardId) -> Result<Option<CardScheduleState>>;

    /// States for the given cards. Cards never answered are left out.
    fn load_states(&self, user_id: UserId, card_ids: &[CardId]) -> Result<Vec<CardProgress>> {
        let mut progress = Vec::new();
        for &card_id in card_ids {
            if let Some(state) = self.load_state(user_id, card_id)? {
                progress.push(CardProgress { card_id, state });
            }
        }
        Ok(progress)
    }

    fn save_state(&self, user_id: UserId, card_id: CardId, state: &CardScheduleState) -> Result<()>;
}

/// Session persistence.
pub trait SessionStore {
    fn load_session(&self, session_id: SessionId) -> Result<Option<StudySession>>;

    /// Compare-and-set on `session.version`: accepted only when the stored
    /// version is exactly one less, or when a new session arrives at version 1.
    fn save_session(&self, session: &StudySession) -> Result<()>;

    fn sessions_for_user(&self, user_id: UserId) -> Result<Vec<StudySession>>;
}

/// Everything the session manager needs from storage.
pub trait StudyStore: CardCatalog + AccessControl + ProgressStore + SessionStore {
    /// Persist an answer's card state together with the session.
    ///
    /// Either both writes land or neither does. The default writes the
    /// session first so a version conflict leaves the card state alone;
    /// implementations with transactions should override it.
    fn commit_answer(
        &self,
        user_id: UserId,
        card_id: CardId,
        state: &CardScheduleState,
        session: &StudySession,
    ) -> Result<()> {
        self.save_session(session)?;
        self.save_state(user_id, card_id, state)
    }
}

/// Version check shared by session stores.
pub fn check_version(stored: Option<u64>, session: &StudySession) -> Result<()> {
    let expected = match stored {
        Some(version) => version + 1,
        None => 1,
    };
    if session.version == expected {
        Ok(())
    } else {
        Err(StudyError::Conflict {
            session_id: session.id,
            expected,
        })
    }
}
