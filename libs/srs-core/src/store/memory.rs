//! In-memory store, guarded by a single lock.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use super::{check_version, AccessControl, CardCatalog, ProgressStore, SessionStore, StudyStore};
use crate::error::{Result, StudyError};
use crate::session::StudySession;
use crate::types::{CardId, CardScheduleState, DeckId, SessionId, UserId};

#[derive(Default)]
struct Inner {
    decks: HashMap<DeckId, Vec<CardId>>,
    access: HashSet<(UserId, DeckId)>,
    states: HashMap<(UserId, CardId), CardScheduleState>,
    sessions: HashMap<SessionId, StudySession>,
}

impl Inner {
    fn put_session(&mut self, session: &StudySession) -> Result<()> {
        check_version(self.sessions.get(&session.id).map(|s| s.version), session)?;
        self.sessions.insert(session.id, session.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| StudyError::Storage("memory store lock poisoned".into()))
    }

    /// Register a deck with its cards in order, replacing any previous list.
    pub fn add_deck(&self, deck_id: DeckId, cards: Vec<CardId>) -> Result<()> {
        self.lock()?.decks.insert(deck_id, cards);
        Ok(())
    }

    pub fn grant_access(&self, user_id: UserId, deck_id: DeckId) -> Result<()> {
        self.lock()?.access.insert((user_id, deck_id));
        Ok(())
    }
}

impl CardCatalog for MemoryStore {
    fn cards_for_deck(&self, deck_id: DeckId) -> Result<Vec<CardId>> {
        Ok(self.lock()?.decks.get(&deck_id).cloned().unwrap_or_default())
    }
}

impl AccessControl for MemoryStore {
    fn can_access_deck(&self, user_id: UserId, deck_id: DeckId) -> Result<bool> {
        Ok(self.lock()?.access.contains(&(user_id, deck_id)))
    }
}

impl ProgressStore for MemoryStore {
    fn load_state(&self, user_id: UserId, card_id: CardId) -> Result<Option<CardScheduleState>> {
        Ok(self.lock()?.states.get(&(user_id, card_id)).cloned())
    }

    fn save_state(&self, user_id: UserId, card_id: CardId, state: &CardScheduleState) -> Result<()> {
        self.lock()?.states.insert((user_id, card_id), state.clone());
        Ok(())
    }
}

impl SessionStore for MemoryStore {
    fn load_session(&self, session_id: SessionId) -> Result<Option<StudySession>> {
        Ok(self.lock()?.sessions.get(&session_id).cloned())
    }

    fn save_session(&self, session: &StudySession) -> Result<()> {
        self.lock()?.put_session(session)
    }

    fn sessions_for_user(&self, user_id: UserId) -> Result<Vec<StudySession>> {
        let mut sessions: Vec<_> = self
            .lock()?
            .sessions
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        sessions.sort_by_key(|s| s.started_at);
        Ok(sessions)
    }
}

impl StudyStore for MemoryStore {
    fn commit_answer(
        &self,
        user_id: UserId,
        card_id: CardId,
        state: &CardScheduleState,
        session: &StudySession,
    ) -> Result<()> {
        let mut inner = self.lock()?;
        inner.put_session(session)?;
        inner.states.insert((user_id, card_id), state.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::ModeState;
    use crate::session::SessionTargets;
    use crate::settings::EffectiveStudySettings;
    use crate::types::StudyMode;
    use chrono::Utc;
    use uuid::Uuid;

    fn session(version: u64) -> StudySession {
        let settings = EffectiveStudySettings::merge(&Default::default(), None);
        let mut session = StudySession::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            1,
            ModeState::new(StudyMode::Review, &settings, 0),
            vec![1],
            SessionTargets::default(),
            &settings,
            Utc::now(),
        );
        session.version = version;
        session
    }

    #[test]
    fn new_session_must_start_at_version_one() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.save_session(&session(2)),
            Err(StudyError::Conflict { expected: 1, .. })
        ));
        store.save_session(&session(1)).unwrap();
    }

    #[test]
    fn stale_write_is_rejected() {
        let store = MemoryStore::new();
        let mut first = session(1);
        store.save_session(&first).unwrap();

        let mut stale = first.clone();
        first.version = 2;
        store.save_session(&first).unwrap();

        stale.version = 2;
        assert!(matches!(
            store.save_session(&stale),
            Err(StudyError::Conflict { expected: 3, .. })
        ));
    }

    #[test]
    fn commit_conflict_leaves_card_state_untouched() {
        let store = MemoryStore::new();
        let stored = session(1);
        store.save_session(&stored).unwrap();

        let state = CardScheduleState {
            times_studied: 1,
            ..Default::default()
        };
        let result = store.commit_answer(stored.user_id, 1, &state, &stored);

        assert!(matches!(result, Err(StudyError::Conflict { .. })));
        assert_eq!(store.load_state(stored.user_id, 1).unwrap(), None);
    }

    #[test]
    fn unknown_deck_has_no_cards() {
        let store = MemoryStore::new();
        assert!(store.cards_for_deck(9).unwrap().is_empty());
        assert!(!store.can_access_deck(Uuid::new_v4(), 9).unwrap());
    }

    #[test]
    fn load_states_skips_unanswered_cards() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        store.save_state(user, 2, &CardScheduleState::default()).unwrap();
        let progress = store.load_states(user, &[1, 2, 3]).unwrap();
        assert_eq!(progress.len(), 1);
        assert_eq!(progress[0].card_id, 2);
    }
}
