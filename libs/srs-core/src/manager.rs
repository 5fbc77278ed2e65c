//! Session lifecycle: start, answer, break, resume, complete, abandon.
//!
//! Every operation loads the session, checks ownership and status, mutates
//! a local copy and writes it back with a bumped version. A failed write
//! leaves the stored session exactly as it was.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::algorithm::{Sm2, SpacedRepetitionAlgorithm};
use crate::answer::{AnswerOutcome, AnswerProcessor};
use crate::error::{Result, StudyError};
use crate::policy::{ModePolicy, ModeState};
use crate::selector::{select_due, ReviewStats};
use crate::session::{SessionTargets, StudySession};
use crate::settings::{EffectiveStudySettings, SessionOptions, StudySettings};
use crate::store::StudyStore;
use crate::summary::{AccuracyMilestone, CompletionType, SessionSummary, StreakMilestone};
use crate::types::{
    Answer, CardId, CardScheduleState, DeckId, Quality, SessionId, SessionStatus, StudyMode,
    UserId,
};

/// Attempts an abandon makes before giving up on a racing writer.
const ABANDON_ATTEMPTS: usize = 3;

/// Parameters of a new session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartRequest {
    pub deck_id: DeckId,
    pub mode: StudyMode,
    #[serde(default)]
    pub targets: SessionTargets,
    #[serde(default)]
    pub options: SessionOptions,
}

/// Session progress right after an answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub session_id: SessionId,
    pub status: SessionStatus,
    pub card_id: CardId,
    pub quality: Quality,
    pub correct: bool,
    pub card_state: CardScheduleState,
    pub next_card: Option<CardId>,
    pub cards_studied: u32,
    pub correct_answers: u32,
    pub incorrect_answers: u32,
    pub current_streak: u32,
    pub best_streak: u32,
    pub accuracy_rate: f64,
    pub completion_percentage: f64,
    pub cards_remaining: usize,
    pub break_reminder: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub streak_milestone: Option<StreakMilestone>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy_milestone: Option<AccuracyMilestone>,
    /// Present when this answer completed the session.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<SessionSummary>,
}

impl ProgressSnapshot {
    fn new(session: &StudySession, outcome: AnswerOutcome, break_reminder: bool) -> Self {
        let counters = &session.counters;
        Self {
            session_id: session.id,
            status: session.status,
            card_id: outcome.card_id,
            quality: outcome.quality,
            correct: outcome.correct,
            card_state: outcome.card_state,
            next_card: outcome.next_card,
            cards_studied: counters.cards_studied,
            correct_answers: counters.correct,
            incorrect_answers: counters.incorrect,
            current_streak: counters.streak,
            best_streak: counters.best_streak,
            accuracy_rate: counters.accuracy_rate(),
            completion_percentage: session.queue.completion_percentage(),
            cards_remaining: session.queue.remaining(),
            break_reminder,
            streak_milestone: outcome.streak_milestone,
            accuracy_milestone: outcome.accuracy_milestone,
            summary: session.summary.clone(),
        }
    }
}

/// Due cards of a deck with the figures behind them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DueCards {
    pub card_ids: Vec<CardId>,
    pub stats: ReviewStats,
}

pub struct StudySessionManager<S> {
    store: S,
    settings: StudySettings,
    sm2: Sm2,
}

impl<S: StudyStore> StudySessionManager<S> {
    pub fn new(store: S) -> Self {
        Self::with_settings(store, StudySettings::default())
    }

    pub fn with_settings(store: S, settings: StudySettings) -> Self {
        let sm2 = Sm2 {
            failure_ease: settings.failure_ease,
            ..Sm2::default()
        };
        Self {
            store,
            settings,
            sm2,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn settings(&self) -> &StudySettings {
        &self.settings
    }

    /// Build the queue for a mode and persist a new Active session.
    pub fn start(
        &self,
        user_id: UserId,
        request: &StartRequest,
        now: DateTime<Utc>,
    ) -> Result<StudySession> {
        self.ensure_access(user_id, request.deck_id)?;

        let deck_cards = self.store.cards_for_deck(request.deck_id)?;
        let progress = self.store.load_states(user_id, &deck_cards)?;
        let effective = EffectiveStudySettings::merge(&self.settings, Some(&request.options));
        let seed = effective.shuffle_seed.unwrap_or_else(rand::random);

        let mut policy = ModeState::new(request.mode, &effective, seed);
        let queue = policy.initial_queue(&deck_cards, &progress, &request.targets, now);
        if queue.is_empty() {
            return Err(StudyError::EmptyDeck {
                deck_id: request.deck_id,
                mode: request.mode,
            });
        }

        let mut session = StudySession::new(
            Uuid::new_v4(),
            user_id,
            request.deck_id,
            policy,
            queue,
            request.targets,
            &effective,
            now,
        );
        session.version = 1;
        self.store.save_session(&session)?;

        info!(
            session_id = %session.id,
            %user_id,
            deck_id = request.deck_id,
            mode = %request.mode,
            cards = session.queue.len(),
            "study session started"
        );
        Ok(session)
    }

    /// Apply an answer for the current card.
    ///
    /// The card state and the session are committed together. If the
    /// commit fails nothing is advanced.
    pub fn answer(
        &self,
        user_id: UserId,
        session_id: SessionId,
        answer: &Answer,
    ) -> Result<ProgressSnapshot> {
        Quality::new(answer.quality)?;

        let mut session = self.load_owned(user_id, session_id)?;
        if session.status != SessionStatus::Active {
            return Err(StudyError::SessionClosed(session.status));
        }

        let now = answer.submitted_at;
        if session.policy.time_expired(&session.view(now)) {
            self.finalize(&mut session, CompletionType::TimeLimit, None, now)?;
            self.save(&mut session)?;
            info!(%session_id, "study session ran out of time");
            return Err(StudyError::SessionClosed(SessionStatus::Completed));
        }

        let expected = session.queue.current();
        if expected != Some(answer.card_id) {
            return Err(StudyError::CardMismatch {
                expected,
                got: answer.card_id,
            });
        }

        let state = self
            .store
            .load_state(user_id, answer.card_id)?
            .unwrap_or_else(|| self.sm2.initial_state());
        let outcome = AnswerProcessor::new(&self.sm2).process(&mut session, &state, answer)?;
        let break_reminder = session.break_reminder_due(now);

        if session.policy.is_complete(&session.view(now)) {
            self.finalize(
                &mut session,
                CompletionType::Automatic,
                Some((answer.card_id, &outcome.card_state)),
                now,
            )?;
        }

        session.version += 1;
        self.store
            .commit_answer(user_id, answer.card_id, &outcome.card_state, &session)?;

        if session.status == SessionStatus::Completed {
            info!(%session_id, cards = session.counters.cards_studied, "study session completed");
        }
        Ok(ProgressSnapshot::new(&session, outcome, break_reminder))
    }

    pub fn take_break(
        &self,
        user_id: UserId,
        session_id: SessionId,
        now: DateTime<Utc>,
    ) -> Result<StudySession> {
        let mut session = self.load_owned(user_id, session_id)?;
        match session.status {
            SessionStatus::Active => {}
            SessionStatus::OnBreak => return Err(StudyError::AlreadyOnBreak),
            status => return Err(StudyError::SessionClosed(status)),
        }

        session.status = SessionStatus::OnBreak;
        session.break_started_at = Some(now);
        session.counters.break_count += 1;
        session.last_activity_at = now;
        self.save(&mut session)?;

        debug!(%session_id, "break started");
        Ok(session)
    }

    pub fn resume(
        &self,
        user_id: UserId,
        session_id: SessionId,
        now: DateTime<Utc>,
    ) -> Result<StudySession> {
        let mut session = self.load_owned(user_id, session_id)?;
        match session.status {
            SessionStatus::OnBreak => {}
            SessionStatus::Active => return Err(StudyError::NotOnBreak),
            status => return Err(StudyError::SessionClosed(status)),
        }

        session.end_break(now);
        session.status = SessionStatus::Active;
        session.last_activity_at = now;
        session.next_break_reminder = session
            .break_reminders_enabled
            .then(|| now + Duration::minutes(i64::from(session.break_interval_minutes)));
        self.save(&mut session)?;

        debug!(%session_id, break_seconds = session.counters.break_seconds, "break ended");
        Ok(session)
    }

    /// Finish a session and return its summary.
    ///
    /// A session that already completed returns the summary it stored.
    pub fn complete(
        &self,
        user_id: UserId,
        session_id: SessionId,
        now: DateTime<Utc>,
    ) -> Result<SessionSummary> {
        let mut session = self.load_owned(user_id, session_id)?;
        match session.status {
            SessionStatus::Active | SessionStatus::OnBreak => {}
            SessionStatus::Completed => {
                if let Some(summary) = session.summary {
                    return Ok(summary);
                }
                return Err(StudyError::SessionClosed(SessionStatus::Completed));
            }
            SessionStatus::Abandoned => {
                return Err(StudyError::SessionClosed(SessionStatus::Abandoned))
            }
        }

        session.end_break(now);
        let completion_type = if session.policy.time_expired(&session.view(now)) {
            CompletionType::TimeLimit
        } else {
            CompletionType::Manual
        };
        let summary = self.finalize(&mut session, completion_type, None, now)?;
        self.save(&mut session)?;

        info!(
            %session_id,
            cards = summary.cards_studied,
            accuracy = summary.accuracy_rate,
            "study session completed"
        );
        Ok(summary)
    }

    /// Stop a session for good, keeping its partial progress.
    ///
    /// Retries when an answer commits in between, so the session always
    /// ends up abandoned.
    pub fn abandon(
        &self,
        user_id: UserId,
        session_id: SessionId,
        now: DateTime<Utc>,
    ) -> Result<StudySession> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let mut session = self.load_owned(user_id, session_id)?;
            session.ensure_open()?;

            session.end_break(now);
            session.status = SessionStatus::Abandoned;
            session.abandoned_at = Some(now);
            session.next_break_reminder = None;
            session.last_activity_at = now;

            match self.save(&mut session) {
                Ok(()) => {
                    info!(%session_id, cards = session.counters.cards_studied, "study session abandoned");
                    return Ok(session);
                }
                Err(StudyError::Conflict { .. }) if attempt < ABANDON_ATTEMPTS => {
                    warn!(%session_id, attempt, "abandon raced another write, retrying");
                }
                Err(e) => return Err(e),
            }
        }
    }

    pub fn get(&self, user_id: UserId, session_id: SessionId) -> Result<StudySession> {
        self.load_owned(user_id, session_id)
    }

    /// Sessions of a user that are Active or on a break.
    pub fn active_sessions(&self, user_id: UserId) -> Result<Vec<StudySession>> {
        Ok(self
            .store
            .sessions_for_user(user_id)?
            .into_iter()
            .filter(|s| !s.status.is_terminal())
            .collect())
    }

    pub fn due_cards(
        &self,
        user_id: UserId,
        deck_id: DeckId,
        limit: usize,
        now: DateTime<Utc>,
    ) -> Result<DueCards> {
        self.ensure_access(user_id, deck_id)?;
        let deck_cards = self.store.cards_for_deck(deck_id)?;
        let progress = self.store.load_states(user_id, &deck_cards)?;
        Ok(DueCards {
            card_ids: select_due(&progress, now, limit),
            stats: ReviewStats::collect(&progress, now),
        })
    }

    fn ensure_access(&self, user_id: UserId, deck_id: DeckId) -> Result<()> {
        if self.store.can_access_deck(user_id, deck_id)? {
            Ok(())
        } else {
            Err(StudyError::AccessDenied { user_id, deck_id })
        }
    }

    fn load_owned(&self, user_id: UserId, session_id: SessionId) -> Result<StudySession> {
        let session = self
            .store
            .load_session(session_id)?
            .ok_or(StudyError::SessionNotFound(session_id))?;
        session.ensure_owner(user_id)?;
        Ok(session)
    }

    fn save(&self, session: &mut StudySession) -> Result<()> {
        session.version += 1;
        self.store.save_session(session)
    }

    /// Mark the session completed and attach its summary. `answered` is a
    /// card state not yet persisted that should count towards due figures.
    fn finalize(
        &self,
        session: &mut StudySession,
        completion_type: CompletionType,
        answered: Option<(CardId, &CardScheduleState)>,
        now: DateTime<Utc>,
    ) -> Result<SessionSummary> {
        let due_tomorrow = self.cards_due_by(session, answered, now + Duration::days(1))?;

        session.end_break(now);
        session.status = SessionStatus::Completed;
        session.completed_at = Some(now);
        session.next_break_reminder = None;

        let summary = SessionSummary::build(session, completion_type, due_tomorrow, now);
        session.summary = Some(summary.clone());
        Ok(summary)
    }

    fn cards_due_by(
        &self,
        session: &StudySession,
        answered: Option<(CardId, &CardScheduleState)>,
        by: DateTime<Utc>,
    ) -> Result<usize> {
        let deck_cards = self.store.cards_for_deck(session.deck_id)?;
        let progress = self.store.load_states(session.user_id, &deck_cards)?;
        Ok(progress
            .iter()
            .map(|p| match answered {
                Some((card_id, state)) if card_id == p.card_id => state,
                _ => &p.state,
            })
            .chain(
                answered
                    .filter(|(card_id, _)| !progress.iter().any(|p| p.card_id == *card_id))
                    .map(|(_, state)| state),
            )
            .filter(|state| state.is_due(by))
            .count())
    }
}
