//! Study session record: queue, counters, targets and lifecycle timestamps.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StudyError};
use crate::policy::{ModePolicy, ModeState};
use crate::settings::EffectiveStudySettings;
use crate::summary::SessionSummary;
use crate::types::{CardId, DeckId, SessionId, SessionStatus, StudyMode, UserId};

/// Ordered cards of a session and the position of the current one.
///
/// The cursor never passes the end of the queue. Cards before the cursor
/// have been answered; insertions only ever land at or after it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CardQueue {
    cards: Vec<CardId>,
    cursor: usize,
}

impl CardQueue {
    pub fn new(cards: Vec<CardId>) -> Self {
        Self { cards, cursor: 0 }
    }

    pub fn cards(&self) -> &[CardId] {
        &self.cards
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Card awaiting an answer, if any.
    pub fn current(&self) -> Option<CardId> {
        self.cards.get(self.cursor).copied()
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.cards.len()
    }

    pub fn remaining(&self) -> usize {
        self.cards.len() - self.cursor
    }

    pub fn upcoming(&self) -> &[CardId] {
        &self.cards[self.cursor..]
    }

    pub fn advance(&mut self) {
        if self.cursor < self.cards.len() {
            self.cursor += 1;
        }
    }

    pub fn push_back(&mut self, card: CardId) {
        self.cards.push(card);
    }

    pub fn extend(&mut self, cards: &[CardId]) {
        self.cards.extend_from_slice(cards);
    }

    /// Insert so that `gap` upcoming cards come first, or at the end if fewer remain.
    pub fn insert_ahead(&mut self, card: CardId, gap: usize) {
        let position = self.cursor.saturating_add(gap).min(self.cards.len());
        self.cards.insert(position, card);
    }

    /// Percentage of the queue already answered.
    pub fn completion_percentage(&self) -> f64 {
        if self.cards.is_empty() {
            0.0
        } else {
            self.cursor as f64 / self.cards.len() as f64 * 100.0
        }
    }
}

/// Running counters of a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionCounters {
    pub correct: u32,
    pub incorrect: u32,
    pub cards_studied: u32,
    pub streak: u32,
    pub best_streak: u32,
    /// Sum of answer response times.
    pub elapsed_seconds: f64,
    pub break_seconds: i64,
    pub break_count: u32,
}

impl SessionCounters {
    pub fn record(&mut self, correct: bool, response_time_ms: u64) {
        self.cards_studied += 1;
        if correct {
            self.correct += 1;
            self.streak += 1;
            self.best_streak = self.best_streak.max(self.streak);
        } else {
            self.incorrect += 1;
            self.streak = 0;
        }
        self.elapsed_seconds += response_time_ms as f64 / 1000.0;
    }

    /// Correct answers as a percentage of all answers.
    pub fn accuracy_rate(&self) -> f64 {
        let total = self.correct + self.incorrect;
        if total == 0 {
            0.0
        } else {
            f64::from(self.correct) / f64::from(total) * 100.0
        }
    }

    pub fn average_response_secs(&self) -> f64 {
        if self.cards_studied == 0 {
            0.0
        } else {
            self.elapsed_seconds / f64::from(self.cards_studied)
        }
    }
}

/// Optional goals set when the session starts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTargets {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_cards: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_minutes: Option<u32>,
}

impl SessionTargets {
    pub fn cards_reached(&self, cards_studied: u32) -> bool {
        self.target_cards.is_some_and(|target| cards_studied >= target)
    }

    pub fn time_reached(&self, active_seconds: i64) -> bool {
        self.target_minutes
            .is_some_and(|minutes| active_seconds >= i64::from(minutes) * 60)
    }
}

/// One processed answer, kept for analytics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub card_id: CardId,
    pub quality: u8,
    pub correct: bool,
    pub response_time_ms: u64,
    pub answered_at: DateTime<Utc>,
}

/// What a mode policy sees when deciding whether the session is done.
#[derive(Debug, Clone, Copy)]
pub struct SessionView<'a> {
    pub queue: &'a CardQueue,
    pub counters: &'a SessionCounters,
    pub targets: &'a SessionTargets,
    pub active_seconds: i64,
}

impl SessionView<'_> {
    /// Either goal met.
    pub fn targets_reached(&self) -> bool {
        self.targets.cards_reached(self.counters.cards_studied)
            || self.targets.time_reached(self.active_seconds)
    }
}

/// One study attempt, owned by the user who started it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudySession {
    pub id: SessionId,
    pub user_id: UserId,
    pub deck_id: DeckId,
    pub mode: StudyMode,
    pub status: SessionStatus,
    pub queue: CardQueue,
    pub counters: SessionCounters,
    pub targets: SessionTargets,
    pub policy: ModeState,
    #[serde(default)]
    pub answers: Vec<AnswerRecord>,
    pub break_reminders_enabled: bool,
    pub break_interval_minutes: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_break_reminder: Option<DateTime<Utc>>,
    pub started_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub break_started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abandoned_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<SessionSummary>,
    /// Bumped on every successful write; the store rejects stale writers.
    pub version: u64,
}

impl StudySession {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: SessionId,
        user_id: UserId,
        deck_id: DeckId,
        policy: ModeState,
        cards: Vec<CardId>,
        targets: SessionTargets,
        settings: &EffectiveStudySettings,
        now: DateTime<Utc>,
    ) -> Self {
        let next_break_reminder = settings
            .break_reminders_enabled
            .then(|| now + Duration::minutes(i64::from(settings.break_interval_minutes)));

        Self {
            id,
            user_id,
            deck_id,
            mode: policy.mode(),
            status: SessionStatus::Active,
            queue: CardQueue::new(cards),
            counters: SessionCounters::default(),
            targets,
            policy,
            answers: Vec::new(),
            break_reminders_enabled: settings.break_reminders_enabled,
            break_interval_minutes: settings.break_interval_minutes,
            next_break_reminder,
            started_at: now,
            last_activity_at: now,
            break_started_at: None,
            completed_at: None,
            abandoned_at: None,
            summary: None,
            version: 0,
        }
    }

    /// Wall-clock time since start, minus breaks (including one in progress).
    pub fn active_seconds(&self, now: DateTime<Utc>) -> i64 {
        let ongoing_break = self
            .break_started_at
            .map(|started| (now - started).num_seconds().max(0))
            .unwrap_or(0);
        ((now - self.started_at).num_seconds() - self.counters.break_seconds - ongoing_break).max(0)
    }

    pub fn view(&self, now: DateTime<Utc>) -> SessionView<'_> {
        SessionView {
            queue: &self.queue,
            counters: &self.counters,
            targets: &self.targets,
            active_seconds: self.active_seconds(now),
        }
    }

    pub fn ensure_owner(&self, user_id: UserId) -> Result<()> {
        if self.user_id == user_id {
            Ok(())
        } else {
            Err(StudyError::AccessDenied {
                user_id,
                deck_id: self.deck_id,
            })
        }
    }

    pub fn ensure_open(&self) -> Result<()> {
        if self.status.is_terminal() {
            Err(StudyError::SessionClosed(self.status))
        } else {
            Ok(())
        }
    }

    pub fn break_reminder_due(&self, now: DateTime<Utc>) -> bool {
        self.break_reminders_enabled && self.next_break_reminder.is_some_and(|at| now >= at)
    }

    /// Fold a break in progress into the counters.
    pub(crate) fn end_break(&mut self, now: DateTime<Utc>) {
        if let Some(started) = self.break_started_at.take() {
            self.counters.break_seconds += (now - started).num_seconds().max(0);
        }
    }
}
