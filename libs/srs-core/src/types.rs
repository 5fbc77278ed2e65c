//! Core types for the scheduling engine and study sessions.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, StudyError};

pub type CardId = i64;
pub type DeckId = i64;
pub type UserId = Uuid;
pub type SessionId = Uuid;

/// Initial ease factor for a card that has never been studied.
pub const INITIAL_EASE_FACTOR: f64 = 2.5;

/// Ease factor floor.
pub const MINIMUM_EASE_FACTOR: f64 = 1.3;

/// Self-assessed recall score on the SM-2 scale.
///
/// 0: complete blackout
/// 1: incorrect, correct one remembered
/// 2: incorrect, correct one seemed easy to recall
/// 3: correct with serious difficulty
/// 4: correct after hesitation
/// 5: perfect response
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Quality(u8);

impl Quality {
    pub const MAX: u8 = 5;

    /// Validate a raw rating.
    pub fn new(value: i64) -> Result<Self> {
        if (0..=Self::MAX as i64).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(StudyError::InvalidQuality(value))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// A recall counts as successful from quality 3 upwards.
    pub fn is_correct(self) -> bool {
        self.0 >= 3
    }
}

impl TryFrom<i64> for Quality {
    type Error = StudyError;

    fn try_from(value: i64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Quality> for u8 {
    fn from(quality: Quality) -> Self {
        quality.0
    }
}

/// Scheduling state for one (user, card) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardScheduleState {
    pub ease_factor: f64,
    pub interval_days: u32,
    pub repetitions: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_review_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub quality_history: Vec<u8>,
    pub times_studied: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_studied_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_studied_at: Option<DateTime<Utc>>,
}

impl Default for CardScheduleState {
    fn default() -> Self {
        Self {
            ease_factor: INITIAL_EASE_FACTOR,
            interval_days: 0,
            repetitions: 0,
            next_review_at: None,
            quality_history: Vec::new(),
            times_studied: 0,
            last_studied_at: None,
            first_studied_at: None,
        }
    }
}

impl CardScheduleState {
    /// True once the card has a review date.
    pub fn is_scheduled(&self) -> bool {
        self.next_review_at.is_some()
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_review_at.is_some_and(|due| due <= now)
    }

    /// Whole days past the review date, 0 when not yet due or never scheduled.
    pub fn days_overdue(&self, now: DateTime<Utc>) -> i64 {
        match self.next_review_at {
            Some(due) if due <= now => (now - due).num_days(),
            _ => 0,
        }
    }

    /// Failed answers among the most recent `window` ratings.
    pub fn recent_failures(&self, window: usize) -> usize {
        self.quality_history
            .iter()
            .rev()
            .take(window)
            .filter(|&&q| q < 3)
            .count()
    }
}

/// A schedule state together with the card it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardProgress {
    pub card_id: CardId,
    pub state: CardScheduleState,
}

/// Study mode, chosen when a session starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StudyMode {
    Review,
    Practice,
    Learn,
    Test,
    Cram,
}

impl StudyMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Review => "review",
            Self::Practice => "practice",
            Self::Learn => "learn",
            Self::Test => "test",
            Self::Cram => "cram",
        }
    }
}

impl fmt::Display for StudyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Session lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    OnBreak,
    Completed,
    Abandoned,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::OnBreak => "on_break",
            Self::Completed => "completed",
            Self::Abandoned => "abandoned",
        }
    }

    /// Completed and Abandoned never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Abandoned)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A submitted answer. Consumed once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub card_id: CardId,
    pub quality: i64,
    pub response_time_ms: u64,
    pub submitted_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn quality_accepts_zero_through_five() {
        for value in 0..=5 {
            assert_eq!(Quality::new(value).unwrap().value() as i64, value);
        }
    }

    #[test]
    fn quality_rejects_out_of_range() {
        assert!(matches!(Quality::new(6), Err(StudyError::InvalidQuality(6))));
        assert!(matches!(Quality::new(-1), Err(StudyError::InvalidQuality(-1))));
    }

    #[test]
    fn quality_deserialize_validates() {
        let ok: Quality = serde_json::from_str("4").unwrap();
        assert_eq!(ok.value(), 4);
        assert!(serde_json::from_str::<Quality>("9").is_err());
    }

    #[test]
    fn never_studied_card_is_not_due() {
        let state = CardScheduleState::default();
        assert!(!state.is_due(now()));
        assert_eq!(state.days_overdue(now()), 0);
    }

    #[test]
    fn days_overdue_counts_whole_days() {
        let state = CardScheduleState {
            next_review_at: Some(now() - Duration::hours(50)),
            ..Default::default()
        };
        assert!(state.is_due(now()));
        assert_eq!(state.days_overdue(now()), 2);
    }

    #[test]
    fn recent_failures_looks_at_tail_only() {
        let state = CardScheduleState {
            quality_history: vec![0, 1, 5, 2, 4],
            ..Default::default()
        };
        assert_eq!(state.recent_failures(2), 1);
        assert_eq!(state.recent_failures(10), 3);
    }
}
