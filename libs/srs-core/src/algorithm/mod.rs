//! Card scheduling: the SM-2 transition and the record-only variant used by
//! modes that must not move long-term review dates.

pub mod record_only;
pub mod sm2;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{CardScheduleState, Quality};

pub use record_only::RecordOnly;
pub use sm2::{FailureEase, Sm2};

/// Result of scheduling a card after an answer.
#[derive(Debug, Clone)]
pub struct SchedulingResult {
    pub new_state: CardScheduleState,
    pub next_due: Option<DateTime<Utc>>,
}

/// Trait for scheduling algorithms. Implementations are pure.
pub trait SpacedRepetitionAlgorithm: Send + Sync {
    /// Algorithm identifier.
    fn name(&self) -> &'static str;

    /// Calculate the next state after an answer of the given quality.
    fn schedule(&self, state: &CardScheduleState, quality: Quality, now: DateTime<Utc>)
        -> SchedulingResult;

    /// Initial state for a card that has never been answered.
    fn initial_state(&self) -> CardScheduleState {
        CardScheduleState::default()
    }

    /// Validate a raw rating, then schedule.
    fn transition(
        &self,
        state: &CardScheduleState,
        quality: i64,
        now: DateTime<Utc>,
    ) -> Result<CardScheduleState> {
        let quality = Quality::new(quality)?;
        Ok(self.schedule(state, quality, now).new_state)
    }
}

/// How an answer affects the long-term schedule of its card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulingEffect {
    /// Full SM-2 transition.
    Full,
    /// History and counters only; due date, interval and ease untouched.
    RecordOnly,
}

/// Bookkeeping shared by every algorithm: history, counters, timestamps.
pub(crate) fn record_study(
    state: &CardScheduleState,
    quality: Quality,
    now: DateTime<Utc>,
) -> CardScheduleState {
    let mut next = state.clone();
    next.quality_history.push(quality.value());
    next.times_studied = state.times_studied.saturating_add(1);
    next.last_studied_at = Some(now);
    if next.first_studied_at.is_none() {
        next.first_studied_at = Some(now);
    }
    next
}
