//! Scheduling that records the answer without touching the review schedule.

use chrono::{DateTime, Utc};

use super::{record_study, SchedulingResult, SpacedRepetitionAlgorithm};
use crate::types::{CardScheduleState, Quality};

/// Used by Test and Cram sessions.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordOnly;

impl SpacedRepetitionAlgorithm for RecordOnly {
    fn name(&self) -> &'static str {
        "record_only"
    }

    fn schedule(
        &self,
        state: &CardScheduleState,
        quality: Quality,
        now: DateTime<Utc>,
    ) -> SchedulingResult {
        let new_state = record_study(state, quality, now);
        let next_due = new_state.next_review_at;
        SchedulingResult { new_state, next_due }
    }
}
