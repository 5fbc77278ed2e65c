//! SM-2 spaced repetition algorithm.
//!
//! Based on SuperMemo 2 with configurable parameters. The ease factor is
//! updated on every answer, independently of the repetition reset, and never
//! drops below the configured floor. Intervals have no upper bound; review
//! dates stop at [`latest_review_at`].

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::{record_study, SchedulingResult, SpacedRepetitionAlgorithm};
use crate::types::{CardScheduleState, Quality, INITIAL_EASE_FACTOR, MINIMUM_EASE_FACTOR};

/// Ease adjustment applied when an answer fails (quality < 3).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureEase {
    /// Subtract a flat amount.
    Penalty(f64),
    /// Apply the SM-2 ease formula as for successful answers.
    Formula,
}

impl Default for FailureEase {
    fn default() -> Self {
        Self::Penalty(0.2)
    }
}

/// SM-2 algorithm with configurable parameters.
#[derive(Debug, Clone)]
pub struct Sm2 {
    pub initial_ease: f64,
    pub minimum_ease: f64,
    pub first_interval: u32,
    pub second_interval: u32,
    pub failure_ease: FailureEase,
}

impl Default for Sm2 {
    fn default() -> Self {
        Self {
            initial_ease: INITIAL_EASE_FACTOR,
            minimum_ease: MINIMUM_EASE_FACTOR,
            first_interval: 1,
            second_interval: 6,
            failure_ease: FailureEase::default(),
        }
    }
}

impl SpacedRepetitionAlgorithm for Sm2 {
    fn name(&self) -> &'static str {
        "sm2"
    }

    fn initial_state(&self) -> CardScheduleState {
        CardScheduleState {
            ease_factor: self.initial_ease,
            ..Default::default()
        }
    }

    fn schedule(
        &self,
        state: &CardScheduleState,
        quality: Quality,
        now: DateTime<Utc>,
    ) -> SchedulingResult {
        let mut next = record_study(state, quality, now);

        if quality.is_correct() {
            next.repetitions = state.repetitions.saturating_add(1);
            next.interval_days = match next.repetitions {
                1 => self.first_interval,
                2 => self.second_interval,
                // Grows from the ease held before this answer.
                _ => saturating_days(f64::from(state.interval_days) * state.ease_factor),
            };
        } else {
            next.repetitions = 0;
            next.interval_days = self.first_interval;
        }
        next.interval_days = next.interval_days.max(1);
        next.ease_factor = self.next_ease(state.ease_factor, quality);

        let next_due = review_date(now, next.interval_days);
        next.next_review_at = Some(next_due);

        SchedulingResult {
            new_state: next,
            next_due: Some(next_due),
        }
    }
}

impl Sm2 {
    /// EF' = EF + (0.1 - (5 - q) * (0.08 + (5 - q) * 0.02)), floored, two decimals.
    fn next_ease(&self, ease: f64, quality: Quality) -> f64 {
        let adjusted = match (quality.is_correct(), self.failure_ease) {
            (false, FailureEase::Penalty(penalty)) => ease - penalty,
            _ => ease + ease_delta(quality),
        };
        round2(adjusted.max(self.minimum_ease))
    }
}

fn ease_delta(quality: Quality) -> f64 {
    let miss = f64::from(Quality::MAX - quality.value());
    0.1 - miss * (0.08 + miss * 0.02)
}

/// Latest representable review date, 9999-12-31T23:59:59Z. Keeps stored
/// timestamps within four-digit RFC 3339 years.
pub fn latest_review_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(9999, 12, 31, 23, 59, 59)
        .single()
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// `now + days`, clamped to [`latest_review_at`].
fn review_date(now: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    let latest = latest_review_at();
    Duration::try_days(i64::from(days))
        .and_then(|delta| now.checked_add_signed(delta))
        .map_or(latest, |due| due.min(latest))
}

fn saturating_days(days: f64) -> u32 {
    let days = days.round();
    if days >= f64::from(u32::MAX) {
        u32::MAX
    } else if days <= 0.0 {
        0
    } else {
        days as u32
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
