//! Study settings: global defaults merged with per-session overrides.

use serde::{Deserialize, Serialize};

use crate::algorithm::FailureEase;

/// Global settings configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudySettings {
    /// Upper bound on a Review queue when no card target is given.
    pub review_limit: usize,
    /// New cards introduced at once in Learn mode.
    pub learn_batch_size: usize,
    /// Consecutive correct answers that promote a Learn card out of "new".
    pub mastery_threshold: u32,
    /// How many positions ahead a missed card is re-queued.
    pub requeue_gap: usize,
    /// Practice re-selects an already-correct card every this many streak answers.
    pub streak_bonus_every: u32,
    /// Passes over the deck in a Cram session.
    pub cram_rounds: u32,
    /// Cram answers at or under this response time count as fast.
    pub cram_fast_ms: u64,
    pub break_reminders_enabled: bool,
    pub break_interval_minutes: u32,
    pub failure_ease: FailureEase,
}

impl Default for StudySettings {
    fn default() -> Self {
        Self {
            review_limit: 200,
            learn_batch_size: 5,
            mastery_threshold: 2,
            requeue_gap: 3,
            streak_bonus_every: 5,
            cram_rounds: 3,
            cram_fast_ms: 3000,
            break_reminders_enabled: true,
            break_interval_minutes: 25,
            failure_ease: FailureEase::default(),
        }
    }
}

/// Per-session overrides (all fields optional).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub break_reminders_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub break_interval_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cram_rounds: Option<u32>,
    /// Test mode: answers slower than this are graded incorrect.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_time_limit_secs: Option<u64>,
    /// Seed for the one-time Test shuffle; random when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shuffle_seed: Option<u64>,
}

/// Effective settings (global merged with session overrides).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectiveStudySettings {
    pub review_limit: usize,
    pub learn_batch_size: usize,
    pub mastery_threshold: u32,
    pub requeue_gap: usize,
    pub streak_bonus_every: u32,
    pub cram_rounds: u32,
    pub cram_fast_ms: u64,
    pub break_reminders_enabled: bool,
    pub break_interval_minutes: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_time_limit_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shuffle_seed: Option<u64>,
}

impl EffectiveStudySettings {
    /// Merge global settings with optional session overrides.
    pub fn merge(global: &StudySettings, options: Option<&SessionOptions>) -> Self {
        let defaults = SessionOptions::default();
        let o = options.unwrap_or(&defaults);
        Self {
            review_limit: global.review_limit,
            learn_batch_size: global.learn_batch_size.max(1),
            mastery_threshold: global.mastery_threshold.max(1),
            requeue_gap: global.requeue_gap.max(1),
            streak_bonus_every: global.streak_bonus_every,
            cram_rounds: o.cram_rounds.unwrap_or(global.cram_rounds).max(1),
            cram_fast_ms: global.cram_fast_ms,
            break_reminders_enabled: o
                .break_reminders_enabled
                .unwrap_or(global.break_reminders_enabled),
            break_interval_minutes: o
                .break_interval_minutes
                .unwrap_or(global.break_interval_minutes),
            card_time_limit_secs: o.card_time_limit_secs,
            shuffle_seed: o.shuffle_seed,
        }
    }
}
