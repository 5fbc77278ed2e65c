//! Per-mode card selection, progress and completion rules.
//!
//! A session carries exactly one [`ModeState`], chosen when it starts. The
//! enum is the only place that dispatches on the mode.

pub mod cram;
pub mod learn;
pub mod practice;
pub mod review;
pub mod test_mode;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::algorithm::SchedulingEffect;
use crate::session::{CardQueue, SessionCounters, SessionTargets, SessionView};
use crate::settings::EffectiveStudySettings;
use crate::types::{CardId, CardProgress, Quality, StudyMode};

pub use cram::CramPolicy;
pub use learn::LearnPolicy;
pub use practice::PracticePolicy;
pub use review::ReviewPolicy;
pub use test_mode::TestPolicy;

/// An answer after grading, as seen by a policy.
#[derive(Debug, Clone, Copy)]
pub struct AnsweredCard {
    pub card_id: CardId,
    pub quality: Quality,
    pub correct: bool,
    pub response_time_ms: u64,
}

/// Mode-specific scoring reported in summaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModeScore {
    Accuracy { rate: f64 },
    Mastery { mastered: usize, introduced: usize },
    Test { correct: u32, total: usize, timeouts: u32 },
    Cram { correct: u32, fast_correct: u32 },
}

/// Capabilities every mode provides.
pub trait ModePolicy {
    fn mode(&self) -> StudyMode;

    /// How answers in this mode move the long-term schedule.
    fn scheduling_effect(&self) -> SchedulingEffect {
        SchedulingEffect::Full
    }

    /// Cards the session starts with. `progress` holds the user's states for
    /// the deck's cards; cards without an entry were never answered.
    fn initial_queue(
        &mut self,
        deck_cards: &[CardId],
        progress: &[CardProgress],
        targets: &SessionTargets,
        now: DateTime<Utc>,
    ) -> Vec<CardId>;

    /// Whether an answer counts as correct.
    fn grade(&self, quality: Quality, _response_time_ms: u64) -> bool {
        quality.is_correct()
    }

    /// React to an answer after the cursor has moved past it. Returns the
    /// next card, or `None` when nothing is left.
    fn on_answer(
        &mut self,
        queue: &mut CardQueue,
        counters: &SessionCounters,
        answered: &AnsweredCard,
    ) -> Option<CardId>;

    fn is_complete(&self, view: &SessionView<'_>) -> bool;

    /// A hard time limit ran out. Later answers are refused.
    fn time_expired(&self, _view: &SessionView<'_>) -> bool {
        false
    }

    fn score(&self, counters: &SessionCounters) -> ModeScore;
}

/// The policy of one session, with its runtime state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ModeState {
    Review(ReviewPolicy),
    Practice(PracticePolicy),
    Learn(LearnPolicy),
    Test(TestPolicy),
    Cram(CramPolicy),
}

impl ModeState {
    pub fn new(mode: StudyMode, settings: &EffectiveStudySettings, seed: u64) -> Self {
        match mode {
            StudyMode::Review => Self::Review(ReviewPolicy::new(settings)),
            StudyMode::Practice => Self::Practice(PracticePolicy::new(settings)),
            StudyMode::Learn => Self::Learn(LearnPolicy::new(settings)),
            StudyMode::Test => Self::Test(TestPolicy::new(settings, seed)),
            StudyMode::Cram => Self::Cram(CramPolicy::new(settings)),
        }
    }

    fn inner(&self) -> &dyn ModePolicy {
        match self {
            Self::Review(p) => p,
            Self::Practice(p) => p,
            Self::Learn(p) => p,
            Self::Test(p) => p,
            Self::Cram(p) => p,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn ModePolicy {
        match self {
            Self::Review(p) => p,
            Self::Practice(p) => p,
            Self::Learn(p) => p,
            Self::Test(p) => p,
            Self::Cram(p) => p,
        }
    }
}

impl ModePolicy for ModeState {
    fn mode(&self) -> StudyMode {
        self.inner().mode()
    }

    fn scheduling_effect(&self) -> SchedulingEffect {
        self.inner().scheduling_effect()
    }

    fn initial_queue(
        &mut self,
        deck_cards: &[CardId],
        progress: &[CardProgress],
        targets: &SessionTargets,
        now: DateTime<Utc>,
    ) -> Vec<CardId> {
        self.inner_mut()
            .initial_queue(deck_cards, progress, targets, now)
    }

    fn grade(&self, quality: Quality, response_time_ms: u64) -> bool {
        self.inner().grade(quality, response_time_ms)
    }

    fn on_answer(
        &mut self,
        queue: &mut CardQueue,
        counters: &SessionCounters,
        answered: &AnsweredCard,
    ) -> Option<CardId> {
        self.inner_mut().on_answer(queue, counters, answered)
    }

    fn is_complete(&self, view: &SessionView<'_>) -> bool {
        self.inner().is_complete(view)
    }

    fn time_expired(&self, view: &SessionView<'_>) -> bool {
        self.inner().time_expired(view)
    }

    fn score(&self, counters: &SessionCounters) -> ModeScore {
        self.inner().score(counters)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_state_reports_its_mode() {
        let settings = EffectiveStudySettings::merge(&Default::default(), None);
        for mode in [
            StudyMode::Review,
            StudyMode::Practice,
            StudyMode::Learn,
            StudyMode::Test,
            StudyMode::Cram,
        ] {
            assert_eq!(ModeState::new(mode, &settings, 7).mode(), mode);
        }
    }

    #[test]
    fn only_test_and_cram_skip_scheduling() {
        let settings = EffectiveStudySettings::merge(&Default::default(), None);
        let effect = |mode| ModeState::new(mode, &settings, 1).scheduling_effect();
        assert_eq!(effect(StudyMode::Review), SchedulingEffect::Full);
        assert_eq!(effect(StudyMode::Practice), SchedulingEffect::Full);
        assert_eq!(effect(StudyMode::Learn), SchedulingEffect::Full);
        assert_eq!(effect(StudyMode::Test), SchedulingEffect::RecordOnly);
        assert_eq!(effect(StudyMode::Cram), SchedulingEffect::RecordOnly);
    }

    #[test]
    fn mode_state_serializes_with_tag() {
        let settings = EffectiveStudySettings::merge(&Default::default(), None);
        let state = ModeState::new(StudyMode::Review, &settings, 0);
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["mode"], "review");
        let back: ModeState = serde_json::from_value(json).unwrap();
        assert_eq!(back, state);
    }
}
