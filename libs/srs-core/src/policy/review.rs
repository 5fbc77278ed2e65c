//! Review: cards whose review date has passed, most overdue first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AnsweredCard, ModePolicy, ModeScore};
use crate::selector::select_due;
use crate::session::{CardQueue, SessionCounters, SessionTargets, SessionView};
use crate::settings::EffectiveStudySettings;
use crate::types::{CardId, CardProgress, StudyMode};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewPolicy {
    pub limit: usize,
}

impl ReviewPolicy {
    pub fn new(settings: &EffectiveStudySettings) -> Self {
        Self {
            limit: settings.review_limit,
        }
    }
}

impl ModePolicy for ReviewPolicy {
    fn mode(&self) -> StudyMode {
        StudyMode::Review
    }

    fn initial_queue(
        &mut self,
        _deck_cards: &[CardId],
        progress: &[CardProgress],
        targets: &SessionTargets,
        now: DateTime<Utc>,
    ) -> Vec<CardId> {
        let limit = targets
            .target_cards
            .map(|target| target as usize)
            .unwrap_or(self.limit);
        select_due(progress, now, limit)
    }

    fn on_answer(
        &mut self,
        queue: &mut CardQueue,
        _counters: &SessionCounters,
        _answered: &AnsweredCard,
    ) -> Option<CardId> {
        queue.current()
    }

    fn is_complete(&self, view: &SessionView<'_>) -> bool {
        view.queue.is_exhausted() || view.targets_reached()
    }

    fn score(&self, counters: &SessionCounters) -> ModeScore {
        ModeScore::Accuracy {
            rate: counters.accuracy_rate(),
        }
    }
}
