//! Practice: every studied card, weakest first.
//!
//! Missed cards come back a few positions later. A running streak earns a
//! bonus re-selection of a card already answered correctly in the session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AnsweredCard, ModePolicy, ModeScore};
use crate::session::{CardQueue, SessionCounters, SessionTargets, SessionView};
use crate::settings::EffectiveStudySettings;
use crate::types::{CardId, CardProgress, CardScheduleState, StudyMode};

/// Ratings considered when weighting recent failures.
const RECENT_WINDOW: usize = 5;

/// Ease factor at or above which a card gets no ease weight.
const EASE_CEILING: f64 = 3.0;

/// Times a missed card is re-queued within one session.
const MAX_REQUEUES: u32 = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PracticePolicy {
    pub requeue_gap: usize,
    pub streak_bonus_every: u32,
    #[serde(default)]
    requeues: Vec<(CardId, u32)>,
    /// Cards answered correctly, in the order of their first correct answer.
    #[serde(default)]
    correct_order: Vec<CardId>,
    #[serde(default)]
    reselected: Vec<CardId>,
}

impl PracticePolicy {
    pub fn new(settings: &EffectiveStudySettings) -> Self {
        Self {
            requeue_gap: settings.requeue_gap,
            streak_bonus_every: settings.streak_bonus_every,
            requeues: Vec::new(),
            correct_order: Vec::new(),
            reselected: Vec::new(),
        }
    }

    pub fn bonus_reselections(&self) -> usize {
        self.reselected.len()
    }

    fn requeue_count(&self, card_id: CardId) -> u32 {
        self.requeues
            .iter()
            .find(|(id, _)| *id == card_id)
            .map(|(_, count)| *count)
            .unwrap_or(0)
    }

    fn bump_requeue(&mut self, card_id: CardId) {
        match self.requeues.iter_mut().find(|(id, _)| *id == card_id) {
            Some((_, count)) => *count += 1,
            None => self.requeues.push((card_id, 1)),
        }
    }

    fn bonus_candidate(&self, queue: &CardQueue, just_answered: CardId) -> Option<CardId> {
        self.correct_order.iter().copied().find(|&card| {
            card != just_answered
                && !self.reselected.contains(&card)
                && !queue.upcoming().contains(&card)
        })
    }
}

/// Higher weight means the card needs practice more.
pub fn practice_weight(state: &CardScheduleState) -> f64 {
    (EASE_CEILING - state.ease_factor).max(0.0) + state.recent_failures(RECENT_WINDOW) as f64
}

impl ModePolicy for PracticePolicy {
    fn mode(&self) -> StudyMode {
        StudyMode::Practice
    }

    fn initial_queue(
        &mut self,
        _deck_cards: &[CardId],
        progress: &[CardProgress],
        _targets: &SessionTargets,
        _now: DateTime<Utc>,
    ) -> Vec<CardId> {
        let mut weighted: Vec<(f64, CardId)> = progress
            .iter()
            .filter(|p| p.state.times_studied > 0)
            .map(|p| (practice_weight(&p.state), p.card_id))
            .collect();
        weighted.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
        weighted.into_iter().map(|(_, card)| card).collect()
    }

    fn on_answer(
        &mut self,
        queue: &mut CardQueue,
        counters: &SessionCounters,
        answered: &AnsweredCard,
    ) -> Option<CardId> {
        let card = answered.card_id;
        if answered.correct {
            if !self.correct_order.contains(&card) {
                self.correct_order.push(card);
            }
            let bonus_due = self.streak_bonus_every > 0
                && counters.streak > 0
                && counters.streak % self.streak_bonus_every == 0;
            if bonus_due {
                if let Some(bonus) = self.bonus_candidate(queue, card) {
                    tracing::debug!(card_id = bonus, streak = counters.streak, "streak bonus reselection");
                    self.reselected.push(bonus);
                    queue.push_back(bonus);
                }
            }
        } else if self.requeue_count(card) < MAX_REQUEUES {
            self.bump_requeue(card);
            queue.insert_ahead(card, self.requeue_gap);
        }
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
