//! Cram: rapid passes over the whole deck, no mastery gating.
//!
//! Scores count correct answers and correct answers under the fast-answer
//! threshold. Review dates are left alone.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AnsweredCard, ModePolicy, ModeScore};
use crate::algorithm::SchedulingEffect;
use crate::session::{CardQueue, SessionCounters, SessionTargets, SessionView};
use crate::settings::EffectiveStudySettings;
use crate::types::{CardId, CardProgress, StudyMode};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CramPolicy {
    pub rounds: u32,
    pub fast_ms: u64,
    #[serde(default)]
    round: u32,
    #[serde(default)]
    deck: Vec<CardId>,
    #[serde(default)]
    fast_correct: u32,
}

impl CramPolicy {
    pub fn new(settings: &EffectiveStudySettings) -> Self {
        Self {
            rounds: settings.cram_rounds,
            fast_ms: settings.cram_fast_ms,
            round: 0,
            deck: Vec::new(),
            fast_correct: 0,
        }
    }

    pub fn round(&self) -> u32 {
        self.round
    }
}

impl ModePolicy for CramPolicy {
    fn mode(&self) -> StudyMode {
        StudyMode::Cram
    }

    fn scheduling_effect(&self) -> SchedulingEffect {
        SchedulingEffect::RecordOnly
    }

    fn initial_queue(
        &mut self,
        deck_cards: &[CardId],
        _progress: &[CardProgress],
        _targets: &SessionTargets,
        _now: DateTime<Utc>,
    ) -> Vec<CardId> {
        self.deck = deck_cards.to_vec();
        self.round = 1;
        self.deck.clone()
    }

    fn on_answer(
        &mut self,
        queue: &mut CardQueue,
        _counters: &SessionCounters,
        answered: &AnsweredCard,
    ) -> Option<CardId> {
        if answered.correct && answered.response_time_ms <= self.fast_ms {
            self.fast_correct += 1;
        }
        if queue.is_exhausted() && self.round < self.rounds {
            self.round += 1;
            queue.extend(&self.deck);
        }
        queue.current()
    }

    fn is_complete(&self, view: &SessionView<'_>) -> bool {
        view.queue.is_exhausted() || view.targets_reached()
    }

    fn score(&self, counters: &SessionCounters) -> ModeScore {
        ModeScore::Cram {
            correct: counters.correct,
            fast_correct: self.fast_correct,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::testing::{answer, now, view};
    use pretty_assertions::assert_eq;

    fn policy(rounds: u32) -> CramPolicy {
        CramPolicy {
            rounds,
            ..CramPolicy::new(&EffectiveStudySettings::merge(&Default::default(), None))
        }
    }

    #[test]
    fn repeats_the_deck_for_each_round() {
        let mut policy = policy(2);
        let cards = policy.initial_queue(&[1, 2], &[], &SessionTargets::default(), now());
        let mut queue = CardQueue::new(cards);
        let mut counters = SessionCounters::default();
        let targets = SessionTargets::default();

        assert_eq!(answer(&mut policy, &mut queue, &mut counters, 4, 1000), Some(2));
        assert_eq!(answer(&mut policy, &mut queue, &mut counters, 1, 1000), Some(1));
        assert_eq!(policy.round(), 2);
        assert_eq!(answer(&mut policy, &mut queue, &mut counters, 4, 1000), Some(2));
        assert_eq!(answer(&mut policy, &mut queue, &mut counters, 4, 1000), None);
        assert_eq!(queue.cards(), &[1, 2, 1, 2]);
        assert!(policy.is_complete(&view(&queue, &counters, &targets, 40)));
    }

    #[test]
    fn wrong_answers_are_not_requeued() {
        let mut policy = policy(1);
        let cards = policy.initial_queue(&[1, 2, 3], &[], &SessionTargets::default(), now());
        let mut queue = CardQueue::new(cards);
        let mut counters = SessionCounters::default();
        for _ in 0..3 {
            answer(&mut policy, &mut queue, &mut counters, 0, 500);
        }
        assert_eq!(queue.len(), 3);
        assert!(queue.is_exhausted());
    }

    #[test]
    fn scores_fast_correct_answers() {
        let mut policy = policy(1);
        let cards = policy.initial_queue(&[1, 2, 3], &[], &SessionTargets::default(), now());
        let mut queue = CardQueue::new(cards);
        let mut counters = SessionCounters::default();

        answer(&mut policy, &mut queue, &mut counters, 5, 1200);
        answer(&mut policy, &mut queue, &mut counters, 4, 6000);
        answer(&mut policy, &mut queue, &mut counters, 2, 800);

        assert_eq!(
            policy.score(&counters),
            ModeScore::Cram {
                correct: 2,
                fast_correct: 1
            }
        );
    }

    #[test]
    fn card_target_stops_early() {
        let mut policy = policy(3);
        let cards = policy.initial_queue(&[1, 2, 3], &[], &SessionTargets::default(), now());
        let mut queue = CardQueue::new(cards);
        let mut counters = SessionCounters::default();
        let targets = SessionTargets {
            target_cards: Some(2),
            target_minutes: None,
        };
        answer(&mut policy, &mut queue, &mut counters, 4, 500);
        assert!(!policy.is_complete(&view(&queue, &counters, &targets, 1)));
        answer(&mut policy, &mut queue, &mut counters, 4, 500);
        assert!(policy.is_complete(&view(&queue, &counters, &targets, 2)));
    }
}
