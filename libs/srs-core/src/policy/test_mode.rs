//! Test: a fixed snapshot of the deck, shuffled once, each card asked once.
//!
//! Answers never move review dates. An optional per-card limit grades slow
//! answers as incorrect; the session's minute target acts as a hard limit.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::{AnsweredCard, ModePolicy, ModeScore};
use crate::algorithm::SchedulingEffect;
use crate::session::{CardQueue, SessionCounters, SessionTargets, SessionView};
use crate::settings::EffectiveStudySettings;
use crate::types::{CardId, CardProgress, Quality, StudyMode};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestPolicy {
    pub seed: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_time_limit_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_time_limit_secs: Option<i64>,
    #[serde(default)]
    total_cards: usize,
    #[serde(default)]
    timeouts: u32,
}

impl TestPolicy {
    pub fn new(settings: &EffectiveStudySettings, seed: u64) -> Self {
        Self {
            seed,
            card_time_limit_ms: settings.card_time_limit_secs.map(|secs| secs * 1000),
            session_time_limit_secs: None,
            total_cards: 0,
            timeouts: 0,
        }
    }

    fn over_card_limit(&self, response_time_ms: u64) -> bool {
        self.card_time_limit_ms
            .is_some_and(|limit| response_time_ms > limit)
    }
}

impl ModePolicy for TestPolicy {
    fn mode(&self) -> StudyMode {
        StudyMode::Test
    }

    fn scheduling_effect(&self) -> SchedulingEffect {
        SchedulingEffect::RecordOnly
    }

    fn initial_queue(
        &mut self,
        deck_cards: &[CardId],
        _progress: &[CardProgress],
        targets: &SessionTargets,
        _now: DateTime<Utc>,
    ) -> Vec<CardId> {
        let mut cards = deck_cards.to_vec();
        let mut rng = StdRng::seed_from_u64(self.seed);
        cards.shuffle(&mut rng);
        if let Some(target) = targets.target_cards {
            cards.truncate(target as usize);
        }

        self.session_time_limit_secs = targets.target_minutes.map(|m| i64::from(m) * 60);
        self.total_cards = cards.len();
        cards
    }

    fn grade(&self, quality: Quality, response_time_ms: u64) -> bool {
        quality.is_correct() && !self.over_card_limit(response_time_ms)
    }

    fn on_answer(
        &mut self,
        queue: &mut CardQueue,
        _counters: &SessionCounters,
        answered: &AnsweredCard,
    ) -> Option<CardId> {
        if self.over_card_limit(answered.response_time_ms) {
            self.timeouts += 1;
        }
        queue.current()
    }

    fn is_complete(&self, view: &SessionView<'_>) -> bool {
        view.queue.is_exhausted() || self.time_expired(view)
    }

    fn time_expired(&self, view: &SessionView<'_>) -> bool {
        self.session_time_limit_secs
            .is_some_and(|limit| view.active_seconds >= limit)
    }

    fn score(&self, counters: &SessionCounters) -> ModeScore {
        ModeScore::Test {
            correct: counters.correct,
            total: self.total_cards,
            timeouts: self.timeouts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::testing::{answer, now, view};

    fn policy(seed: u64, card_limit_secs: Option<u64>) -> TestPolicy {
        let mut settings = EffectiveStudySettings::merge(&Default::default(), None);
        settings.card_time_limit_secs = card_limit_secs;
        TestPolicy::new(&settings, seed)
    }

    #[test]
    fn shuffle_is_a_permutation_and_reproducible() {
        let deck: Vec<CardId> = (1..=20).collect();
        let a = policy(99, None).initial_queue(&deck, &[], &SessionTargets::default(), now());
        let b = policy(99, None).initial_queue(&deck, &[], &SessionTargets::default(), now());
        assert_eq!(a, b);

        let mut sorted = a.clone();
        sorted.sort();
        assert_eq!(sorted, deck);
    }

    #[test]
    fn card_target_takes_a_subset() {
        let targets = SessionTargets {
            target_cards: Some(3),
            target_minutes: None,
        };
        let mut policy = policy(5, None);
        let queue = policy.initial_queue(&[1, 2, 3, 4, 5], &[], &targets, now());
        assert_eq!(queue.len(), 3);
        assert_eq!(
            policy.score(&SessionCounters::default()),
            ModeScore::Test {
                correct: 0,
                total: 3,
                timeouts: 0
            }
        );
    }

    #[test]
    fn slow_answer_is_graded_incorrect() {
        let mut policy = policy(1, Some(10));
        let cards = policy.initial_queue(&[1, 2], &[], &SessionTargets::default(), now());
        let mut queue = CardQueue::new(cards);
        let mut counters = SessionCounters::default();

        answer(&mut policy, &mut queue, &mut counters, 5, 12_000);
        answer(&mut policy, &mut queue, &mut counters, 5, 4_000);

        assert_eq!(counters.correct, 1);
        assert_eq!(counters.incorrect, 1);
        assert_eq!(
            policy.score(&counters),
            ModeScore::Test {
                correct: 1,
                total: 2,
                timeouts: 1
            }
        );
        let targets = SessionTargets::default();
        assert!(policy.is_complete(&view(&queue, &counters, &targets, 30)));
    }

    #[test]
    fn every_card_asked_once_without_requeue() {
        let mut policy = policy(3, None);
        let cards = policy.initial_queue(&[1, 2, 3], &[], &SessionTargets::default(), now());
        let mut queue = CardQueue::new(cards);
        let mut counters = SessionCounters::default();
        for _ in 0..3 {
            answer(&mut policy, &mut queue, &mut counters, 0, 1000);
        }
        assert_eq!(queue.len(), 3);
        assert!(queue.is_exhausted());
    }

    #[test]
    fn minute_target_is_a_hard_limit() {
        let targets = SessionTargets {
            target_cards: None,
            target_minutes: Some(2),
        };
        let mut policy = policy(3, None);
        let cards = policy.initial_queue(&[1, 2, 3], &[], &targets, now());
        let queue = CardQueue::new(cards);
        let counters = SessionCounters::default();
        assert!(!policy.time_expired(&view(&queue, &counters, &targets, 119)));
        assert!(policy.time_expired(&view(&queue, &counters, &targets, 120)));
        assert!(policy.is_complete(&view(&queue, &counters, &targets, 120)));
    }
}
