//! Learn: cards never scheduled, introduced a batch at a time.
//!
//! A card leaves the active pool once it reaches the mastery threshold of
//! consecutive correct answers; each promotion introduces the next new card.
//! Until then it keeps coming back a few positions later.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AnsweredCard, ModePolicy, ModeScore};
use crate::session::{CardQueue, SessionCounters, SessionTargets, SessionView};
use crate::settings::EffectiveStudySettings;
use crate::types::{CardId, CardProgress, StudyMode};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnPolicy {
    pub batch_size: usize,
    pub mastery_threshold: u32,
    pub requeue_gap: usize,
    #[serde(default)]
    pending: VecDeque<CardId>,
    #[serde(default)]
    introduced: Vec<CardId>,
    #[serde(default)]
    consecutive: Vec<(CardId, u32)>,
    #[serde(default)]
    mastered: Vec<CardId>,
}

impl LearnPolicy {
    pub fn new(settings: &EffectiveStudySettings) -> Self {
        Self {
            batch_size: settings.learn_batch_size,
            mastery_threshold: settings.mastery_threshold,
            requeue_gap: settings.requeue_gap,
            pending: VecDeque::new(),
            introduced: Vec::new(),
            consecutive: Vec::new(),
            mastered: Vec::new(),
        }
    }

    pub fn introduced(&self) -> &[CardId] {
        &self.introduced
    }

    pub fn mastered(&self) -> &[CardId] {
        &self.mastered
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    fn introduce_next(&mut self) -> Option<CardId> {
        let card = self.pending.pop_front()?;
        self.introduced.push(card);
        Some(card)
    }

    /// Update the consecutive-correct run of a card and return it.
    fn record_run(&mut self, card_id: CardId, correct: bool) -> u32 {
        let index = match self.consecutive.iter().position(|(id, _)| *id == card_id) {
            Some(index) => index,
            None => {
                self.consecutive.push((card_id, 0));
                self.consecutive.len() - 1
            }
        };
        let entry = &mut self.consecutive[index];
        entry.1 = if correct { entry.1 + 1 } else { 0 };
        entry.1
    }
}

impl ModePolicy for LearnPolicy {
    fn mode(&self) -> StudyMode {
        StudyMode::Learn
    }

    fn initial_queue(
        &mut self,
        deck_cards: &[CardId],
        progress: &[CardProgress],
        targets: &SessionTargets,
        _now: DateTime<Utc>,
    ) -> Vec<CardId> {
        let scheduled = |card: &CardId| {
            progress
                .iter()
                .any(|p| p.card_id == *card && p.state.is_scheduled())
        };
        let mut fresh: Vec<CardId> = deck_cards.iter().copied().filter(|c| !scheduled(c)).collect();
        if let Some(target) = targets.target_cards {
            fresh.truncate(target as usize);
        }

        self.pending = fresh.into();
        (0..self.batch_size)
            .map_while(|_| self.introduce_next())
            .collect()
    }

    fn on_answer(
        &mut self,
        queue: &mut CardQueue,
        _counters: &SessionCounters,
        answered: &AnsweredCard,
    ) -> Option<CardId> {
        let card = answered.card_id;
        let run = self.record_run(card, answered.correct);
        if run >= self.mastery_threshold {
            if !self.mastered.contains(&card) {
                self.mastered.push(card);
            }
            if let Some(next) = self.introduce_next() {
                queue.push_back(next);
            }
        } else {
            queue.insert_ahead(card, self.requeue_gap);
        }
        queue.current()
    }

    fn is_complete(&self, view: &SessionView<'_>) -> bool {
        let all_mastered = self.pending.is_empty() && self.mastered.len() == self.introduced.len();
        all_mastered || view.targets.time_reached(view.active_seconds)
    }

    fn score(&self, _counters: &SessionCounters) -> ModeScore {
        ModeScore::Mastery {
            mastered: self.mastered.len(),
            introduced: self.introduced.len(),
        }
    }
}
