//! Applying one answer to a session and to the card's schedule.

use serde::{Deserialize, Serialize};

use crate::algorithm::{RecordOnly, SchedulingEffect, Sm2, SpacedRepetitionAlgorithm};
use crate::error::Result;
use crate::policy::{AnsweredCard, ModePolicy};
use crate::session::{AnswerRecord, StudySession};
use crate::summary::{AccuracyMilestone, StreakMilestone};
use crate::types::{Answer, CardId, CardScheduleState, Quality};

/// What processing an answer produced. Nothing is persisted yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerOutcome {
    pub card_id: CardId,
    pub quality: Quality,
    pub correct: bool,
    pub card_state: CardScheduleState,
    pub next_card: Option<CardId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub streak_milestone: Option<StreakMilestone>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy_milestone: Option<AccuracyMilestone>,
}

pub struct AnswerProcessor<'a> {
    sm2: &'a Sm2,
}

impl<'a> AnswerProcessor<'a> {
    pub fn new(sm2: &'a Sm2) -> Self {
        Self { sm2 }
    }

    /// Grade the answer, schedule the card, update counters and advance.
    ///
    /// The caller has already checked that the session is active and that
    /// the answer is for the current card. On error the session is untouched.
    pub fn process(
        &self,
        session: &mut StudySession,
        state: &CardScheduleState,
        answer: &Answer,
    ) -> Result<AnswerOutcome> {
        let quality = Quality::new(answer.quality)?;
        let now = answer.submitted_at;
        let correct = session.policy.grade(quality, answer.response_time_ms);

        let scheduler: &dyn SpacedRepetitionAlgorithm = match session.policy.scheduling_effect() {
            SchedulingEffect::Full => self.sm2,
            SchedulingEffect::RecordOnly => &RecordOnly,
        };
        let card_state = scheduler.schedule(state, quality, now).new_state;

        session.counters.record(correct, answer.response_time_ms);
        session.answers.push(AnswerRecord {
            card_id: answer.card_id,
            quality: quality.value(),
            correct,
            response_time_ms: answer.response_time_ms,
            answered_at: now,
        });
        session.queue.advance();
        session.last_activity_at = now;

        let answered = AnsweredCard {
            card_id: answer.card_id,
            quality,
            correct,
            response_time_ms: answer.response_time_ms,
        };
        let next_card = session
            .policy
            .on_answer(&mut session.queue, &session.counters, &answered);

        tracing::debug!(
            session_id = %session.id,
            card_id = answer.card_id,
            quality = quality.value(),
            correct,
            interval_days = card_state.interval_days,
            ease_factor = card_state.ease_factor,
            "processed answer"
        );

        Ok(AnswerOutcome {
            card_id: answer.card_id,
            quality,
            correct,
            card_state,
            next_card,
            streak_milestone: StreakMilestone::reached(session.counters.streak),
            accuracy_milestone: AccuracyMilestone::reached(&session.answers),
        })
    }
}
