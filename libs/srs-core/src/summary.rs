//! Session summaries and the milestones reported while answering.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::policy::{ModePolicy, ModeScore};
use crate::session::{AnswerRecord, StudySession};
use crate::types::{SessionId, StudyMode};

/// Accuracy at or above which a session earns the high-accuracy goal.
const HIGH_ACCURACY: f64 = 80.0;

/// Best streak that earns the streak goal.
const STREAK_MASTER: u32 = 5;

/// Answers considered for accuracy milestones.
const ACCURACY_WINDOW: usize = 10;

/// How a session came to be completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionType {
    /// The mode's completion rule fired after an answer.
    Automatic,
    /// The user finished the session.
    Manual,
    /// A Test session ran out of time.
    TimeLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Goal {
    TargetCards,
    TargetTime,
    HighAccuracy,
    StreakMaster,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceRating {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl PerformanceRating {
    pub fn from_accuracy(accuracy: f64) -> Self {
        if accuracy >= 90.0 {
            Self::Excellent
        } else if accuracy >= 80.0 {
            Self::Good
        } else if accuracy >= 60.0 {
            Self::Fair
        } else {
            Self::Poor
        }
    }
}

/// Mode to suggest for the next session.
pub fn recommended_mode(accuracy: f64) -> StudyMode {
    if accuracy < 60.0 {
        StudyMode::Learn
    } else if accuracy < 80.0 {
        StudyMode::Practice
    } else if accuracy >= 90.0 {
        StudyMode::Cram
    } else {
        StudyMode::Review
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakMilestone {
    Streak5,
    Streak10,
    Streak20,
    Streak50,
}

impl StreakMilestone {
    pub fn reached(streak: u32) -> Option<Self> {
        match streak {
            5 => Some(Self::Streak5),
            10 => Some(Self::Streak10),
            20 => Some(Self::Streak20),
            50 => Some(Self::Streak50),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccuracyMilestone {
    ExcellentAccuracy,
    GoodAccuracy,
    FairAccuracy,
}

impl AccuracyMilestone {
    /// Judged on the last ten answers; `None` until there are ten.
    pub fn reached(answers: &[AnswerRecord]) -> Option<Self> {
        if answers.len() < ACCURACY_WINDOW {
            return None;
        }
        let recent = &answers[answers.len() - ACCURACY_WINDOW..];
        let correct = recent.iter().filter(|a| a.correct).count();
        let accuracy = correct as f64 / ACCURACY_WINDOW as f64;

        if accuracy >= 0.9 {
            Some(Self::ExcellentAccuracy)
        } else if accuracy >= 0.8 {
            Some(Self::GoodAccuracy)
        } else if accuracy >= 0.7 {
            Some(Self::FairAccuracy)
        } else {
            None
        }
    }
}

/// Final figures of a completed session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: SessionId,
    pub mode: StudyMode,
    pub completion_type: CompletionType,
    pub total_seconds: i64,
    pub cards_studied: u32,
    pub correct_answers: u32,
    pub incorrect_answers: u32,
    pub accuracy_rate: f64,
    pub average_response_secs: f64,
    pub best_streak: u32,
    pub break_count: u32,
    pub break_seconds: i64,
    pub goals_achieved: Vec<Goal>,
    pub performance_rating: PerformanceRating,
    pub recommended_mode: StudyMode,
    pub cards_due_tomorrow: usize,
    pub score: ModeScore,
    pub completed_at: DateTime<Utc>,
}

impl SessionSummary {
    pub fn build(
        session: &StudySession,
        completion_type: CompletionType,
        cards_due_tomorrow: usize,
        now: DateTime<Utc>,
    ) -> Self {
        let counters = &session.counters;
        let total_seconds = session.active_seconds(now);
        let accuracy_rate = counters.accuracy_rate();

        let mut goals_achieved = Vec::new();
        if session.targets.cards_reached(counters.cards_studied) {
            goals_achieved.push(Goal::TargetCards);
        }
        if session.targets.time_reached(total_seconds) {
            goals_achieved.push(Goal::TargetTime);
        }
        if accuracy_rate >= HIGH_ACCURACY {
            goals_achieved.push(Goal::HighAccuracy);
        }
        if counters.best_streak >= STREAK_MASTER {
            goals_achieved.push(Goal::StreakMaster);
        }

        Self {
            session_id: session.id,
            mode: session.mode,
            completion_type,
            total_seconds,
            cards_studied: counters.cards_studied,
            correct_answers: counters.correct,
            incorrect_answers: counters.incorrect,
            accuracy_rate,
            average_response_secs: counters.average_response_secs(),
            best_streak: counters.best_streak,
            break_count: counters.break_count,
            break_seconds: counters.break_seconds,
            goals_achieved,
            performance_rating: PerformanceRating::from_accuracy(accuracy_rate),
            recommended_mode: recommended_mode(accuracy_rate),
            cards_due_tomorrow,
            score: session.policy.score(counters),
            completed_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(correct: bool) -> AnswerRecord {
        AnswerRecord {
            card_id: 1,
            quality: if correct { 4 } else { 1 },
            correct,
            response_time_ms: 1000,
            answered_at: DateTime::<Utc>::default(),
        }
    }

    #[test]
    fn streak_milestones_only_at_exact_counts() {
        assert_eq!(StreakMilestone::reached(5), Some(StreakMilestone::Streak5));
        assert_eq!(StreakMilestone::reached(50), Some(StreakMilestone::Streak50));
        assert_eq!(StreakMilestone::reached(6), None);
        assert_eq!(StreakMilestone::reached(0), None);
    }

    #[test]
    fn accuracy_milestone_needs_ten_answers() {
        let answers: Vec<_> = (0..9).map(|_| record(true)).collect();
        assert_eq!(AccuracyMilestone::reached(&answers), None);
    }

    #[test]
    fn accuracy_milestone_uses_last_ten() {
        let mut answers: Vec<_> = (0..5).map(|_| record(false)).collect();
        answers.extend((0..8).map(|_| record(true)));
        answers.extend((0..2).map(|_| record(false)));
        assert_eq!(
            AccuracyMilestone::reached(&answers),
            Some(AccuracyMilestone::GoodAccuracy)
        );
    }

    #[test]
    fn rating_and_recommendation_thresholds() {
        assert_eq!(PerformanceRating::from_accuracy(95.0), PerformanceRating::Excellent);
        assert_eq!(PerformanceRating::from_accuracy(80.0), PerformanceRating::Good);
        assert_eq!(PerformanceRating::from_accuracy(60.0), PerformanceRating::Fair);
        assert_eq!(PerformanceRating::from_accuracy(59.9), PerformanceRating::Poor);

        assert_eq!(recommended_mode(40.0), StudyMode::Learn);
        assert_eq!(recommended_mode(70.0), StudyMode::Practice);
        assert_eq!(recommended_mode(85.0), StudyMode::Review);
        assert_eq!(recommended_mode(90.0), StudyMode::Cram);
    }
}
