//! Due-card selection and review statistics.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{CardId, CardProgress};

/// Select up to `limit` due cards, most overdue first.
///
/// Ties on overdue time go to the card studied longest ago. Cards that were
/// never scheduled are not due; they belong to Learn sessions.
pub fn select_due(progress: &[CardProgress], now: DateTime<Utc>, limit: usize) -> Vec<CardId> {
    let mut due: Vec<&CardProgress> = progress
        .iter()
        .filter(|p| p.state.is_due(now))
        .collect();

    due.sort_by(|a, b| {
        // Earlier review date means more overdue.
        a.state
            .next_review_at
            .cmp(&b.state.next_review_at)
            .then_with(|| compare_last_studied(a, b))
            .then_with(|| a.card_id.cmp(&b.card_id))
    });

    due.into_iter().take(limit).map(|p| p.card_id).collect()
}

fn compare_last_studied(a: &CardProgress, b: &CardProgress) -> Ordering {
    match (a.state.last_studied_at, b.state.last_studied_at) {
        (Some(x), Some(y)) => x.cmp(&y),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Aggregate view of how far behind a pool of cards is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewStats {
    pub total_cards: usize,
    pub due_cards: usize,
    pub overdue_cards: usize,
    pub avg_overdue_days: f64,
    pub due_percentage: f64,
}

impl ReviewStats {
    pub fn collect(progress: &[CardProgress], now: DateTime<Utc>) -> Self {
        let total_cards = progress.len();
        let mut due_cards = 0;
        let mut overdue_cards = 0;
        let mut total_overdue_days = 0;

        for p in progress.iter().filter(|p| p.state.is_due(now)) {
            due_cards += 1;
            let days = p.state.days_overdue(now);
            if days > 0 {
                overdue_cards += 1;
                total_overdue_days += days;
            }
        }

        let avg_overdue_days = if overdue_cards > 0 {
            round1(total_overdue_days as f64 / overdue_cards as f64)
        } else {
            0.0
        };
        let due_percentage = if total_cards > 0 {
            round1(due_cards as f64 / total_cards as f64 * 100.0)
        } else {
            0.0
        };

        Self {
            total_cards,
            due_cards,
            overdue_cards,
            avg_overdue_days,
            due_percentage,
        }
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CardScheduleState;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    fn card(id: CardId, due_in_hours: Option<i64>, studied_hours_ago: Option<i64>) -> CardProgress {
        CardProgress {
            card_id: id,
            state: CardScheduleState {
                next_review_at: due_in_hours.map(|h| now() + Duration::hours(h)),
                last_studied_at: studied_hours_ago.map(|h| now() - Duration::hours(h)),
                ..Default::default()
            },
        }
    }

    #[test]
    fn orders_by_overdue_then_oldest_study() {
        let pool = vec![
            card(1, Some(-24), Some(48)),
            card(2, Some(-72), Some(96)),
            card(3, Some(-24), Some(200)),
            card(4, Some(5), Some(10)),
            card(5, None, None),
        ];
        assert_eq!(select_due(&pool, now(), 10), vec![2, 3, 1]);
    }

    #[test]
    fn respects_limit() {
        let pool = vec![
            card(1, Some(-1), None),
            card(2, Some(-2), None),
            card(3, Some(-3), None),
        ];
        assert_eq!(select_due(&pool, now(), 2), vec![3, 2]);
    }

    #[test]
    fn empty_when_nothing_due() {
        let pool = vec![card(1, Some(1), None), card(2, None, None)];
        assert!(select_due(&pool, now(), 5).is_empty());
        assert!(select_due(&[], now(), 5).is_empty());
    }

    #[test]
    fn card_due_exactly_now_is_selected() {
        let pool = vec![card(9, Some(0), None)];
        assert_eq!(select_due(&pool, now(), 1), vec![9]);
    }

    #[test]
    fn stats_over_mixed_pool() {
        let pool = vec![
            card(1, Some(-24 * 3), None),
            card(2, Some(-24), None),
            card(3, Some(-2), None),
            card(4, Some(24), None),
        ];
        let stats = ReviewStats::collect(&pool, now());
        assert_eq!(
            stats,
            ReviewStats {
                total_cards: 4,
                due_cards: 3,
                overdue_cards: 2,
                avg_overdue_days: 2.0,
                due_percentage: 75.0,
            }
        );
    }

    #[test]
    fn stats_for_empty_pool() {
        assert_eq!(ReviewStats::collect(&[], now()), ReviewStats::default());
    }
}
