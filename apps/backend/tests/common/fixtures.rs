//! Test fixtures and factory functions for creating test data.

use serde_json::{json, Value};

use srs_backend::db::NewCard;

/// Generate `num_cards` numbered question/answer pairs.
pub fn sample_cards(num_cards: usize) -> Vec<NewCard> {
    (1..=num_cards)
        .map(|i| NewCard {
            question: format!("Question {i}?"),
            answer: format!("Answer {i}."),
        })
        .collect()
}

/// Body for POST /api/decks.
pub fn create_deck_request(name: &str, num_cards: usize) -> Value {
    json!({
        "name": name,
        "cards": sample_cards(num_cards),
    })
}

/// Body for POST /api/sessions.
pub fn start_request(deck_id: i64, mode: &str) -> Value {
    json!({ "deck_id": deck_id, "mode": mode })
}

/// Body for POST /api/sessions/:id/answers.
pub fn answer_request(card_id: i64, quality: i64) -> Value {
    json!({
        "card_id": card_id,
        "quality": quality,
        "response_time_ms": 2500,
    })
}
