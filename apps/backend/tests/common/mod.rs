//! Common test utilities for integration tests.
//!
//! Every TestContext owns its own in-memory SQLite database, so tests
//! run in parallel without cleanup.

pub mod fixtures;

use axum::Router;
use uuid::Uuid;

use srs_backend::db::{DeckRecord, NewCard, SqliteRepository};
use srs_backend::{router, AppState};
use srs_core::StudySettings;

/// Test context holding a router over a fresh database.
pub struct TestContext {
    state: AppState,
    app: Router,
}

impl TestContext {
    pub fn new() -> Self {
        let repo = SqliteRepository::open_in_memory().expect("Failed to open test database");
        let state = AppState::new(repo, StudySettings::default());
        let app = router(state.clone());
        Self { state, app }
    }

    /// Get the router for use with axum-test.
    pub fn router(&self) -> Router {
        self.app.clone()
    }

    /// Create a test user and return its ID and token.
    pub async fn create_test_user(&self, name: Option<&str>) -> (Uuid, String) {
        let name = name.map(str::to_string);
        let user = self
            .state
            .with_manager(move |manager| Ok(manager.store().create_user(name.as_deref())?))
            .await
            .expect("Failed to create test user");
        (user.id, user.token)
    }

    /// Create a deck owned by `owner_id` with `num_cards` cards.
    pub async fn create_test_deck(&self, owner_id: Uuid, num_cards: usize) -> DeckRecord {
        let cards: Vec<NewCard> = fixtures::sample_cards(num_cards);
        self.state
            .with_manager(move |manager| {
                Ok(manager.store().create_deck(owner_id, "Test deck", &cards)?)
            })
            .await
            .expect("Failed to create test deck")
    }

    /// Card ids of a deck in position order.
    pub async fn card_ids(&self, deck_id: i64) -> Vec<i64> {
        self.state
            .with_manager(move |manager| Ok(manager.store().cards(deck_id)?))
            .await
            .expect("Failed to list cards")
            .into_iter()
            .map(|card| card.id)
            .collect()
    }

    /// Format authorization header value.
    pub fn auth_header_value(token: &str) -> String {
        format!("Bearer {}", token)
    }
}
