//! Study session API tests.
//!
//! Each test runs against its own in-memory SQLite database.

mod common;

use axum::http::header::AUTHORIZATION;
use axum::http::StatusCode;
use axum_test::TestServer;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use common::fixtures;
use common::TestContext;

fn server(ctx: &TestContext) -> TestServer {
    TestServer::new(ctx.router()).unwrap()
}

async fn start_session(server: &TestServer, token: &str, body: Value) -> Value {
    let response = server
        .post("/api/sessions")
        .add_header(AUTHORIZATION, TestContext::auth_header_value(token))
        .json(&body)
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json::<Value>()
}

/// Test session endpoints reject requests without a token.
#[tokio::test]
async fn test_sessions_require_auth() {
    let ctx = TestContext::new();
    let server = server(&ctx);

    let response = server.get("/api/sessions").await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let response = server
        .get("/api/sessions")
        .add_header(AUTHORIZATION, "Bearer not-a-token")
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["error"], "unauthorized");
}

/// Test a cram session runs to automatic completion.
#[tokio::test]
async fn test_cram_session_completes_automatically() {
    let ctx = TestContext::new();
    let server = server(&ctx);
    let (user_id, token) = ctx.create_test_user(Some("ada")).await;
    let deck = ctx.create_test_deck(user_id, 2).await;
    let cards = ctx.card_ids(deck.id).await;

    let session = start_session(
        &server,
        &token,
        json!({ "deck_id": deck.id, "mode": "cram", "options": { "cram_rounds": 1 } }),
    )
    .await;
    assert_eq!(session["status"], "active");
    assert_eq!(session["cards_total"], 2);
    assert_eq!(session["current_card"], cards[0]);
    let session_id = session["id"].as_str().unwrap().to_string();

    let response = server
        .post(&format!("/api/sessions/{session_id}/answers"))
        .add_header(AUTHORIZATION, TestContext::auth_header_value(&token))
        .json(&fixtures::answer_request(cards[0], 5))
        .await;
    response.assert_status_ok();
    let progress: Value = response.json();
    assert_eq!(progress["correct"], true);
    assert_eq!(progress["next_card"], cards[1]);
    assert_eq!(progress["cards_studied"], 1);
    assert!(progress.get("summary").is_none());

    let response = server
        .post(&format!("/api/sessions/{session_id}/answers"))
        .add_header(AUTHORIZATION, TestContext::auth_header_value(&token))
        .json(&fixtures::answer_request(cards[1], 1))
        .await;
    response.assert_status_ok();
    let progress: Value = response.json();
    assert_eq!(progress["correct"], false);
    assert_eq!(progress["status"], "completed");
    assert_eq!(progress["summary"]["completion_type"], "automatic");
    assert_eq!(progress["summary"]["cards_studied"], 2);
    assert_eq!(progress["summary"]["correct_answers"], 1);

    // Completing again returns the stored summary.
    let response = server
        .post(&format!("/api/sessions/{session_id}/complete"))
        .add_header(AUTHORIZATION, TestContext::auth_header_value(&token))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["completion_type"], "automatic");

    // Completed sessions leave the active list.
    let response = server
        .get("/api/sessions")
        .add_header(AUTHORIZATION, TestContext::auth_header_value(&token))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["sessions"].as_array().unwrap().len(), 0);
}

/// Test learning a card schedules it, leaving nothing due for review.
#[tokio::test]
async fn test_learn_session_schedules_cards() {
    let ctx = TestContext::new();
    let server = server(&ctx);
    let (user_id, token) = ctx.create_test_user(None).await;
    let deck = ctx.create_test_deck(user_id, 1).await;
    let card = ctx.card_ids(deck.id).await[0];

    let session = start_session(&server, &token, fixtures::start_request(deck.id, "learn")).await;
    let session_id = session["id"].as_str().unwrap().to_string();

    let mut progress = Value::Null;
    for _ in 0..2 {
        let response = server
            .post(&format!("/api/sessions/{session_id}/answers"))
            .add_header(AUTHORIZATION, TestContext::auth_header_value(&token))
            .json(&fixtures::answer_request(card, 4))
            .await;
        response.assert_status_ok();
        progress = response.json();
    }

    assert_eq!(progress["status"], "completed");
    assert_eq!(progress["card_state"]["repetitions"], 2);
    assert_eq!(progress["card_state"]["interval_days"], 6);

    let response = server
        .post("/api/sessions")
        .add_header(AUTHORIZATION, TestContext::auth_header_value(&token))
        .json(&fixtures::start_request(deck.id, "review"))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.json::<Value>()["error"], "empty_deck");
}

/// Test review of a never-studied deck is rejected as empty.
#[tokio::test]
async fn test_review_empty_deck() {
    let ctx = TestContext::new();
    let server = server(&ctx);
    let (user_id, token) = ctx.create_test_user(None).await;
    let deck = ctx.create_test_deck(user_id, 3).await;

    let response = server
        .post("/api/sessions")
        .add_header(AUTHORIZATION, TestContext::auth_header_value(&token))
        .json(&fixtures::start_request(deck.id, "review"))
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

/// Test starting a session on someone else's deck is forbidden.
#[tokio::test]
async fn test_start_session_access_denied() {
    let ctx = TestContext::new();
    let server = server(&ctx);
    let (owner_id, _) = ctx.create_test_user(Some("owner")).await;
    let (_, token) = ctx.create_test_user(Some("intruder")).await;
    let deck = ctx.create_test_deck(owner_id, 2).await;

    let response = server
        .post("/api/sessions")
        .add_header(AUTHORIZATION, TestContext::auth_header_value(&token))
        .json(&fixtures::start_request(deck.id, "cram"))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(response.json::<Value>()["error"], "access_denied");
}

/// Test out-of-range quality and wrong card are rejected without side effects.
#[tokio::test]
async fn test_invalid_answers_rejected() {
    let ctx = TestContext::new();
    let server = server(&ctx);
    let (user_id, token) = ctx.create_test_user(None).await;
    let deck = ctx.create_test_deck(user_id, 2).await;
    let cards = ctx.card_ids(deck.id).await;

    let session = start_session(&server, &token, fixtures::start_request(deck.id, "cram")).await;
    let session_id = session["id"].as_str().unwrap().to_string();

    let response = server
        .post(&format!("/api/sessions/{session_id}/answers"))
        .add_header(AUTHORIZATION, TestContext::auth_header_value(&token))
        .json(&fixtures::answer_request(cards[0], 6))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"], "invalid_quality");

    let response = server
        .post(&format!("/api/sessions/{session_id}/answers"))
        .add_header(AUTHORIZATION, TestContext::auth_header_value(&token))
        .json(&fixtures::answer_request(cards[1], 4))
        .await;
    response.assert_status(StatusCode::CONFLICT);
    assert_eq!(response.json::<Value>()["error"], "card_mismatch");

    let response = server
        .get(&format!("/api/sessions/{session_id}"))
        .add_header(AUTHORIZATION, TestContext::auth_header_value(&token))
        .await;
    response.assert_status_ok();
    let session: Value = response.json();
    assert_eq!(session["counters"]["cards_studied"], 0);
    assert_eq!(session["current_card"], cards[0]);
}

/// Test break and resume transitions, including the invalid ones.
#[tokio::test]
async fn test_break_and_resume() {
    let ctx = TestContext::new();
    let server = server(&ctx);
    let (user_id, token) = ctx.create_test_user(None).await;
    let deck = ctx.create_test_deck(user_id, 2).await;
    let cards = ctx.card_ids(deck.id).await;

    let session = start_session(&server, &token, fixtures::start_request(deck.id, "cram")).await;
    let session_id = session["id"].as_str().unwrap().to_string();
    let auth = TestContext::auth_header_value(&token);

    let response = server
        .post(&format!("/api/sessions/{session_id}/resume"))
        .add_header(AUTHORIZATION, auth.clone())
        .await;
    response.assert_status(StatusCode::CONFLICT);
    assert_eq!(response.json::<Value>()["error"], "not_on_break");

    let response = server
        .post(&format!("/api/sessions/{session_id}/break"))
        .add_header(AUTHORIZATION, auth.clone())
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["status"], "on_break");

    let response = server
        .post(&format!("/api/sessions/{session_id}/break"))
        .add_header(AUTHORIZATION, auth.clone())
        .await;
    response.assert_status(StatusCode::CONFLICT);
    assert_eq!(response.json::<Value>()["error"], "already_on_break");

    let response = server
        .post(&format!("/api/sessions/{session_id}/answers"))
        .add_header(AUTHORIZATION, auth.clone())
        .json(&fixtures::answer_request(cards[0], 4))
        .await;
    response.assert_status(StatusCode::CONFLICT);
    assert_eq!(response.json::<Value>()["error"], "session_closed");

    let response = server
        .post(&format!("/api/sessions/{session_id}/resume"))
        .add_header(AUTHORIZATION, auth.clone())
        .await;
    response.assert_status_ok();
    let session: Value = response.json();
    assert_eq!(session["status"], "active");
    assert_eq!(session["counters"]["break_count"], 1);
}

/// Test an abandoned session rejects further answers and has no summary.
#[tokio::test]
async fn test_abandon_session() {
    let ctx = TestContext::new();
    let server = server(&ctx);
    let (user_id, token) = ctx.create_test_user(None).await;
    let deck = ctx.create_test_deck(user_id, 2).await;
    let cards = ctx.card_ids(deck.id).await;
    let auth = TestContext::auth_header_value(&token);

    let session = start_session(&server, &token, fixtures::start_request(deck.id, "cram")).await;
    let session_id = session["id"].as_str().unwrap().to_string();

    let response = server
        .post(&format!("/api/sessions/{session_id}/abandon"))
        .add_header(AUTHORIZATION, auth.clone())
        .await;
    response.assert_status_ok();
    let session: Value = response.json();
    assert_eq!(session["status"], "abandoned");
    assert!(session.get("summary").is_none());

    let response = server
        .post(&format!("/api/sessions/{session_id}/answers"))
        .add_header(AUTHORIZATION, auth.clone())
        .json(&fixtures::answer_request(cards[0], 4))
        .await;
    response.assert_status(StatusCode::CONFLICT);

    let response = server
        .get("/api/sessions")
        .add_header(AUTHORIZATION, auth)
        .await;
    assert_eq!(response.json::<Value>()["sessions"].as_array().unwrap().len(), 0);
}

/// Test sessions are private to the user who started them.
#[tokio::test]
async fn test_session_hidden_from_other_user() {
    let ctx = TestContext::new();
    let server = server(&ctx);
    let (user_id, token) = ctx.create_test_user(None).await;
    let (_, other_token) = ctx.create_test_user(None).await;
    let deck = ctx.create_test_deck(user_id, 1).await;

    let session = start_session(&server, &token, fixtures::start_request(deck.id, "cram")).await;
    let session_id = session["id"].as_str().unwrap().to_string();

    let response = server
        .get(&format!("/api/sessions/{session_id}"))
        .add_header(AUTHORIZATION, TestContext::auth_header_value(&other_token))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);
}

/// Test an unknown session id is reported as not found.
#[tokio::test]
async fn test_unknown_session() {
    let ctx = TestContext::new();
    let server = server(&ctx);
    let (_, token) = ctx.create_test_user(None).await;

    let response = server
        .get(&format!("/api/sessions/{}", uuid::Uuid::new_v4()))
        .add_header(AUTHORIZATION, TestContext::auth_header_value(&token))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["error"], "session_not_found");
}
