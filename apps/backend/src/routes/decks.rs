//! Deck endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use srs_core::{AccessControl, DeckId, StudyError};

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::routes::auth::AuthenticatedUser;
use crate::AppState;

/// GET /api/decks
pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<DeckListResponse>> {
    let decks = state
        .with_manager(move |manager| Ok(manager.store().decks_for_user(auth.user_id)?))
        .await?;
    Ok(Json(DeckListResponse { decks }))
}

/// POST /api/decks
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(payload): Json<CreateDeckRequest>,
) -> Result<(StatusCode, Json<DeckResponse>)> {
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::BadRequest("Deck name is required".to_string()));
    }

    let deck = state
        .with_manager(move |manager| {
            let store = manager.store();
            let deck = store.create_deck(auth.user_id, &name, &payload.cards)?;
            let cards = store.cards(deck.id)?;
            Ok(DeckResponse {
                id: deck.id,
                name: deck.name,
                owner_id: deck.owner_id,
                cards,
            })
        })
        .await?;

    tracing::info!(deck_id = deck.id, cards = deck.cards.len(), "Created deck");
    Ok((StatusCode::CREATED, Json(deck)))
}

/// GET /api/decks/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(deck_id): Path<DeckId>,
) -> Result<Json<DeckResponse>> {
    let deck = state
        .with_manager(move |manager| {
            let store = manager.store();
            let deck = store
                .deck(deck_id)?
                .ok_or_else(|| ApiError::NotFound(format!("deck {deck_id}")))?;
            if !store.can_access_deck(auth.user_id, deck_id)? {
                return Err(StudyError::AccessDenied {
                    user_id: auth.user_id,
                    deck_id,
                }
                .into());
            }
            Ok(DeckResponse {
                id: deck.id,
                name: deck.name,
                owner_id: deck.owner_id,
                cards: store.cards(deck_id)?,
            })
        })
        .await?;
    Ok(Json(deck))
}

/// POST /api/decks/:id/access
/// Owner shares the deck with another user
pub async fn grant_access(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(deck_id): Path<DeckId>,
    Json(payload): Json<GrantAccessRequest>,
) -> Result<StatusCode> {
    state
        .with_manager(move |manager| {
            let store = manager.store();
            let deck = store
                .deck(deck_id)?
                .ok_or_else(|| ApiError::NotFound(format!("deck {deck_id}")))?;
            if deck.owner_id != auth.user_id {
                return Err(StudyError::AccessDenied {
                    user_id: auth.user_id,
                    deck_id,
                }
                .into());
            }
            if !store.user_exists(payload.user_id)? {
                return Err(ApiError::NotFound(format!("user {}", payload.user_id)));
            }
            store.grant_access(payload.user_id, deck_id)?;
            Ok(())
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/decks/:id/due
pub async fn due(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(deck_id): Path<DeckId>,
    Query(query): Query<DueCardsQuery>,
) -> Result<Json<DueCards>> {
    let due = state
        .with_manager(move |manager| {
            let limit = query.limit.unwrap_or(manager.settings().review_limit);
            Ok(manager.due_cards(auth.user_id, deck_id, limit, Utc::now())?)
        })
        .await?;
    Ok(Json(due))
}
