//! Study session endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use srs_core::{Answer, SessionId, SessionSummary};

use crate::error::Result;
use crate::models::*;
use crate::routes::auth::AuthenticatedUser;
use crate::AppState;

/// POST /api/sessions
pub async fn start(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(payload): Json<StartRequest>,
) -> Result<(StatusCode, Json<SessionResponse>)> {
    let session = state
        .with_manager(move |manager| Ok(manager.start(auth.user_id, &payload, Utc::now())?))
        .await?;
    Ok((StatusCode::CREATED, Json(SessionResponse::from(&session))))
}

/// GET /api/sessions
/// Sessions still active or on a break
pub async fn list_active(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<SessionListResponse>> {
    let sessions = state
        .with_manager(move |manager| Ok(manager.active_sessions(auth.user_id)?))
        .await?;
    Ok(Json(SessionListResponse {
        sessions: sessions.iter().map(SessionResponse::from).collect(),
    }))
}

/// GET /api/sessions/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(session_id): Path<SessionId>,
) -> Result<Json<SessionResponse>> {
    let session = state
        .with_manager(move |manager| Ok(manager.get(auth.user_id, session_id)?))
        .await?;
    Ok(Json(SessionResponse::from(&session)))
}

/// POST /api/sessions/:id/answers
pub async fn answer(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(session_id): Path<SessionId>,
    Json(payload): Json<SubmitAnswerRequest>,
) -> Result<Json<ProgressSnapshot>> {
    let answer = Answer {
        card_id: payload.card_id,
        quality: payload.quality,
        response_time_ms: payload.response_time_ms,
        submitted_at: Utc::now(),
    };
    let snapshot = state
        .with_manager(move |manager| Ok(manager.answer(auth.user_id, session_id, &answer)?))
        .await?;
    Ok(Json(snapshot))
}

/// POST /api/sessions/:id/break
pub async fn take_break(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(session_id): Path<SessionId>,
) -> Result<Json<SessionResponse>> {
    let session = state
        .with_manager(move |manager| Ok(manager.take_break(auth.user_id, session_id, Utc::now())?))
        .await?;
    Ok(Json(SessionResponse::from(&session)))
}

/// POST /api/sessions/:id/resume
pub async fn resume(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(session_id): Path<SessionId>,
) -> Result<Json<SessionResponse>> {
    let session = state
        .with_manager(move |manager| Ok(manager.resume(auth.user_id, session_id, Utc::now())?))
        .await?;
    Ok(Json(SessionResponse::from(&session)))
}

/// POST /api/sessions/:id/complete
pub async fn complete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(session_id): Path<SessionId>,
) -> Result<Json<SessionSummary>> {
    let summary = state
        .with_manager(move |manager| Ok(manager.complete(auth.user_id, session_id, Utc::now())?))
        .await?;
    Ok(Json(summary))
}

/// POST /api/sessions/:id/abandon
pub async fn abandon(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(session_id): Path<SessionId>,
) -> Result<Json<SessionResponse>> {
    let session = state
        .with_manager(move |manager| Ok(manager.abandon(auth.user_id, session_id, Utc::now())?))
        .await?;
    Ok(Json(SessionResponse::from(&session)))
}
