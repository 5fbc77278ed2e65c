//! User registration

use axum::{extract::State, Json};

use crate::error::Result;
use crate::models::{RegisterRequest, RegisterResponse};
use crate::AppState;

/// POST /api/users/register
/// Creates a user and returns its bearer token
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<Option<RegisterRequest>>,
) -> Result<Json<RegisterResponse>> {
    let name = payload.and_then(|p| p.name);
    let user = state
        .with_manager(move |manager| Ok(manager.store().create_user(name.as_deref())?))
        .await?;

    tracing::info!("Registered new user: {}", user.id);

    Ok(Json(RegisterResponse {
        user_id: user.id,
        token: user.token,
    }))
}
