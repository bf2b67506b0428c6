use axum::{extract::State, Json};
use tracing::{info, instrument};

use crate::dtos::session::{LoginRequest, SessionResponse};
use crate::error::AppError;
use crate::state::AppState;

// POST /session - Mark an admin as signed in
#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let username = payload.username.trim();
    if username.is_empty() {
        return Err(AppError::validation("Username required"));
    }

    state.storage.start_session(username).await?;
    info!(username, "Admin signed in");

    Ok(Json(SessionResponse { logged_in: true, username: Some(username.to_string()) }))
}

// GET /session
pub async fn current(State(state): State<AppState>) -> Result<Json<SessionResponse>, AppError> {
    let username = state.storage.session_user().await?;
    Ok(Json(SessionResponse { logged_in: username.is_some(), username }))
}

// DELETE /session
#[instrument(skip(state))]
pub async fn logout(State(state): State<AppState>) -> Result<Json<SessionResponse>, AppError> {
    state.storage.end_session().await?;
    Ok(Json(SessionResponse { logged_in: false, username: None }))
}
