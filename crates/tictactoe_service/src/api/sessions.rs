//! Gaming session endpoints.

use super::AppState;
use super::extract::ApiJson;
use crate::error::GameError;
use crate::models::{
    EndGamingSessionParams, GameCreationResponse, GamingSessionCreationResponse,
    JoinSessionParams, NewGamingSessionParams, NewSinglePlayerGameParams,
    PlayersReadinessResponse, validate_path_id,
};
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use tracing::{info, instrument};
use validator::Validate;

/// `POST /gaming-sessions`
#[instrument(skip(state, params))]
pub async fn create_gaming_session(
    State(state): State<AppState>,
    ApiJson(params): ApiJson<NewGamingSessionParams>,
) -> Result<Json<GamingSessionCreationResponse>, GameError> {
    params.validate()?;
    let response = state
        .registry
        .create_session(params.session_owner_display_name.trim())
        .await?;
    info!(session_id = %response.session_id, "Gaming session created");
    Ok(Json(response))
}

/// `POST /gaming-sessions/players`
#[instrument(skip(state, params))]
pub async fn join_gaming_session(
    State(state): State<AppState>,
    ApiJson(params): ApiJson<JoinSessionParams>,
) -> Result<Json<GamingSessionCreationResponse>, GameError> {
    params.validate()?;
    let response = state
        .registry
        .join_session(
            &params.game_invitation_code,
            params.player_display_name.trim(),
        )
        .await?;
    Ok(Json(response))
}

/// `PUT /gaming-sessions/{session_id}/players/{player_id}/readiness`
#[instrument(skip(state))]
pub async fn note_player_readiness(
    State(state): State<AppState>,
    Path((session_id, player_id)): Path<(String, String)>,
) -> Result<Json<PlayersReadinessResponse>, GameError> {
    validate_path_id("session_id", &session_id)?;
    validate_path_id("player_id", &player_id)?;
    let response = state
        .registry
        .note_readiness(&session_id, &player_id)
        .await?;
    Ok(Json(response))
}

/// `POST /gaming-sessions/{session_id}/games`
#[instrument(skip(state, params))]
pub async fn create_single_player_game(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    ApiJson(params): ApiJson<NewSinglePlayerGameParams>,
) -> Result<Json<GameCreationResponse>, GameError> {
    validate_path_id("session_id", &session_id)?;
    let response = state
        .registry
        .create_single_player_game(&session_id, params.computer_skill_level)
        .await?;
    Ok(Json(response))
}

/// `POST /gaming-sessions/{session_id}/two-player-games`
#[instrument(skip(state))]
pub async fn create_two_player_game(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<GameCreationResponse>, GameError> {
    validate_path_id("session_id", &session_id)?;
    let response = state.registry.create_two_player_game(&session_id).await?;
    Ok(Json(response))
}

/// `PUT /gaming-sessions/{session_id}/current_game/players/{player_id}`
#[instrument(skip(state))]
pub async fn join_current_game(
    State(state): State<AppState>,
    Path((session_id, player_id)): Path<(String, String)>,
) -> Result<Json<GameCreationResponse>, GameError> {
    validate_path_id("session_id", &session_id)?;
    validate_path_id("player_id", &player_id)?;
    let response = state
        .registry
        .join_current_game(&session_id, &player_id)
        .await?;
    Ok(Json(response))
}

/// `GET /gaming-sessions/{session_id}/current-game`
#[instrument(skip(state))]
pub async fn get_current_game(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<GameCreationResponse>, GameError> {
    validate_path_id("session_id", &session_id)?;
    let response = state.registry.current_game(&session_id).await?;
    Ok(Json(response))
}

/// `DELETE /gaming-sessions/{session_id}`
#[instrument(skip(state, params))]
pub async fn end_gaming_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    ApiJson(params): ApiJson<EndGamingSessionParams>,
) -> Result<StatusCode, GameError> {
    validate_path_id("session_id", &session_id)?;
    params.validate()?;
    state
        .registry
        .end_session(&session_id, &params.player_id)
        .await?;
    Ok(StatusCode::OK)
}
