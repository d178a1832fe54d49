//! Game endpoints.

use super::AppState;
use super::extract::ApiJson;
use crate::error::GameError;
use crate::models::{EndGameParams, GameState, GameTurnParams, TurnResponse, validate_path_id};
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use tracing::{debug, instrument};
use validator::Validate;

/// `POST /games/{game_id}/turns`
#[instrument(skip(state, params))]
pub async fn take_turn(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
    ApiJson(params): ApiJson<GameTurnParams>,
) -> Result<Json<TurnResponse>, GameError> {
    validate_path_id("game_id", &game_id)?;
    params.validate()?;
    debug!(player_id = %params.player_id, destination = %params.destination, "Turn requested");
    let response = state
        .registry
        .take_turn(
            &game_id,
            &params.player_id,
            params.destination,
            params.session_id.as_deref(),
        )
        .await?;
    Ok(Json(response))
}

/// `GET /games/{game_id}/turns/latest`
#[instrument(skip(state))]
pub async fn get_latest_turn(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
) -> Result<Json<TurnResponse>, GameError> {
    validate_path_id("game_id", &game_id)?;
    Ok(Json(state.registry.latest_turn(&game_id).await?))
}

/// `GET /games/{game_id}/turns`
#[instrument(skip(state))]
pub async fn get_turn_history(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
) -> Result<Json<Vec<GameState>>, GameError> {
    validate_path_id("game_id", &game_id)?;
    Ok(Json(state.registry.turn_history(&game_id).await?))
}

/// `DELETE /games/{game_id}`
#[instrument(skip(state, params))]
pub async fn end_game(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
    ApiJson(params): ApiJson<EndGameParams>,
) -> Result<StatusCode, GameError> {
    validate_path_id("game_id", &game_id)?;
    params.validate()?;
    state
        .registry
        .end_game(&game_id, &params.player_id, &params.session_id)
        .await?;
    Ok(StatusCode::OK)
}
