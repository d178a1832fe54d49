//! HTTP API: router, shared state and handlers.

mod extract;
mod games;
mod sessions;

use crate::registry::SessionRegistry;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use tower_http::trace::TraceLayer;

/// State shared by every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Live sessions and games.
    pub registry: SessionRegistry,
}

impl AppState {
    /// Wraps a registry.
    pub fn new(registry: SessionRegistry) -> Self {
        Self { registry }
    }
}

/// Builds the versioned API router.
pub fn build_router(state: AppState) -> Router {
    let v1 = Router::new()
        .route("/health", get(health))
        .route("/gaming-sessions", post(sessions::create_gaming_session))
        .route("/gaming-sessions/players", post(sessions::join_gaming_session))
        .route(
            "/gaming-sessions/{session_id}",
            delete(sessions::end_gaming_session),
        )
        .route(
            "/gaming-sessions/{session_id}/players/{player_id}/readiness",
            put(sessions::note_player_readiness),
        )
        .route(
            "/gaming-sessions/{session_id}/games",
            post(sessions::create_single_player_game),
        )
        .route(
            "/gaming-sessions/{session_id}/two-player-games",
            post(sessions::create_two_player_game),
        )
        .route(
            "/gaming-sessions/{session_id}/current_game/players/{player_id}",
            put(sessions::join_current_game),
        )
        .route(
            "/gaming-sessions/{session_id}/current-game",
            get(sessions::get_current_game),
        )
        .route(
            "/games/{game_id}",
            delete(games::end_game),
        )
        .route(
            "/games/{game_id}/turns",
            post(games::take_turn).get(games::get_turn_history),
        )
        .route("/games/{game_id}/turns/latest", get(games::get_latest_turn));

    Router::new()
        .nest("/v1", v1)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Liveness check.
async fn health() -> Json<&'static str> {
    Json("Up")
}
