//! Error types for sessions, games and the event plane.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use derive_more::{Display, Error};
use tictactoe_engine::RulesError;
use tracing::{debug, warn};

/// Errors surfaced to API callers.
///
/// Every variant maps to exactly one HTTP status; see [`GameError::status_code`].
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum GameError {
    /// No live gaming session with the given id.
    #[display("Gaming session not found")]
    SessionNotFound,
    /// No game with the given id.
    #[display("Game not found")]
    GameNotFound,
    /// No live gaming session uses the given invitation code.
    #[display("Invitation code not found")]
    InvitationCodeNotFound,
    /// The player is not part of the session or game.
    #[display("Player not found")]
    PlayerNotFound,
    /// The display name is already used in the session.
    #[display("Display name is already in use in this session")]
    NameConflict,
    /// A player moved out of turn.
    #[display("It is not this player's turn")]
    WrongPlayerTakingTurn,
    /// The target square is already taken.
    #[display("Board position is already occupied")]
    PositionOccupied,
    /// The session is not in a state that allows the operation.
    #[display("Operation not allowed: {reason}")]
    IllegalState {
        /// What made the operation illegal.
        reason: String,
    },
    /// The game has ended or has not started.
    #[display("Game is not in progress")]
    GameNotInProgress,
    /// The position lies off the board.
    #[display("Invalid board position")]
    InvalidBoardPosition,
    /// The request failed input validation.
    #[display("Invalid request: {reason}")]
    Validation {
        /// Which input was rejected.
        reason: String,
    },
    /// Only the session's initiating player may do this.
    #[display("Only the session owner may end the session")]
    NotSessionOwner,
}

impl GameError {
    /// Builds an [`GameError::IllegalState`].
    pub fn illegal_state(reason: impl Into<String>) -> Self {
        Self::IllegalState {
            reason: reason.into(),
        }
    }

    /// Builds a [`GameError::Validation`].
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }

    /// HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            GameError::SessionNotFound
            | GameError::GameNotFound
            | GameError::InvitationCodeNotFound
            | GameError::PlayerNotFound => StatusCode::NOT_FOUND,
            GameError::NameConflict
            | GameError::PositionOccupied
            | GameError::IllegalState { .. } => StatusCode::CONFLICT,
            GameError::WrongPlayerTakingTurn => StatusCode::METHOD_NOT_ALLOWED,
            GameError::GameNotInProgress => StatusCode::NOT_ACCEPTABLE,
            GameError::InvalidBoardPosition | GameError::Validation { .. } => {
                StatusCode::BAD_REQUEST
            }
            GameError::NotSessionOwner => StatusCode::FORBIDDEN,
        }
    }
}

impl From<RulesError> for GameError {
    fn from(err: RulesError) -> Self {
        match err {
            RulesError::OutOfRange(_) => GameError::InvalidBoardPosition,
            RulesError::Occupied(_) => GameError::PositionOccupied,
            RulesError::OutOfTurn(_) => GameError::WrongPlayerTakingTurn,
            RulesError::GameOver => GameError::GameNotInProgress,
        }
    }
}

impl From<validator::ValidationErrors> for GameError {
    fn from(errors: validator::ValidationErrors) -> Self {
        GameError::validation(errors.to_string())
    }
}

impl From<JsonRejection> for GameError {
    fn from(rejection: JsonRejection) -> Self {
        debug!(detail = %rejection.body_text(), "Request body rejected");
        let reason = match rejection {
            JsonRejection::MissingJsonContentType(_) => {
                "expected a JSON body with Content-Type: application/json"
            }
            JsonRejection::JsonSyntaxError(_) => "request body is not valid JSON",
            JsonRejection::JsonDataError(_) => "request body has missing or invalid fields",
            _ => "request body could not be read",
        };
        GameError::validation(reason)
    }
}

impl IntoResponse for GameError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        warn!(status = %status, error = %self, "Request rejected");
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

/// Failures while delivering events to the outside world.
///
/// These never reach API callers: publishers log and drop them.
#[derive(Debug, Clone, Display, Error)]
pub enum EventError {
    /// Delivery failed but may succeed later.
    #[display("Transient event delivery failure: {reason}")]
    Transient {
        /// Underlying cause.
        reason: String,
    },
}
