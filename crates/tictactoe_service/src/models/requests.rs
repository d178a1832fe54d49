//! Request bodies accepted by the API, with their validation rules.

use crate::error::GameError;
use serde::{Deserialize, Serialize};
use tictactoe_engine::{BoardPosition, SkillLevel};
use validator::{Validate, ValidationError};

/// Longest accepted id.
const ID_LENGTH_MAX: u64 = 36;

/// Longest accepted display name, after trimming.
const NAME_LENGTH_MAX: usize = 40;

/// Body of `POST /gaming-sessions`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewGamingSessionParams {
    /// Display name of the player creating the session.
    #[validate(custom(function = "validate_display_name"))]
    pub session_owner_display_name: String,
}

/// Body of `POST /gaming-sessions/players`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct JoinSessionParams {
    /// Invitation code shared by the session owner.
    #[validate(length(equal = 6))]
    pub game_invitation_code: String,
    /// Display name of the joining player.
    #[validate(custom(function = "validate_display_name"))]
    pub player_display_name: String,
}

/// Body of `POST /gaming-sessions/{session_id}/games`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSinglePlayerGameParams {
    /// How well the automated opponent plays.
    pub computer_skill_level: SkillLevel,
}

/// Body of `POST /games/{game_id}/turns`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GameTurnParams {
    /// Where to place the piece.
    #[serde(alias = "position")]
    pub destination: BoardPosition,
    /// Player making the move.
    #[validate(length(min = 1, max = 36))]
    pub player_id: String,
    /// Session owning the game; checked against the game when present.
    #[serde(default)]
    #[validate(length(min = 1, max = 36))]
    pub session_id: Option<String>,
}

/// Body of `DELETE /games/{game_id}`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EndGameParams {
    /// Player ending the game.
    #[validate(length(min = 1, max = 36))]
    pub player_id: String,
    /// Session owning the game.
    #[validate(length(min = 1, max = 36))]
    pub session_id: String,
}

/// Body of `DELETE /gaming-sessions/{session_id}`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EndGamingSessionParams {
    /// Player ending the session.
    #[validate(length(min = 1, max = 36))]
    pub player_id: String,
}

fn validate_display_name(name: &str) -> Result<(), ValidationError> {
    let length = name.trim().chars().count();
    if (1..=NAME_LENGTH_MAX).contains(&length) {
        Ok(())
    } else {
        Err(ValidationError::new("display_name_length"))
    }
}

/// Checks an id taken from the URL path.
pub fn validate_path_id(name: &str, value: &str) -> Result<(), GameError> {
    let length = value.chars().count() as u64;
    if (1..=ID_LENGTH_MAX).contains(&length) {
        Ok(())
    } else {
        Err(GameError::validation(format!(
            "{name} must be between 1 and {ID_LENGTH_MAX} characters"
        )))
    }
}
