//! Players taking part in sessions and games.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use tictactoe_engine::Piece;
use uuid::Uuid;

/// A participant, human or automated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct Player {
    /// Display name chosen by the player.
    display_name: String,
    /// Piece held in the current game; `None` until a game assigns one.
    game_piece: Option<Piece>,
    /// Whether the server plays for this player.
    is_automated: bool,
    /// Unique id.
    player_id: String,
}

impl Player {
    /// Creates a human player with a fresh id.
    pub fn human(display_name: impl Into<String>) -> Self {
        Self::with_kind(display_name, false)
    }

    /// Creates an automated player with a fresh id.
    pub fn automated(display_name: impl Into<String>) -> Self {
        Self::with_kind(display_name, true)
    }

    fn with_kind(display_name: impl Into<String>, is_automated: bool) -> Self {
        Self {
            display_name: display_name.into(),
            game_piece: None,
            is_automated,
            player_id: Uuid::new_v4().to_string(),
        }
    }

    pub(crate) fn assign_piece(&mut self, piece: Piece) {
        self.game_piece = Some(piece);
    }
}
