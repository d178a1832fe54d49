//! Immutable snapshots of a game after each move.

use chrono::{DateTime, Utc};
use derive_getters::Getters;
use derive_new::new;
use serde::{Deserialize, Serialize};
use tictactoe_engine::{Board, BoardPosition, PlayStatus};

/// The line that decided a game and who completed it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, new)]
pub struct WinningLine {
    /// Player who completed the line.
    player_id: String,
    /// The three positions of the line.
    locations: [BoardPosition; 3],
}

/// Snapshot of a game at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct GameState {
    /// Board contents.
    game_board: Board,
    /// Lifecycle status.
    play_status: PlayStatus,
    /// Player whose move produced this state.
    id_of_player_who_made_move: Option<String>,
    /// Player expected to move next; `None` once the game is over.
    current_player_id: Option<String>,
    /// Set only when `play_status` is `EndedInWin`.
    winner: Option<WinningLine>,
    /// When this state was recorded.
    created_at: DateTime<Utc>,
}

impl GameState {
    /// Empty board, nobody to move.
    pub fn not_started() -> Self {
        Self {
            game_board: Board::new(),
            play_status: PlayStatus::NotStarted,
            id_of_player_who_made_move: None,
            current_player_id: None,
            winner: None,
            created_at: Utc::now(),
        }
    }

    /// Empty board with `first_player_id` to move.
    pub fn started(first_player_id: impl Into<String>) -> Self {
        Self {
            play_status: PlayStatus::InProgress,
            current_player_id: Some(first_player_id.into()),
            ..Self::not_started()
        }
    }

    /// State after `mover_id` produced `board`.
    pub(crate) fn after_move(
        board: Board,
        play_status: PlayStatus,
        mover_id: &str,
        next_player_id: Option<String>,
        winner: Option<WinningLine>,
    ) -> Self {
        Self {
            game_board: board,
            play_status,
            id_of_player_who_made_move: Some(mover_id.to_string()),
            current_player_id: next_player_id,
            winner,
            created_at: Utc::now(),
        }
    }
}
