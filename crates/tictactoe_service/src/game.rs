//! The game aggregate: one tic-tac-toe match between two bound players.

use crate::error::GameError;
use crate::events::EventKind;
use crate::models::{GameState, Player, WinningLine};
use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use tictactoe_engine::{BoardPosition, Outcome, Piece, PlayStatus, apply_move, evaluate};
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Whether the second seat is a human or the automated player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum GameMode {
    /// Human against the automated player.
    SinglePlayer,
    /// Two humans.
    TwoPlayer,
}

/// What a turn produced, as seen by API callers.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnResult {
    /// The state after the turn.
    pub state: GameState,
    /// The player to move next, if the game continues.
    pub current_player: Option<Player>,
    /// The winner, if the game ended in a win.
    pub winning_player: Option<Player>,
}

/// A single game.
///
/// State machine: `NotStarted → InProgress → {EndedInWin | EndedInStalemate}`.
/// A game begins as soon as it is created, since both seats are always bound.
#[derive(Debug, Clone)]
pub struct Game {
    game_id: String,
    session_id: String,
    mode: GameMode,
    players: [Player; 2],
    current_state: GameState,
    state_history: Vec<GameState>,
    ended: bool,
    events: Vec<EventKind>,
}

impl Game {
    /// Creates and starts a game. `first` holds X and moves first; `second` holds O.
    #[instrument(skip(first, second), fields(first = %first.player_id(), second = %second.player_id()))]
    pub fn new(session_id: &str, mode: GameMode, mut first: Player, mut second: Player) -> Self {
        first.assign_piece(Piece::X);
        second.assign_piece(Piece::O);

        let mut game = Self {
            game_id: Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            mode,
            current_state: GameState::not_started(),
            players: [first, second],
            state_history: Vec::new(),
            ended: false,
            events: Vec::new(),
        };
        game.begin();
        game
    }

    fn begin(&mut self) {
        let first_id = self.players[0].player_id().clone();
        self.current_state = GameState::started(first_id);
        self.events.push(EventKind::GameStarted);
        info!(game_id = %self.game_id, mode = %self.mode, "Game started");
    }

    /// Unique id.
    pub fn game_id(&self) -> &str {
        &self.game_id
    }

    /// Session the game belongs to.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Single- or two-player.
    pub fn mode(&self) -> GameMode {
        self.mode
    }

    /// Both players, X holder first.
    pub fn players(&self) -> &[Player; 2] {
        &self.players
    }

    /// Latest state.
    pub fn current_state(&self) -> &GameState {
        &self.current_state
    }

    /// One state per applied move, oldest first.
    pub fn history(&self) -> &[GameState] {
        &self.state_history
    }

    /// When the latest state was recorded.
    pub fn last_activity(&self) -> DateTime<Utc> {
        *self.current_state.created_at()
    }

    /// Whether the game has been torn down.
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Whether moves are currently accepted.
    pub fn is_in_progress(&self) -> bool {
        !self.ended && *self.current_state.play_status() == PlayStatus::InProgress
    }

    /// Looks up a player of this game.
    pub fn player(&self, player_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.player_id() == player_id)
    }

    /// The player expected to move, if any.
    pub fn current_player(&self) -> Option<&Player> {
        self.current_state
            .current_player_id()
            .as_deref()
            .and_then(|id| self.player(id))
    }

    /// Applies a move for `player_id`.
    ///
    /// Rejections leave the game untouched and are checked in this order:
    /// not in progress, unknown player, off-board position, out of turn, occupied square.
    #[instrument(skip(self), fields(game_id = %self.game_id))]
    pub fn take_turn(
        &mut self,
        player_id: &str,
        position: BoardPosition,
    ) -> Result<TurnResult, GameError> {
        if !self.is_in_progress() {
            warn!("Move on a game that is not in progress");
            return Err(GameError::GameNotInProgress);
        }
        let player = self.player(player_id).ok_or_else(|| {
            warn!("Move by a player outside this game");
            GameError::PlayerNotFound
        })?;
        if !position.is_in_range() {
            return Err(GameError::InvalidBoardPosition);
        }
        if self.current_state.current_player_id().as_deref() != Some(player_id) {
            warn!("Player moved out of turn");
            return Err(GameError::WrongPlayerTakingTurn);
        }
        let board = *self.current_state.game_board();
        if !board.is_empty(position) {
            return Err(GameError::PositionOccupied);
        }

        let piece = (*player.game_piece()).ok_or(GameError::PlayerNotFound)?;
        let board = apply_move(&board, position, piece)?;
        let outcome = evaluate(&board);

        let (next_player_id, winner) = match &outcome {
            Outcome::InProgress => (self.opponent_id(player_id), None),
            Outcome::Win(details) => (
                None,
                Some(WinningLine::new(player_id.to_string(), details.locations)),
            ),
            Outcome::Stalemate => (None, None),
        };
        let state = GameState::after_move(
            board,
            PlayStatus::from(&outcome),
            player_id,
            next_player_id,
            winner,
        );
        self.state_history.push(state.clone());
        self.current_state = state;

        self.events.push(EventKind::TurnTaken);
        match outcome {
            Outcome::Win(_) => {
                info!(winner = %player_id, "Game ended in a win");
                self.events.push(EventKind::GameEndedInWin);
            }
            Outcome::Stalemate => {
                info!("Game ended in a stalemate");
                self.events.push(EventKind::GameEndedInStalemate);
            }
            Outcome::InProgress => {}
        }

        Ok(self.latest_turn())
    }

    /// The latest state with the players it names.
    pub fn latest_turn(&self) -> TurnResult {
        let winning_player = self
            .current_state
            .winner()
            .as_ref()
            .and_then(|line| self.player(line.player_id()))
            .cloned();
        TurnResult {
            state: self.current_state.clone(),
            current_player: self.current_player().cloned(),
            winning_player,
        }
    }

    /// Tears the game down. Returns `false` when it had already ended.
    #[instrument(skip(self), fields(game_id = %self.game_id))]
    pub fn end(&mut self) -> bool {
        if self.ended {
            return false;
        }
        self.ended = true;
        self.events.push(EventKind::GameDeleted);
        info!("Game ended");
        true
    }

    /// Removes and returns the events recorded since the last call.
    pub(crate) fn take_events(&mut self) -> Vec<EventKind> {
        std::mem::take(&mut self.events)
    }

    fn opponent_id(&self, player_id: &str) -> Option<String> {
        self.players
            .iter()
            .find(|p| p.player_id() != player_id)
            .map(|p| p.player_id().clone())
    }
}
