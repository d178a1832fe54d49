//! Response bodies returned by the API.

use crate::game::{Game, TurnResult};
use crate::models::{EventPlaneConfig, GameState, Player};
use crate::session::GamingSession;
use serde::{Deserialize, Serialize};
use tictactoe_engine::BoardPosition;

/// A session as seen right after it was created or joined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GamingSessionCreationResponse {
    /// How to subscribe to the session's events.
    pub event_plane_config: EventPlaneConfig,
    /// Player who created the session.
    pub initiating_player: Player,
    /// Code other players use to join.
    pub invitation_code: String,
    /// Second human, once joined.
    pub other_player: Option<Player>,
    /// Session id.
    pub session_id: String,
}

impl From<&GamingSession> for GamingSessionCreationResponse {
    fn from(session: &GamingSession) -> Self {
        Self {
            event_plane_config: session.event_plane_config().clone(),
            initiating_player: session.initiating_player().clone(),
            invitation_code: session.invitation_code().clone(),
            other_player: session.other_player().clone(),
            session_id: session.session_id().clone(),
        }
    }
}

/// A game and its latest state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameInfoResponse {
    /// Player expected to move.
    pub current_player: Option<Player>,
    /// Game id.
    pub game_id: String,
    /// Latest state.
    pub game_state: GameState,
    /// Both players, X holder first.
    pub players: Vec<Player>,
}

impl From<&Game> for GameInfoResponse {
    fn from(game: &Game) -> Self {
        Self {
            current_player: game.current_player().cloned(),
            game_id: game.game_id().to_string(),
            game_state: game.current_state().clone(),
            players: game.players().to_vec(),
        }
    }
}

/// A game together with the session it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameCreationResponse {
    /// The game.
    pub game_info: GameInfoResponse,
    /// Session owner.
    pub initiating_player: Player,
    /// Second seat of the session: the other human or the automated player.
    pub other_player: Option<Player>,
    /// Session id.
    pub session_id: String,
}

impl GameCreationResponse {
    /// Describes `game` within `session`.
    pub fn new(session: &GamingSession, game: &Game) -> Self {
        Self {
            game_info: GameInfoResponse::from(game),
            initiating_player: session.initiating_player().clone(),
            other_player: session.second_seat().cloned(),
            session_id: session.session_id().clone(),
        }
    }
}

/// Whether everyone the next game needs has signalled readiness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayersReadinessResponse {
    /// All required players are ready.
    pub all_players_are_ready: bool,
}

/// Outcome of a turn, or the latest turn of a game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnResponse {
    /// Player expected to move next.
    pub current_player: Option<Player>,
    /// State after the turn.
    pub new_game_state: GameState,
    /// The completed line, when the game was won.
    pub winning_locations: Option<Vec<BoardPosition>>,
    /// The winner, when the game was won.
    pub winning_player: Option<Player>,
}

impl From<TurnResult> for TurnResponse {
    fn from(turn: TurnResult) -> Self {
        let winning_locations = turn
            .state
            .winner()
            .as_ref()
            .map(|line| line.locations().to_vec());
        Self {
            current_player: turn.current_player,
            new_game_state: turn.state,
            winning_locations,
            winning_player: turn.winning_player,
        }
    }
}
