//! Wire and domain data shapes shared by the aggregates and the API.

mod event_plane;
mod game_state;
mod player;
mod requests;
mod responses;

pub use event_plane::EventPlaneConfig;
pub use game_state::{GameState, WinningLine};
pub use player::Player;
pub use requests::{
    EndGameParams, EndGamingSessionParams, GameTurnParams, JoinSessionParams,
    NewGamingSessionParams, NewSinglePlayerGameParams, validate_path_id,
};
pub use responses::{
    GameCreationResponse, GameInfoResponse, GamingSessionCreationResponse,
    PlayersReadinessResponse, TurnResponse,
};
