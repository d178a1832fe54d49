//! Tic-tac-toe gaming service.
//!
//! # Architecture
//!
//! - **Registry**: live gaming sessions, each behind its own lock
//! - **Session / Game**: aggregates enforcing readiness, turn order and teardown
//! - **Events**: per-session notifications fanned out over a broadcast channel,
//!   optionally bridged to an MQTT broker
//! - **API**: axum router exposing the HTTP+JSON surface under `/v1`
//!
//! # Example
//!
//! ```no_run
//! use tictactoe_service::{AppState, EventPublisher, ServiceConfig, SessionRegistry, build_router};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ServiceConfig::default();
//! let publisher = EventPublisher::new(*config.event_plane().channel_capacity());
//! let registry = SessionRegistry::new(&config, publisher);
//! let app = build_router(AppState::new(registry));
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:50020").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod api;
mod cli;
mod config;
mod error;
mod events;
mod game;
mod models;
mod mqtt;
mod registry;
mod session;

pub use api::{AppState, build_router};
pub use cli::{Cli, Command};
pub use config::{
    AutomatedPlayerSettings, ConfigError, EventPlaneSettings, HttpConfig, ServiceConfig,
    SessionSettings,
};
pub use error::{EventError, GameError};
pub use events::{EventKind, EventPublisher, EventSink, SessionEvent};
pub use game::{Game, GameMode, TurnResult};
pub use models::{
    EndGameParams, EndGamingSessionParams, EventPlaneConfig, GameCreationResponse,
    GameInfoResponse, GameState, GameTurnParams, GamingSessionCreationResponse,
    JoinSessionParams, NewGamingSessionParams, NewSinglePlayerGameParams, Player,
    PlayersReadinessResponse, TurnResponse, WinningLine,
};
pub use mqtt::MqttSink;
pub use registry::SessionRegistry;
pub use session::{GamingSession, RETIRED_GAMES_KEPT, SessionPhase};
