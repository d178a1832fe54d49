//! Registry of live gaming sessions and the games they own.
//!
//! Locking rules:
//! - Each session sits behind its own `RwLock`; there is no lock spanning sessions.
//! - The directory lock is never held while waiting on a session lock. A session
//!   lock may be held while briefly taking the directory lock.
//! - Events are drained and published while the session lock is held, after the
//!   mutation has committed, so each session's events go out in commit order.

use crate::config::ServiceConfig;
use crate::error::GameError;
use crate::events::{EventPublisher, SessionEvent};
use crate::models::{
    EventPlaneConfig, GameCreationResponse, GameState, GamingSessionCreationResponse,
    PlayersReadinessResponse, TurnResponse,
};
use crate::session::GamingSession;
use chrono::{DateTime, Utc};
use rand::Rng;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tictactoe_engine::{BoardPosition, SkillLevel};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

type SessionHandle = Arc<RwLock<GamingSession>>;

/// Upper bound on remembered ended session ids, whatever their age.
const MAX_TOMBSTONES: usize = 100_000;

/// Indexes over live sessions.
#[derive(Debug, Default)]
struct Directory {
    sessions: HashMap<String, SessionHandle>,
    invitations: HashMap<String, String>,
    games: HashMap<String, String>,
    ended: HashMap<String, DateTime<Utc>>,
    ended_order: VecDeque<String>,
}

impl Directory {
    fn unlink(&mut self, session: &GamingSession, tombstone_ttl: chrono::Duration) {
        let session_id = session.session_id();
        self.sessions.remove(session_id);
        self.invitations.remove(session.invitation_code());
        self.games.retain(|_, owner| owner != session_id);

        let now = Utc::now();
        if self.ended.insert(session_id.clone(), now).is_none() {
            self.ended_order.push_back(session_id.clone());
        }
        self.prune_tombstones(now, tombstone_ttl);
    }

    /// Forgets tombstones older than `ttl`, then the oldest beyond [`MAX_TOMBSTONES`].
    fn prune_tombstones(&mut self, now: DateTime<Utc>, ttl: chrono::Duration) {
        while let Some(oldest) = self.ended_order.front() {
            let expired = self
                .ended
                .get(oldest)
                .is_none_or(|ended_at| now - *ended_at >= ttl);
            if !expired && self.ended_order.len() <= MAX_TOMBSTONES {
                break;
            }
            if let Some(session_id) = self.ended_order.pop_front() {
                self.ended.remove(&session_id);
            }
        }
    }

    fn forget_games(&mut self, game_ids: &[String]) {
        for game_id in game_ids {
            self.games.remove(game_id);
        }
    }

    fn fresh_invitation_code(&self) -> String {
        let mut rng = rand::thread_rng();
        loop {
            let code = rng.gen_range(100_000..=999_999).to_string();
            if !self.invitations.contains_key(&code) {
                return code;
            }
        }
    }
}

/// Settings the registry copies out of [`ServiceConfig`].
#[derive(Debug, Clone)]
struct RegistrySettings {
    broker_address: String,
    broker_port: u16,
    topic_domain: String,
    automated_name: String,
    automated_seed: Option<u64>,
    tombstone_ttl: chrono::Duration,
}

/// Creates, finds, mutates and retires gaming sessions.
#[derive(Debug, Clone)]
pub struct SessionRegistry {
    directory: Arc<RwLock<Directory>>,
    publisher: EventPublisher,
    settings: Arc<RegistrySettings>,
}

impl SessionRegistry {
    /// Creates an empty registry publishing through `publisher`.
    #[instrument(skip(config, publisher))]
    pub fn new(config: &ServiceConfig, publisher: EventPublisher) -> Self {
        let event_plane = config.event_plane();
        let automated = config.automated_player();
        let tombstone_ttl = chrono::Duration::from_std(config.sessions().tombstone_ttl())
            .unwrap_or(chrono::Duration::MAX);
        info!("Creating session registry");
        Self {
            directory: Arc::new(RwLock::new(Directory::default())),
            publisher,
            settings: Arc::new(RegistrySettings {
                broker_address: event_plane.broker_address().clone(),
                broker_port: *event_plane.broker_port(),
                topic_domain: event_plane.topic_domain().clone(),
                automated_name: automated.display_name().clone(),
                automated_seed: *automated.seed(),
                tombstone_ttl,
            }),
        }
    }

    /// The publisher events go out through.
    pub fn publisher(&self) -> &EventPublisher {
        &self.publisher
    }

    /// Number of live sessions.
    pub async fn session_count(&self) -> usize {
        self.directory.read().await.sessions.len()
    }

    /// Number of ended session ids still remembered.
    pub async fn tombstone_count(&self) -> usize {
        self.directory.read().await.ended.len()
    }

    /// Number of game ids that still resolve to a session.
    pub async fn indexed_game_count(&self) -> usize {
        self.directory.read().await.games.len()
    }

    /// Creates a session owned by a new player named `owner_name`.
    #[instrument(skip(self))]
    pub async fn create_session(
        &self,
        owner_name: &str,
    ) -> Result<GamingSessionCreationResponse, GameError> {
        let mut directory = self.directory.write().await;

        let session_id = Uuid::new_v4().to_string();
        let invitation_code = directory.fresh_invitation_code();
        let event_plane = EventPlaneConfig::new(
            self.settings.broker_address.clone(),
            self.settings.broker_port,
            &self.settings.topic_domain,
            &session_id,
        );
        let session = GamingSession::new(
            session_id.clone(),
            owner_name,
            invitation_code.clone(),
            event_plane,
        );
        let response = GamingSessionCreationResponse::from(&session);

        directory.invitations.insert(invitation_code, session_id.clone());
        directory
            .sessions
            .insert(session_id.clone(), Arc::new(RwLock::new(session)));
        info!(session_id = %session_id, "Gaming session registered");
        Ok(response)
    }

    /// Binds a second human to the session behind `invitation_code`.
    #[instrument(skip(self))]
    pub async fn join_session(
        &self,
        invitation_code: &str,
        player_name: &str,
    ) -> Result<GamingSessionCreationResponse, GameError> {
        let session_id = {
            let directory = self.directory.read().await;
            directory
                .invitations
                .get(invitation_code)
                .cloned()
                .ok_or(GameError::InvitationCodeNotFound)?
        };
        self.mutate(&session_id, |session| {
            session.join(player_name)?;
            Ok(GamingSessionCreationResponse::from(&*session))
        })
        .await
    }

    /// Marks a player ready.
    #[instrument(skip(self))]
    pub async fn note_readiness(
        &self,
        session_id: &str,
        player_id: &str,
    ) -> Result<PlayersReadinessResponse, GameError> {
        self.mutate(session_id, |session| {
            let all_players_are_ready = session.note_readiness(player_id)?;
            Ok(PlayersReadinessResponse {
                all_players_are_ready,
            })
        })
        .await
    }

    /// Starts a game against the automated player.
    #[instrument(skip(self))]
    pub async fn create_single_player_game(
        &self,
        session_id: &str,
        skill: SkillLevel,
    ) -> Result<GameCreationResponse, GameError> {
        let settings = Arc::clone(&self.settings);
        self.mutate_indexing_game(session_id, move |session| {
            session.create_single_player_game(
                skill,
                &settings.automated_name,
                settings.automated_seed,
            )?;
            Ok(())
        })
        .await
    }

    /// Starts a game between the session's two humans.
    #[instrument(skip(self))]
    pub async fn create_two_player_game(
        &self,
        session_id: &str,
    ) -> Result<GameCreationResponse, GameError> {
        self.mutate_indexing_game(session_id, |session| {
            session.create_two_player_game()?;
            Ok(())
        })
        .await
    }

    /// Marks a player ready and returns the current game.
    #[instrument(skip(self))]
    pub async fn join_current_game(
        &self,
        session_id: &str,
        player_id: &str,
    ) -> Result<GameCreationResponse, GameError> {
        self.mutate(session_id, |session| {
            session.join_current_game(player_id)?;
            let game = session.current_game()?;
            Ok(GameCreationResponse::new(&*session, game))
        })
        .await
    }

    /// The session's current game.
    #[instrument(skip(self))]
    pub async fn current_game(&self, session_id: &str) -> Result<GameCreationResponse, GameError> {
        let handle = self.session_handle(session_id).await?;
        let session = handle.read().await;
        if session.is_ended() {
            return Err(GameError::SessionNotFound);
        }
        let game = session.current_game()?;
        Ok(GameCreationResponse::new(&session, game))
    }

    /// Ends a session on behalf of its owner. Ending an ended session succeeds.
    #[instrument(skip(self))]
    pub async fn end_session(&self, session_id: &str, player_id: &str) -> Result<(), GameError> {
        let handle = match self.live_or_ended(session_id).await? {
            Some(handle) => handle,
            None => {
                debug!("Session already ended");
                return Ok(());
            }
        };

        let mut session = handle.write().await;
        let already_ended = session.is_ended();
        session.end(player_id)?;
        if !already_ended {
            self.directory
                .write()
                .await
                .unlink(&session, self.settings.tombstone_ttl);
        }
        self.publish_all(session.take_events());
        info!("Gaming session removed");
        Ok(())
    }

    /// Applies a move to a game, including any automated reply.
    #[instrument(skip(self))]
    pub async fn take_turn(
        &self,
        game_id: &str,
        player_id: &str,
        position: BoardPosition,
        session_id: Option<&str>,
    ) -> Result<TurnResponse, GameError> {
        let owner = self.game_owner(game_id, session_id).await?;
        self.mutate(&owner, |session| {
            let turn = session.take_turn(game_id, player_id, position)?;
            Ok(TurnResponse::from(turn))
        })
        .await
    }

    /// The latest turn of a game.
    #[instrument(skip(self))]
    pub async fn latest_turn(&self, game_id: &str) -> Result<TurnResponse, GameError> {
        let owner = self.game_owner(game_id, None).await?;
        let handle = self.session_handle(&owner).await?;
        let session = handle.read().await;
        Ok(TurnResponse::from(session.game(game_id)?.latest_turn()))
    }

    /// Every state of a game, one per move, oldest first.
    #[instrument(skip(self))]
    pub async fn turn_history(&self, game_id: &str) -> Result<Vec<GameState>, GameError> {
        let owner = self.game_owner(game_id, None).await?;
        let handle = self.session_handle(&owner).await?;
        let session = handle.read().await;
        Ok(session.game(game_id)?.history().to_vec())
    }

    /// Tears a game down. Ending an ended game, or one in an ended session, succeeds.
    #[instrument(skip(self))]
    pub async fn end_game(
        &self,
        game_id: &str,
        player_id: &str,
        session_id: &str,
    ) -> Result<(), GameError> {
        if self.live_or_ended(session_id).await?.is_none() {
            debug!("Session already ended");
            return Ok(());
        }
        let owner = self.game_owner(game_id, Some(session_id)).await?;
        self.mutate(&owner, |session| session.end_game(game_id, player_id))
            .await
    }

    /// Ends every session idle for at least `ttl`. Returns how many sessions were evicted.
    #[instrument(skip(self))]
    pub async fn evict_idle(&self, ttl: Duration) -> usize {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
        let now = Utc::now();

        let handles: Vec<SessionHandle> = {
            let mut directory = self.directory.write().await;
            directory.prune_tombstones(now, self.settings.tombstone_ttl);
            directory.sessions.values().cloned().collect()
        };

        let mut evicted = 0;
        for handle in handles {
            let mut session = handle.write().await;
            if session.is_ended() || now - *session.last_activity() < ttl {
                continue;
            }
            session.expire();
            self.directory
                .write()
                .await
                .unlink(&session, self.settings.tombstone_ttl);
            self.publish_all(session.take_events());
            evicted += 1;
        }

        if evicted > 0 {
            info!(evicted, "Evicted idle sessions");
        }
        evicted
    }

    /// Runs [`SessionRegistry::evict_idle`] every `interval` on a background task.
    #[instrument(skip(self))]
    pub fn spawn_cleanup(&self, interval: Duration, ttl: Duration) -> JoinHandle<()> {
        let registry = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                registry.evict_idle(ttl).await;
            }
        })
    }

    async fn session_handle(&self, session_id: &str) -> Result<SessionHandle, GameError> {
        let directory = self.directory.read().await;
        directory.sessions.get(session_id).cloned().ok_or_else(|| {
            debug!(session_id, "Session not found");
            GameError::SessionNotFound
        })
    }

    /// `Some` for a live session, `None` for a tombstoned one.
    async fn live_or_ended(&self, session_id: &str) -> Result<Option<SessionHandle>, GameError> {
        let directory = self.directory.read().await;
        if let Some(handle) = directory.sessions.get(session_id) {
            Ok(Some(Arc::clone(handle)))
        } else if directory.ended.contains_key(session_id) {
            Ok(None)
        } else {
            Err(GameError::SessionNotFound)
        }
    }

    async fn game_owner(
        &self,
        game_id: &str,
        expected_session: Option<&str>,
    ) -> Result<String, GameError> {
        let directory = self.directory.read().await;
        let owner = directory.games.get(game_id).ok_or_else(|| {
            debug!(game_id, "Game not found");
            GameError::GameNotFound
        })?;
        match expected_session {
            Some(expected) if expected != owner => {
                warn!(game_id, expected, "Game belongs to a different session");
                Err(GameError::GameNotFound)
            }
            _ => Ok(owner.clone()),
        }
    }

    /// Runs `f` under the session's write lock, then settles what it recorded.
    async fn mutate<T>(
        &self,
        session_id: &str,
        f: impl FnOnce(&mut GamingSession) -> Result<T, GameError>,
    ) -> Result<T, GameError> {
        let handle = self.session_handle(session_id).await?;
        let mut session = handle.write().await;
        let result = f(&mut *session);
        self.settle(&mut *session).await;
        result
    }

    /// Like [`Self::mutate`] for operations that start a game; indexes the new game.
    async fn mutate_indexing_game(
        &self,
        session_id: &str,
        f: impl FnOnce(&mut GamingSession) -> Result<(), GameError>,
    ) -> Result<GameCreationResponse, GameError> {
        let handle = self.session_handle(session_id).await?;
        let mut session = handle.write().await;
        let result = f(&mut *session).and_then(|()| {
            let game = session.current_game()?;
            Ok((
                game.game_id().to_string(),
                GameCreationResponse::new(&session, game),
            ))
        });
        if let Ok((game_id, _)) = &result {
            self.directory
                .write()
                .await
                .games
                .insert(game_id.clone(), session.session_id().clone());
        }
        self.settle(&mut *session).await;
        result.map(|(_, response)| response)
    }

    /// Drops forgotten game ids from the index and publishes recorded events.
    /// Called with the session's write lock held.
    async fn settle(&self, session: &mut GamingSession) {
        let forgotten = session.take_forgotten_game_ids();
        if !forgotten.is_empty() {
            self.directory.write().await.forget_games(&forgotten);
        }
        self.publish_all(session.take_events());
    }

    fn publish_all(&self, events: Vec<SessionEvent>) {
        for event in events {
            self.publisher.publish(event);
        }
    }
}
