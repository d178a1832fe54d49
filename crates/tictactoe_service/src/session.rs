//! The gaming session aggregate: players, readiness, and the current game.

use crate::error::GameError;
use crate::events::{EventKind, SessionEvent};
use crate::game::{Game, GameMode, TurnResult};
use crate::models::{EventPlaneConfig, Player};
use chrono::{DateTime, Utc};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tictactoe_engine::{AutomatedPlayer, BoardPosition, Piece, SkillLevel};
use tracing::{debug, error, info, instrument, warn};

/// How many retired game ids a session remembers; older ones are forgotten.
pub const RETIRED_GAMES_KEPT: usize = 16;

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
pub enum SessionPhase {
    /// Created; readiness for the next game not yet complete.
    AwaitingSecondPlayer,
    /// Everyone the next game needs is bound and ready.
    Ready,
    /// A game is accepting moves.
    GameInProgress,
    /// Torn down.
    Ended,
}

/// A gaming session owned by its initiating player.
///
/// The initiating player always holds X. The second seat, another human or
/// the automated player, holds O.
#[derive(Debug, Getters)]
pub struct GamingSession {
    /// Unique id.
    session_id: String,
    /// Six-digit code other players join with.
    invitation_code: String,
    /// Event plane details handed to clients.
    event_plane_config: EventPlaneConfig,
    /// Session owner.
    initiating_player: Player,
    /// Second human, once joined.
    other_player: Option<Player>,
    #[getter(skip)]
    automated_opponent: Option<(Player, AutomatedPlayer)>,
    #[getter(skip)]
    current_game: Option<Game>,
    /// Ids of the most recent games torn down in this session, oldest first.
    retired_game_ids: Vec<String>,
    #[getter(skip)]
    forgotten_game_ids: Vec<String>,
    #[getter(skip)]
    players_ready: HashSet<String>,
    #[getter(skip)]
    ended: bool,
    /// Time of the last mutation.
    last_activity: DateTime<Utc>,
    #[getter(skip)]
    pending: Vec<EventKind>,
}

impl GamingSession {
    /// Creates a session owned by a new human player named `owner_name`.
    #[instrument(skip(event_plane_config))]
    pub fn new(
        session_id: String,
        owner_name: &str,
        invitation_code: String,
        event_plane_config: EventPlaneConfig,
    ) -> Self {
        info!("Creating gaming session");
        Self {
            session_id,
            invitation_code,
            event_plane_config,
            initiating_player: Player::human(owner_name),
            other_player: None,
            automated_opponent: None,
            current_game: None,
            retired_game_ids: Vec::new(),
            forgotten_game_ids: Vec::new(),
            players_ready: HashSet::new(),
            ended: false,
            last_activity: Utc::now(),
            pending: Vec::new(),
        }
    }

    /// Whether the session has been torn down.
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Derived lifecycle phase.
    pub fn phase(&self) -> SessionPhase {
        if self.ended {
            SessionPhase::Ended
        } else if self.current_game.as_ref().is_some_and(Game::is_in_progress) {
            SessionPhase::GameInProgress
        } else if self.all_players_ready() {
            SessionPhase::Ready
        } else {
            SessionPhase::AwaitingSecondPlayer
        }
    }

    /// The player in the second seat: the other human, else the automated player.
    pub fn second_seat(&self) -> Option<&Player> {
        self.other_player
            .as_ref()
            .or(self.automated_opponent.as_ref().map(|(player, _)| player))
    }

    /// Whether `player_id` is one of the session's humans.
    pub fn has_player(&self, player_id: &str) -> bool {
        self.initiating_player.player_id() == player_id
            || self
                .other_player
                .as_ref()
                .is_some_and(|p| p.player_id() == player_id)
    }

    /// Whether everyone the next game needs has signalled readiness.
    pub fn all_players_ready(&self) -> bool {
        let owner_ready = self.players_ready.contains(self.initiating_player.player_id());
        match &self.other_player {
            Some(other) => owner_ready && self.players_ready.contains(other.player_id()),
            None => owner_ready,
        }
    }

    /// Binds a second human.
    ///
    /// Refused while a single-player game is in progress. A finished
    /// single-player game is retired and the automated opponent released.
    #[instrument(skip(self), fields(session_id = %self.session_id))]
    pub fn join(&mut self, player_name: &str) -> Result<&Player, GameError> {
        self.ensure_active()?;
        if self.initiating_player.display_name() == player_name {
            warn!("Display name already used by the session owner");
            return Err(GameError::NameConflict);
        }
        if self.other_player.is_some() {
            warn!("Session already has a second player");
            return Err(GameError::illegal_state("session already has two players"));
        }
        if self.automated_opponent.is_some() {
            if self.current_game.as_ref().is_some_and(Game::is_in_progress) {
                warn!("Single-player game in progress");
                return Err(GameError::illegal_state(
                    "a single-player game is in progress",
                ));
            }
            self.retire_current_game();
            self.automated_opponent = None;
            debug!("Automated opponent released for joining player");
        }

        let player = Player::human(player_name);
        info!(player_id = %player.player_id(), "Player joined session");
        self.pending.push(EventKind::PlayerAddedToSession);
        self.touch();
        Ok(self.other_player.insert(player))
    }

    /// Marks `player_id` ready. Returns whether all required players are ready.
    #[instrument(skip(self), fields(session_id = %self.session_id))]
    pub fn note_readiness(&mut self, player_id: &str) -> Result<bool, GameError> {
        self.ensure_active()?;
        if !self.has_player(player_id) {
            return Err(GameError::PlayerNotFound);
        }
        self.players_ready.insert(player_id.to_string());
        self.touch();
        let all_ready = self.all_players_ready();
        debug!(all_ready, "Readiness noted");
        Ok(all_ready)
    }

    /// Starts a game against the automated player, superseding any current game.
    #[instrument(skip(self, automated_name), fields(session_id = %self.session_id))]
    pub fn create_single_player_game(
        &mut self,
        skill: SkillLevel,
        automated_name: &str,
        seed: Option<u64>,
    ) -> Result<&Game, GameError> {
        self.ensure_active()?;
        if self.other_player.is_some() {
            return Err(GameError::illegal_state(
                "a second player has joined; start a two-player game instead",
            ));
        }
        if !self.players_ready.contains(self.initiating_player.player_id()) {
            return Err(GameError::illegal_state("the session owner is not ready"));
        }

        let engine = match seed {
            Some(seed) => AutomatedPlayer::with_seed(skill, seed),
            None => AutomatedPlayer::new(skill),
        };
        let mut opponent = Player::automated(automated_name);
        opponent.assign_piece(Piece::O);
        self.automated_opponent = Some((opponent.clone(), engine));

        self.start_game(GameMode::SinglePlayer, opponent);
        self.play_automated_turns();
        self.current_game
            .as_ref()
            .ok_or(GameError::GameNotFound)
    }

    /// Starts a game between the two humans, superseding any current game.
    #[instrument(skip(self), fields(session_id = %self.session_id))]
    pub fn create_two_player_game(&mut self) -> Result<&Game, GameError> {
        self.ensure_active()?;
        let Some(other) = self.other_player.clone() else {
            return Err(GameError::illegal_state(
                "a two-player game needs a second player",
            ));
        };
        if !self.all_players_ready() {
            return Err(GameError::illegal_state("not all players are ready"));
        }

        self.automated_opponent = None;
        self.start_game(GameMode::TwoPlayer, other);
        self.current_game
            .as_ref()
            .ok_or(GameError::GameNotFound)
    }

    fn start_game(&mut self, mode: GameMode, mut second: Player) {
        self.retire_current_game();

        self.initiating_player.assign_piece(Piece::X);
        second.assign_piece(Piece::O);
        if let Some(other) = self.other_player.as_mut() {
            other.assign_piece(Piece::O);
        }

        let mut game = Game::new(
            &self.session_id,
            mode,
            self.initiating_player.clone(),
            second,
        );
        self.pending.extend(game.take_events());
        self.current_game = Some(game);
        self.touch();
    }

    /// Marks `player_id` ready and returns the current game.
    #[instrument(skip(self), fields(session_id = %self.session_id))]
    pub fn join_current_game(&mut self, player_id: &str) -> Result<&Game, GameError> {
        self.ensure_active()?;
        if !self.has_player(player_id) {
            return Err(GameError::PlayerNotFound);
        }
        if self.current_game.is_none() {
            return Err(GameError::GameNotFound);
        }
        self.players_ready.insert(player_id.to_string());
        self.touch();
        self.current_game()
    }

    /// The game currently bound to the session.
    pub fn current_game(&self) -> Result<&Game, GameError> {
        self.current_game.as_ref().ok_or(GameError::GameNotFound)
    }

    /// Looks up the current game by id.
    pub fn game(&self, game_id: &str) -> Result<&Game, GameError> {
        self.current_game
            .as_ref()
            .filter(|game| game.game_id() == game_id)
            .ok_or(GameError::GameNotFound)
    }

    /// Applies a human move, then any automated replies it triggers.
    #[instrument(skip(self), fields(session_id = %self.session_id))]
    pub fn take_turn(
        &mut self,
        game_id: &str,
        player_id: &str,
        position: BoardPosition,
    ) -> Result<TurnResult, GameError> {
        self.ensure_active()?;
        if self.retired_game_ids.iter().any(|id| id == game_id) {
            return Err(GameError::GameNotInProgress);
        }
        let game = self
            .current_game
            .as_mut()
            .filter(|game| game.game_id() == game_id)
            .ok_or(GameError::GameNotFound)?;

        game.take_turn(player_id, position)?;
        self.pending.extend(game.take_events());
        self.play_automated_turns();
        self.touch();

        Ok(self.game(game_id)?.latest_turn())
    }

    /// Lets the automated player move for as long as it is the one to move.
    fn play_automated_turns(&mut self) {
        let (Some(game), Some((opponent, engine))) =
            (self.current_game.as_mut(), self.automated_opponent.as_mut())
        else {
            return;
        };

        while game.is_in_progress()
            && game.current_state().current_player_id().as_deref() == Some(opponent.player_id().as_str())
        {
            let Some(position) = engine.choose_move(game.current_state().game_board()) else {
                break;
            };
            if let Err(e) = game.take_turn(opponent.player_id(), position) {
                error!(error = %e, %position, "Automated move rejected");
                break;
            }
            debug!(%position, "Automated player moved");
        }
        self.pending.extend(game.take_events());
    }

    /// Tears down `game_id`. Ending a game that was already torn down is a no-op.
    #[instrument(skip(self), fields(session_id = %self.session_id))]
    pub fn end_game(&mut self, game_id: &str, player_id: &str) -> Result<(), GameError> {
        if !self.has_player(player_id) {
            return Err(GameError::PlayerNotFound);
        }
        if self.retired_game_ids.iter().any(|id| id == game_id) {
            debug!("Game already ended");
            return Ok(());
        }
        let game = self.game(game_id)?;
        if game.player(player_id).is_none() {
            warn!("Player is not part of this game");
            return Err(GameError::PlayerNotFound);
        }
        self.retire_current_game();
        self.touch();
        Ok(())
    }

    /// Tears the session down on behalf of `player_id`. Only the owner may do this.
    #[instrument(skip(self), fields(session_id = %self.session_id))]
    pub fn end(&mut self, player_id: &str) -> Result<(), GameError> {
        if self.initiating_player.player_id() != player_id {
            if self.has_player(player_id) {
                warn!("Non-owner tried to end the session");
                return Err(GameError::NotSessionOwner);
            }
            return Err(GameError::PlayerNotFound);
        }
        self.teardown();
        Ok(())
    }

    /// Tears the session down regardless of who asks.
    #[instrument(skip(self), fields(session_id = %self.session_id))]
    pub fn expire(&mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if self.ended {
            return;
        }
        self.retire_current_game();
        self.automated_opponent = None;
        self.ended = true;
        self.pending.push(EventKind::SessionDeleted);
        info!("Gaming session ended");
    }

    fn retire_current_game(&mut self) {
        if let Some(mut game) = self.current_game.take() {
            game.end();
            self.pending.extend(game.take_events());
            self.retired_game_ids.push(game.game_id().to_string());
            if self.retired_game_ids.len() > RETIRED_GAMES_KEPT {
                let forgotten = self.retired_game_ids.remove(0);
                self.forgotten_game_ids.push(forgotten);
            }
        }
    }

    fn ensure_active(&self) -> Result<(), GameError> {
        if self.ended {
            Err(GameError::SessionNotFound)
        } else {
            Ok(())
        }
    }

    fn touch(&mut self) {
        self.last_activity = Utc::now();
    }

    /// Removes and returns the ids of retired games that fell out of
    /// [`GamingSession::retired_game_ids`].
    pub fn take_forgotten_game_ids(&mut self) -> Vec<String> {
        std::mem::take(&mut self.forgotten_game_ids)
    }

    /// Removes and returns recorded events, addressed to this session's topics.
    pub fn take_events(&mut self) -> Vec<SessionEvent> {
        let topic_prefix = &self.event_plane_config.topic_prefix;
        self.pending
            .drain(..)
            .map(|kind| SessionEvent::new(self.session_id.clone(), topic_prefix.clone(), kind))
            .collect()
    }
}
