//! Session event notifications.
//!
//! Aggregates record [`EventKind`]s while they mutate. The registry drains them
//! once the mutation has committed and hands them to the [`EventPublisher`],
//! which fans them out over a broadcast channel to any attached [`EventSink`].

use crate::error::EventError;
use async_trait::async_trait;
use derive_getters::Getters;
use derive_new::new;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Notification names; each is also the last topic segment.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
pub enum EventKind {
    /// A game was torn down.
    GameDeleted,
    /// A game ended with a full board and no line.
    GameEndedInStalemate,
    /// A game ended with a completed line.
    GameEndedInWin,
    /// A game began.
    GameStarted,
    /// A second human joined the session.
    PlayerAddedToSession,
    /// The session was torn down.
    SessionDeleted,
    /// A move was applied.
    TurnTaken,
}

/// One event, addressed to one session's topic space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, new)]
pub struct SessionEvent {
    /// Session the event belongs to.
    session_id: String,
    /// Topic prefix of the session.
    topic_prefix: String,
    /// What happened.
    kind: EventKind,
}

impl SessionEvent {
    /// Full topic: `{topic_prefix}/{kind}`.
    pub fn topic(&self) -> String {
        format!("{}/{}", self.topic_prefix, self.kind)
    }
}

/// Destination for published events, such as a message broker.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Delivers one event. Failures are logged by the caller and never retried.
    async fn deliver(&self, event: &SessionEvent) -> Result<(), EventError>;
}

/// Fire-and-forget fan-out of session events.
#[derive(Debug, Clone)]
pub struct EventPublisher {
    sender: broadcast::Sender<SessionEvent>,
}

impl EventPublisher {
    /// Creates a publisher buffering up to `capacity` events per subscriber.
    #[instrument]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an event. Never blocks and never fails.
    #[instrument(skip(self, event), fields(topic = %event.topic()))]
    pub fn publish(&self, event: SessionEvent) {
        match self.sender.send(event) {
            Ok(receivers) => debug!(receivers, "Event published"),
            Err(_) => debug!("Event dropped, no subscribers"),
        }
    }

    /// Receives every event published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    /// Forwards every future event to `sink` on a background task.
    #[instrument(skip(self, sink))]
    pub fn attach(&self, sink: Arc<dyn EventSink>) -> JoinHandle<()> {
        let mut receiver = self.subscribe();
        info!("Event sink attached");
        tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(event) => {
                        if let Err(e) = sink.deliver(&event).await {
                            warn!(topic = %event.topic(), error = %e, "Event delivery failed");
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Event sink lagged, events dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        info!("Event channel closed, sink detached");
                        break;
                    }
                }
            }
        })
    }
}
