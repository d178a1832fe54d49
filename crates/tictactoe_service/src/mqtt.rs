//! MQTT bridge: forwards session events to a broker.

use crate::config::EventPlaneSettings;
use crate::error::EventError;
use crate::events::{EventSink, SessionEvent};
use async_trait::async_trait;
use rumqttc::{AsyncClient, EventLoop, MqttOptions, QoS};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, trace, warn};
use uuid::Uuid;

const MIN_KEEP_ALIVE: Duration = Duration::from_secs(5);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Publishes each event as an empty message on its topic, at most once.
#[derive(Debug, Clone)]
pub struct MqttSink {
    client: AsyncClient,
}

impl MqttSink {
    /// Creates the client and spawns the task driving its connection.
    ///
    /// Must be called from within a tokio runtime.
    #[instrument(skip(settings), fields(broker = %settings.broker_address(), port = settings.broker_port()))]
    pub fn connect(settings: &EventPlaneSettings) -> (Self, JoinHandle<()>) {
        let client_id = format!("tictactoe-service-{}", Uuid::new_v4());
        let mut options = MqttOptions::new(
            client_id,
            settings.broker_address().clone(),
            *settings.broker_port(),
        );
        let keep_alive = Duration::from_secs(*settings.keep_alive_secs()).max(MIN_KEEP_ALIVE);
        options.set_keep_alive(keep_alive);

        let (client, event_loop) = AsyncClient::new(options, *settings.channel_capacity());
        let driver = tokio::spawn(drive_event_loop(event_loop));
        info!("MQTT client created");
        (Self { client }, driver)
    }
}

/// Polls the connection forever, backing off while the broker is unreachable.
async fn drive_event_loop(mut event_loop: EventLoop) {
    let mut backoff = Duration::from_secs(1);
    loop {
        match event_loop.poll().await {
            Ok(notification) => {
                trace!(?notification, "MQTT event");
                backoff = Duration::from_secs(1);
            }
            Err(e) => {
                warn!(error = %e, retry_in = ?backoff, "MQTT connection error");
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(MAX_BACKOFF);
            }
        }
    }
}

#[async_trait]
impl EventSink for MqttSink {
    async fn deliver(&self, event: &SessionEvent) -> Result<(), EventError> {
        let topic = event.topic();
        self.client
            .try_publish(topic.clone(), QoS::AtMostOnce, false, Vec::<u8>::new())
            .map_err(|e| EventError::Transient {
                reason: e.to_string(),
            })?;
        debug!(topic = %topic, "Event handed to MQTT client");
        Ok(())
    }
}
