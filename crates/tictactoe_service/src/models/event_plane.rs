//! Connection details clients use to subscribe to a session's events.

use serde::{Deserialize, Serialize};

/// Where and under which topic prefix a session publishes its events.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EventPlaneConfig {
    /// Broker host name.
    pub broker_address: String,
    /// Broker port.
    pub broker_port: u16,
    /// Channel id; the session id.
    pub channel_id: String,
    /// Prefix shared by every topic of the session.
    pub topic_prefix: String,
}

impl EventPlaneConfig {
    /// Builds the config for one session, deriving the topic prefix from `topic_domain`.
    pub fn new(
        broker_address: impl Into<String>,
        broker_port: u16,
        topic_domain: &str,
        session_id: &str,
    ) -> Self {
        Self {
            broker_address: broker_address.into(),
            broker_port,
            channel_id: session_id.to_string(),
            topic_prefix: format!("{topic_domain}/Channels/{session_id}"),
        }
    }
}
