//! The top-level wire format: delivery channel + envelope wrapper.
//!
//! Every frame on the wire is one `ClientEnvelope` (client → server) or one
//! `ServerEnvelope` (server → client). Each carries one JSON event object.

use serde::{Deserialize, Serialize};

use crate::events::{ClientEvent, ServerEvent};

/// The delivery guarantee for a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub enum Channel {
    /// Delivered in order, no loss. The default, and what every game-state
    /// transition, chat line, and score update uses.
    #[default]
    ReliableOrdered,

    /// Delivered (no loss), but may arrive out of order.
    ReliableUnordered,

    /// May be lost, may arrive out of order. Used for high-frequency,
    /// low-importance events such as individual `draw_op` stroke points
    /// when a batch is large.
    Unreliable,
}

/// Adjacently-tagged payload: either a framework-level system message or a
/// game event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ClientPayload {
    System(crate::system::ClientSystemMessage),
    Game(ClientEvent),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ServerPayload {
    System(crate::system::ServerSystemMessage),
    Game(ServerEvent),
}

/// The top-level client → server message wrapper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientEnvelope {
    /// Client-maintained sequence number.
    pub seq: u64,
    /// Client-local timestamp in milliseconds.
    pub timestamp: u64,
    #[serde(default)]
    pub channel: Channel,
    pub payload: ClientPayload,
}

/// The top-level server → client message wrapper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerEnvelope {
    /// Server-maintained sequence number, per connection.
    pub seq: u64,
    /// Milliseconds since the server process started.
    pub timestamp: u64,
    #[serde(default)]
    pub channel: Channel,
    pub payload: ServerPayload,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_default_is_reliable_ordered() {
        assert_eq!(Channel::default(), Channel::ReliableOrdered);
    }

    #[test]
    fn test_channel_serializes_as_pascal_case() {
        let json = serde_json::to_string(&Channel::Unreliable).unwrap();
        assert_eq!(json, "\"Unreliable\"");
    }

    #[test]
    fn test_client_envelope_missing_channel_defaults() {
        let json = r#"{"seq":1,"timestamp":0,"payload":{"type":"System","data":{"type":"heartbeat","client_time":0}}}"#;
        let env: ClientEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(env.channel, Channel::ReliableOrdered);
    }
}
