//! Channel lifecycle states and the events fanned out to listeners.

use serde::{Deserialize, Serialize};

/// Connection lifecycle of an engine channel.
///
/// Normal progression is `Disconnected → Connecting → Open → Closing →
/// Closed`; handshake or transport failure short-circuits from `Connecting`
/// or `Open` straight to `Closed`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelState {
    /// No connection attempt has been made yet.
    Disconnected,
    /// WebSocket handshake in flight.
    Connecting,
    /// Handshake complete; messages flow.
    Open,
    /// Local close requested; awaiting the close reply.
    Closing,
    /// Connection is gone, normally or otherwise.
    Closed,
}

/// Events produced by an engine channel and consumed by registered listeners.
///
/// Listener-facing `Error` descriptions are one-line summaries; the full
/// diagnostic detail goes to the tracing sink instead.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChannelEvent {
    /// The WebSocket handshake completed.
    Connected,

    /// A message frame arrived. Payloads are JSON-RPC envelopes, opaque to
    /// this client.
    MessageReceived {
        /// Raw frame payload.
        payload: String,
    },

    /// The connection closed. Emitted exactly once per connection.
    Closed {
        /// WebSocket close code (1000 for a local close with no explicit code).
        code: u16,
        /// Close reason; may be empty.
        reason: String,
        /// True when the peer initiated the close.
        initiated_by_remote: bool,
    },

    /// A transport-level failure occurred.
    Error {
        /// Human-readable summary (no stack traces, no raw cause chains).
        description: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_event_serializes_with_tag() {
        let event = ChannelEvent::Closed {
            code: 1000,
            reason: String::new(),
            initiated_by_remote: false,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "closed");
        assert_eq!(json["code"], 1000);
        assert_eq!(json["initiated_by_remote"], false);
    }

    #[test]
    fn message_received_round_trips() {
        let event = ChannelEvent::MessageReceived {
            payload: r#"{"jsonrpc":"2.0","id":1}"#.into(),
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: ChannelEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn states_are_distinct() {
        assert_ne!(ChannelState::Connecting, ChannelState::Open);
        assert_ne!(ChannelState::Closing, ChannelState::Closed);
    }
}
