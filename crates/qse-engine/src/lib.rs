//! Persistent WebSocket channel to the analytics engine.
//!
//! Opens the connection over the mutual-TLS trust context, identifies as the
//! privileged internal engine user, and fans out lifecycle and message events
//! to registered listeners. Payloads are JSON-RPC envelopes carried as text
//! frames, opaque to this crate.

mod channel;
mod registry;

pub use channel::{EngineChannel, EngineConfig};
pub use registry::ListenerRegistry;

pub use qse_core::events::{ChannelEvent, ChannelState};
pub use qse_core::listener::{ChannelListener, ListenerId};
