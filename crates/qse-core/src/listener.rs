//! Listener capability for channel event fan-out.

use crate::events::ChannelEvent;

/// Handle identifying a registered listener, returned by `add_listener` and
/// consumed by `remove_listener`.
///
/// Ids are assigned monotonically per channel and never reused, so a stale id
/// removal is a harmless no-op.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Receives fan-out notifications from an engine channel.
///
/// Callbacks run on the channel's reader task, not on the thread that opened
/// the channel; implementations must not block for long and must be
/// thread-safe. Registering the same listener twice is allowed and yields two
/// notifications per event.
pub trait ChannelListener: Send + Sync {
    /// Called once per channel event, in registration order across listeners.
    fn on_event(&self, event: &ChannelEvent);
}

/// Closures can be registered directly as listeners.
impl<F> ChannelListener for F
where
    F: Fn(&ChannelEvent) + Send + Sync,
{
    fn on_event(&self, event: &ChannelEvent) {
        self(event);
    }
}
