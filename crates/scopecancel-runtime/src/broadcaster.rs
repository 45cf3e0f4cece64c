//! Fan-out of [`CancelEvent`]s from the registry to observers.
//!
//! Publishing never waits: a receiver that falls more than [`EVENT_BUFFER`]
//! events behind gets `RecvError::Lagged` and resumes from the oldest event
//! still buffered. The termination protocol never depends on delivery.

use scopecancel_core::CancelEvent;
use tokio::sync::broadcast;
use tracing::trace;

/// Events retained per receiver before older ones are overwritten.
pub const EVENT_BUFFER: usize = 64;

/// Publisher side of the registry's event stream.
#[derive(Debug)]
pub struct CancelEventBroadcaster {
    sender: broadcast::Sender<CancelEvent>,
}

impl CancelEventBroadcaster {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_BUFFER);
        Self { sender }
    }

    /// Publish `event`, returning how many receivers it reached.
    ///
    /// With no receivers the event is discarded.
    pub fn broadcast(&self, event: CancelEvent) -> usize {
        if self.sender.receiver_count() == 0 {
            return 0;
        }
        trace!(key = %event.key(), "Publishing cancel event");
        self.sender.send(event).unwrap_or(0)
    }

    /// New receiver that sees every event published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<CancelEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for CancelEventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}
