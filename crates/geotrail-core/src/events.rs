//! Session event system.
//!
//! Every [`RouteSession`](crate::RouteSession) owns an [`EventDispatcher`]
//! that broadcasts [`SessionEvent`]s to any number of subscribers. Events are
//! fire-and-forget: a session never waits for receivers and a lagging
//! receiver only loses its own backlog.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use geotrail_types::{PositionSample, RouteDate};

use crate::error::{PositionError, PositionErrorKind};

/// Events emitted by a tracking session.
///
/// All events are serializable for logging and IPC.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new event types
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum SessionEvent {
    /// Tracking started; the point buffer was reset.
    Started { owner: String },
    /// Tracking stopped; `points` were kept.
    Stopped { owner: String, points: usize },
    /// A sample was appended. `index` is its position in the route.
    Sample {
        index: usize,
        sample: PositionSample,
    },
    /// The position source reported a failure; tracking continues.
    SourceError {
        kind: PositionErrorKind,
        message: String,
    },
    /// The point buffer was emptied.
    Cleared { discarded: usize },
    /// A route was accepted by the backend.
    Uploaded {
        date: RouteDate,
        point_count: usize,
        replaced: bool,
    },
}

impl SessionEvent {
    pub(crate) fn source_error(error: &PositionError) -> Self {
        Self::SourceError {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// Sender for session events.
pub type EventSender = broadcast::Sender<SessionEvent>;

/// Receiver for session events.
pub type EventReceiver = broadcast::Receiver<SessionEvent>;

/// Event dispatcher for sending events to multiple receivers.
#[derive(Debug, Clone)]
pub struct EventDispatcher {
    sender: EventSender,
}

impl EventDispatcher {
    /// Create a new event dispatcher.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribe to events.
    pub fn subscribe(&self) -> EventReceiver {
        self.sender.subscribe()
    }

    /// Send an event.
    pub fn send(&self, event: SessionEvent) {
        // No receivers is fine
        let _ = self.sender.send(event);
    }

    /// Get the number of active receivers.
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new(256)
    }
}
