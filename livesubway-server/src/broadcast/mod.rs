//! Publish/subscribe channel for events pushed to connected clients.
//!
//! Emitters (the schedule daemon, the heartbeat) publish without waiting for
//! delivery; each WebSocket connection holds its own subscription. Delivery
//! is best-effort: a slow subscriber may miss events, and publishing with no
//! subscribers connected is reported but harmless.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast;

use crate::domain::Trip;

/// Default number of events buffered per subscriber.
pub const DEFAULT_CAPACITY: usize = 64;

/// Largest per-subscriber buffer a channel is created with.
pub const MAX_CAPACITY: usize = 65_536;

/// Payload of the periodic keepalive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Heartbeat {
    /// Local time the heartbeat was sent, ISO 8601
    pub sent_at: String,
}

/// An event pushed to subscribers.
///
/// Serializes as `{"event": "<name>", "data": <payload>}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "lowercase")]
pub enum Event {
    /// Trips departing together at a boundary, in schedule order
    Schedule(Vec<Trip>),

    /// Keepalive, unrelated to departures
    Update(Heartbeat),
}

impl Event {
    /// Event name as seen by clients.
    pub fn name(&self) -> &'static str {
        match self {
            Event::Schedule(_) => "schedule",
            Event::Update(_) => "update",
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Error from a publish attempt.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BroadcastError {
    /// Nobody is subscribed; the event was dropped
    #[error("no subscribers connected, {event} event dropped")]
    NoSubscribers { event: &'static str },
}

/// Something that fans events out to subscribers.
///
/// Publishing never blocks and never waits for acknowledgement.
pub trait Broadcaster: Send + Sync + 'static {
    /// Publish an event, returning how many subscribers it was queued for.
    fn publish(&self, event: Event) -> Result<usize, BroadcastError>;
}

/// [`Broadcaster`] backed by a tokio broadcast channel.
///
/// Cheap to clone; every clone publishes into the same channel, so several
/// emitters can run concurrently.
#[derive(Debug, Clone)]
pub struct ChannelBroadcaster {
    sender: broadcast::Sender<Arc<Event>>,
}

impl ChannelBroadcaster {
    /// Create a channel buffering up to `capacity` events per subscriber,
    /// clamped to `1..=MAX_CAPACITY`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.clamp(1, MAX_CAPACITY));
        Self { sender }
    }

    /// Open a new subscription, receiving events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<Event>> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ChannelBroadcaster {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl Broadcaster for ChannelBroadcaster {
    fn publish(&self, event: Event) -> Result<usize, BroadcastError> {
        let name = event.name();
        self.sender
            .send(Arc::new(event))
            .map_err(|_| BroadcastError::NoSubscribers { event: name })
    }
}
