//! Application state for the web layer.

use std::sync::Arc;

use crate::broadcast::ChannelBroadcaster;
use crate::daemon::Clock;
use crate::schedule::ScheduleTable;
use crate::shapes::ShapeSet;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// The loaded schedule, shared with the daemon
    pub table: Arc<ScheduleTable>,

    /// Route geometry for the map; empty when no shapes file was found
    pub shapes: Arc<ShapeSet>,

    /// Event channel; each WebSocket connection subscribes to it
    pub broadcaster: ChannelBroadcaster,

    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(
        table: Arc<ScheduleTable>,
        shapes: Arc<ShapeSet>,
        broadcaster: ChannelBroadcaster,
        clock: impl Clock,
    ) -> Self {
        Self {
            table,
            shapes,
            broadcaster,
            clock: Arc::new(clock),
        }
    }
}
