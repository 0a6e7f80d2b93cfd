//! Schedule loading error types.
//!
//! Every variant is a data-integrity problem found before the daemon starts.
//! None of them are recoverable at runtime.

use std::path::PathBuf;

use crate::domain::{DayType, InvalidTripId, TimeError, TripId};

/// Errors raised while loading, validating or building a schedule table.
#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    /// Schedule file could not be read or written
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Schedule JSON is malformed (includes invalid trip IDs and times)
    #[error("malformed schedule JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Trips within a day are out of order
    #[error("{day} schedule is not sorted: trip {index} ({id}) sorts before its predecessor")]
    Unsorted {
        day: DayType,
        index: usize,
        id: TripId,
    },

    /// A trip ID names a different day type than the partition it was found in
    #[error("{day} schedule contains trip {id} belonging to {found}")]
    WrongDay {
        day: DayType,
        id: TripId,
        found: DayType,
    },

    /// Stop-times feed row could not be read
    #[error("stop times feed: {0}")]
    Feed(#[from] csv::Error),

    /// Stop-times feed row carries an invalid trip ID
    #[error("stop times feed row {row}: {source}")]
    FeedTripId {
        row: u64,
        #[source]
        source: InvalidTripId,
    },

    /// Stop-times feed row carries an invalid arrival time
    #[error("stop times feed row {row}: {source}")]
    FeedTime {
        row: u64,
        #[source]
        source: TimeError,
    },
}
