//! Daemon runtime errors.

use crate::domain::{DayType, ServiceTime};

/// Errors raised inside one daemon cycle.
///
/// None of these stop the daemon: the loop logs them and starts over from a
/// fresh view of the schedule.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DaemonError {
    /// Collecting a batch ran past the end of the day's trips
    #[error("{day_type} schedule exhausted at cursor {cursor} (now {now})")]
    SequenceExhausted {
        day_type: DayType,
        cursor: usize,
        now: ServiceTime,
    },
}
