//! Deciding how long the daemon sleeps.
//!
//! The wait is always derived from the live clock, never accumulated from
//! previous sleeps, so scheduler jitter cannot make the daemon drift.

use std::time::Duration;

use chrono::NaiveTime;

use crate::domain::{ServiceTime, Trip, until_midnight};

/// What the daemon should sleep until.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wait {
    /// Sleep `delay`, then collect the trips departing at `boundary`.
    Departure {
        boundary: ServiceTime,
        delay: Duration,
    },

    /// Nothing left to depart today; sleep `delay` until midnight, then
    /// start over on the next day's schedule. `skipped` counts the trips
    /// listed at or after 24:00:00 that will not be emitted.
    EndOfDay { delay: Duration, skipped: usize },
}

/// Plan the next sleep from the cursor and the wall-clock time of day.
///
/// A departure already in the past yields a zero delay, so a late wake-up
/// emits overdue boundaries immediately instead of skipping them. A trip
/// listed at or after 24:00:00 belongs past midnight, which ends the day.
pub fn plan_wait(trips: &[Trip], cursor: usize, now: NaiveTime) -> Wait {
    match trips.get(cursor) {
        Some(trip) if !trip.init_time.is_next_day() => Wait::Departure {
            boundary: trip.init_time,
            delay: trip
                .init_time
                .signed_duration_since(now)
                .to_std()
                .unwrap_or(Duration::ZERO),
        },
        _ => Wait::EndOfDay {
            delay: until_midnight(now).to_std().unwrap_or(Duration::ZERO),
            skipped: trips.len().saturating_sub(cursor),
        },
    }
}
