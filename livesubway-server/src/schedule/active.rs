//! Trips that have departed but not yet finished their run.

use std::collections::BTreeSet;

use crate::domain::{ServiceTime, Trip};

/// Indices below `cutoff` whose trip is still underway at `now`.
///
/// A trip is underway when its completion time (arrival at the final stop)
/// is at or after `now`. `cutoff` is normally the result of
/// [`find_next`](super::find_next), and is clamped to the sequence length.
/// This is a plain linear scan over `[0, cutoff)`.
pub fn active_before(trips: &[Trip], cutoff: usize, now: ServiceTime) -> BTreeSet<usize> {
    let cutoff = cutoff.min(trips.len());

    trips[..cutoff]
        .iter()
        .enumerate()
        .filter(|(_, trip)| trip.completion_time() >= now)
        .map(|(idx, _)| idx)
        .collect()
}

/// Fraction of the run completed at `now`, in `[0, 1]`.
///
/// Trips with zero duration report 1.0 once started.
pub fn progress(trip: &Trip, now: ServiceTime) -> f64 {
    let start = trip.init_time.as_secs();
    let end = trip.completion_time().as_secs();
    let now = now.as_secs();

    if now <= start {
        return 0.0;
    }
    if end <= start || now >= end {
        return 1.0;
    }
    f64::from(now - start) / f64::from(end - start)
}
