//! Binary search over a day's trips, keyed by departure time.
//!
//! Every routine here relies on the trips being sorted by `init_time`
//! (enforced when a [`DaySchedule`](super::DaySchedule) is built).

use crate::domain::{ServiceTime, Trip};

/// Index of the first trip departing at or after `now`.
///
/// Returns `trips.len()` when every trip has already departed, so the result
/// is always a valid cursor. A strict lower bound: a trip departing exactly
/// at `now` has not departed yet. Because it is a lower bound, the result is
/// always the first trip of a block sharing the same departure time.
///
/// # Examples
///
/// ```
/// use livesubway_server::domain::{ServiceTime, Trip, TripId};
/// use livesubway_server::schedule::find_next;
///
/// let trips: Vec<Trip> = ["036000", "036000", "037500", "042000"]
///     .iter()
///     .map(|offset| {
///         let id = TripId::parse(&format!("A01WKD_{offset}_1..S")).unwrap();
///         Trip::from_id(id, vec![])
///     })
///     .collect();
///
/// let now = ServiceTime::parse("06:10:00").unwrap();
/// assert_eq!(find_next(&trips, now), 2);
/// ```
pub fn find_next(trips: &[Trip], now: ServiceTime) -> usize {
    let mut lo = 0;
    let mut hi = trips.len();

    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if trips[mid].init_time < now {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }

    lo
}

/// Exclusive end of the block of trips departing at the same time as
/// `trips[start]`.
///
/// Returns `start` when `start` is out of range (an empty block).
pub fn boundary_end(trips: &[Trip], start: usize) -> usize {
    let Some(first) = trips.get(start) else {
        return start;
    };

    trips[start..]
        .iter()
        .position(|trip| trip.init_time != first.init_time)
        .map_or(trips.len(), |offset| start + offset)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::domain::TripId;
    use proptest::prelude::*;

    fn trips_from_offsets(mut offsets: Vec<u32>) -> Vec<Trip> {
        offsets.sort_unstable();
        offsets
            .into_iter()
            .map(|offset| {
                let id = TripId::parse(&format!("A01WKD_{offset:06}_1..S")).unwrap();
                Trip::from_id(id, vec![])
            })
            .collect()
    }

    proptest! {
        /// find_next is the smallest index departing at or after now
        #[test]
        fn matches_linear_scan(
            offsets in prop::collection::vec(0u32..150_000, 0..60),
            now in 0u32..100_000,
        ) {
            let trips = trips_from_offsets(offsets);
            let now = ServiceTime::from_secs(now);

            let expected = trips
                .iter()
                .position(|t| t.init_time >= now)
                .unwrap_or(trips.len());

            prop_assert_eq!(find_next(&trips, now), expected);
        }

        /// Everything before the result has departed, everything after has not
        #[test]
        fn partitions_sequence(
            offsets in prop::collection::vec(0u32..150_000, 0..60),
            now in 0u32..100_000,
        ) {
            let trips = trips_from_offsets(offsets);
            let now = ServiceTime::from_secs(now);
            let idx = find_next(&trips, now);

            prop_assert!(trips[..idx].iter().all(|t| t.init_time < now));
            prop_assert!(trips[idx..].iter().all(|t| t.init_time >= now));
        }

        /// A boundary block is non-empty and shares one departure time
        #[test]
        fn boundary_block_is_uniform(
            offsets in prop::collection::vec(0u32..5_000, 1..40),
            start_seed in any::<prop::sample::Index>(),
        ) {
            let trips = trips_from_offsets(offsets);
            let start = start_seed.index(trips.len());
            let end = boundary_end(&trips, start);

            prop_assert!(end > start);
            prop_assert!(trips[start..end].iter().all(|t| t.init_time == trips[start].init_time));
            if end < trips.len() {
                prop_assert!(trips[end].init_time > trips[start].init_time);
            }
        }
    }
}
