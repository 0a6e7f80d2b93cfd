//! Offline transform from a GTFS `stop_times.txt` into a [`ScheduleTable`].
//!
//! Rows are grouped by consecutive `trip_id` (the feed lists each trip's
//! stops contiguously). Each group becomes one [`Trip`] whose line,
//! direction and start time come from its ID. Trips are then partitioned by
//! day type and sorted into schedule order.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info};

use crate::domain::{DayType, ServiceTime, StopTime, Trip, TripId};

use super::error::ScheduleError;
use super::table::{DaySchedule, ScheduleTable};

/// The columns of `stop_times.txt` this transform reads; others are ignored.
#[derive(Debug, Deserialize)]
struct StopTimeRow {
    trip_id: String,
    arrival_time: String,
    stop_id: String,
}

/// Build a schedule table from `stop_times.txt` content.
///
/// Output is fully determined by the input: the same feed always yields the
/// same table.
pub fn build_table<R: Read>(reader: R) -> Result<ScheduleTable, ScheduleError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut days: BTreeMap<DayType, Vec<Trip>> = BTreeMap::new();
    let mut current: Option<(TripId, Vec<StopTime>)> = None;

    for (idx, record) in reader.deserialize::<StopTimeRow>().enumerate() {
        // Row 1 is the header
        let row = idx as u64 + 2;
        let record = record?;

        let arrival = ServiceTime::parse(&record.arrival_time)
            .map_err(|source| ScheduleError::FeedTime { row, source })?;
        let stop = StopTime::new(record.stop_id, arrival);

        match &mut current {
            Some((id, stops)) if id.as_str() == record.trip_id => stops.push(stop),
            _ => {
                let id = TripId::parse(&record.trip_id)
                    .map_err(|source| ScheduleError::FeedTripId { row, source })?;
                if let Some((done_id, done_stops)) = current.replace((id, vec![stop])) {
                    push_trip(&mut days, done_id, done_stops);
                }
            }
        }
    }

    if let Some((id, stops)) = current {
        push_trip(&mut days, id, stops);
    }

    let mut take = |day: DayType| {
        let trips = days.remove(&day).unwrap_or_default();
        debug!(day_type = %day, trips = trips.len(), "sorting day");
        DaySchedule::from_unsorted(day, trips)
    };

    let weekday = take(DayType::Weekday)?;
    let saturday = take(DayType::Saturday)?;
    let sunday = take(DayType::Sunday)?;

    Ok(ScheduleTable::new(weekday, saturday, sunday))
}

/// Build a schedule table from a `stop_times.txt` file.
pub fn build_table_from_path(path: impl AsRef<Path>) -> Result<ScheduleTable, ScheduleError> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|source| ScheduleError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let table = build_table(std::io::BufReader::new(file))?;
    info!(
        path = %path.display(),
        trips = table.total_trips(),
        "built schedule from stop times"
    );
    Ok(table)
}

fn push_trip(days: &mut BTreeMap<DayType, Vec<Trip>>, id: TripId, stops: Vec<StopTime>) {
    days.entry(id.day_type())
        .or_default()
        .push(Trip::from_id(id, stops));
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = "\
trip_id,arrival_time,departure_time,stop_id,stop_sequence,stop_headsign,pickup_type,drop_off_type,shape_dist_traveled
A01WKD_037500_1..S03R,06:15:00,06:15:00,101S,1,,0,0,
A01WKD_037500_1..S03R,06:16:30,06:16:30,103S,2,,0,0,
A01WKD_036000_2..N01R,06:00:00,06:00:00,201N,1,,0,0,
A01WKD_036000_2..N01R,06:40:00,06:40:00,247N,2,,0,0,
A01SAT_048000_A..S02R,08:00:00,08:00:00,A02S,1,,0,0,
A01WKD_036000_1..S03R,06:00:00,06:00:00,101S,1,,0,0,
A01WKD_036000_1..S03R,06:52:00,06:52:00,142S,2,,0,0,
A01WKD_145000_1..S03R,24:10:00,24:10:00,101S,1,,0,0,
A01WKD_145000_1..S03R,24:55:00,24:55:00,142S,2,,0,0,
";

    #[test]
    fn groups_and_sorts_trips() {
        let table = build_table(FEED.as_bytes()).unwrap();

        let weekday = table.day(DayType::Weekday);
        let ids: Vec<_> = weekday.trips().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "A01WKD_036000_1..S03R",
                "A01WKD_036000_2..N01R",
                "A01WKD_037500_1..S03R",
                "A01WKD_145000_1..S03R",
            ]
        );

        let first = &weekday.trips()[0];
        assert_eq!(first.line, "1");
        assert_eq!(first.direction, Some('S'));
        assert_eq!(first.init_time.to_string(), "06:00:00");
        assert_eq!(first.stops.len(), 2);
        assert_eq!(first.completion_time().to_string(), "06:52:00");

        assert_eq!(table.day(DayType::Saturday).len(), 1);
        assert!(table.day(DayType::Sunday).is_empty());
    }

    #[test]
    fn late_night_trip_sorts_last() {
        let table = build_table(FEED.as_bytes()).unwrap();
        let last = table.day(DayType::Weekday).trips().last().unwrap();
        assert!(last.init_time.is_next_day());
    }

    #[test]
    fn build_is_deterministic() {
        let first = build_table(FEED.as_bytes()).unwrap();
        let second = build_table(FEED.as_bytes()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
    }

    #[test]
    fn built_table_reloads_identically() {
        let built = build_table(FEED.as_bytes()).unwrap();
        let json = built.to_json().unwrap();
        let loaded = ScheduleTable::from_reader(json.as_bytes()).unwrap();
        assert_eq!(loaded, built);
    }

    #[test]
    fn bad_trip_id_reports_row() {
        let feed = "trip_id,arrival_time,departure_time,stop_id\nnot-a-trip,06:00:00,06:00:00,101S\n";
        let err = build_table(feed.as_bytes()).unwrap_err();
        assert!(matches!(err, ScheduleError::FeedTripId { row: 2, .. }));
    }

    #[test]
    fn latest_start_time_survives_reload() {
        let feed = "\
trip_id,arrival_time,departure_time,stop_id
A01WKD_287999_1..S03R,47:59:59,47:59:59,101S
";
        let built = build_table(feed.as_bytes()).unwrap();
        let trip = &built.day(DayType::Weekday).trips()[0];
        assert_eq!(trip.init_time, ServiceTime::LATEST);

        let loaded = ScheduleTable::from_reader(built.to_json().unwrap().as_bytes()).unwrap();
        assert_eq!(loaded, built);
    }

    #[test]
    fn offset_past_parseable_range_is_rejected() {
        let feed = "\
trip_id,arrival_time,departure_time,stop_id
A01WKD_290000_1..S03R,47:00:00,47:00:00,101S
";
        let err = build_table(feed.as_bytes()).unwrap_err();
        assert!(matches!(err, ScheduleError::FeedTripId { row: 2, .. }));
    }

    #[test]
    fn bad_time_reports_row() {
        let feed = "\
trip_id,arrival_time,departure_time,stop_id
A01WKD_036000_1..S03R,06:00:00,06:00:00,101S
A01WKD_036000_1..S03R,6h02,6h02,103S
";
        let err = build_table(feed.as_bytes()).unwrap_err();
        assert!(matches!(err, ScheduleError::FeedTime { row: 3, .. }));
    }

    #[test]
    fn empty_feed_builds_empty_table() {
        let feed = "trip_id,arrival_time,departure_time,stop_id\n";
        let table = build_table(feed.as_bytes()).unwrap();
        assert_eq!(table.total_trips(), 0);
    }
}
