//! Point-in-time view of the schedule: next departure and trips in service.

use std::collections::BTreeSet;

use chrono::NaiveDateTime;

use crate::domain::{DayType, ServiceTime, Trip};

use super::active::active_before;
use super::index::{boundary_end, find_next};
use super::table::{DaySchedule, ScheduleTable};

/// Where "now" falls in the schedule for its calendar day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleSnapshot {
    /// Day type the wall-clock date runs on.
    pub day_type: DayType,

    /// Wall-clock time of day, truncated to seconds.
    pub now: ServiceTime,

    /// Index of the next trip not yet departed.
    pub cursor: usize,

    /// Indices of trips departed but not finished.
    pub active: BTreeSet<usize>,
}

impl ScheduleSnapshot {
    /// Compute the snapshot for a wall-clock instant.
    pub fn at(table: &ScheduleTable, now: NaiveDateTime) -> Self {
        let day_type = DayType::for_date(now.date());
        let now = ServiceTime::from_naive_time(now.time());
        let trips = table.day(day_type).trips();
        let cursor = find_next(trips, now);

        Self {
            day_type,
            now,
            cursor,
            active: active_before(trips, cursor, now),
        }
    }

    /// The trips departing together at the next boundary (empty at end of day).
    pub fn next_departures<'a>(&self, day: &'a DaySchedule) -> &'a [Trip] {
        let trips = day.trips();
        let start = self.cursor.min(trips.len());
        &trips[start..boundary_end(trips, start)]
    }

    /// The trips currently in service.
    pub fn active_trips<'a>(&self, day: &'a DaySchedule) -> impl Iterator<Item = &'a Trip> + 'a {
        let trips = day.trips();
        self.active
            .clone()
            .into_iter()
            .filter_map(move |idx| trips.get(idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn table() -> ScheduleTable {
        let json = r#"{
            "WKD": [
                {"line": "1", "id": "A01WKD_030000_1..S", "init_time": "05:00:00",
                 "trip_time": [["101S", "05:00:00"], ["142S", "05:50:00"]]},
                {"line": "1", "id": "A01WKD_031500_1..S", "init_time": "05:15:00",
                 "trip_time": [["101S", "05:15:00"], ["142S", "06:05:00"]]},
                {"line": "1", "id": "A01WKD_036000_1..S", "init_time": "06:00:00",
                 "trip_time": [["101S", "06:00:00"], ["142S", "06:50:00"]]},
                {"line": "2", "id": "A01WKD_036000_2..S", "init_time": "06:00:00",
                 "trip_time": [["201S", "06:00:00"], ["247S", "07:00:00"]]},
                {"line": "1", "id": "A01WKD_037500_1..S", "init_time": "06:15:00",
                 "trip_time": [["101S", "06:15:00"], ["142S", "07:05:00"]]}
            ]
        }"#;
        ScheduleTable::from_reader(json.as_bytes()).unwrap()
    }

    fn at(date: NaiveDate, h: u32, m: u32) -> NaiveDateTime {
        date.and_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn weekday_morning() {
        // 2024-03-15 is a Friday
        let friday = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let table = table();
        let snapshot = ScheduleSnapshot::at(&table, at(friday, 5, 55));

        assert_eq!(snapshot.day_type, DayType::Weekday);
        assert_eq!(snapshot.cursor, 2);
        assert_eq!(snapshot.active, BTreeSet::from([1]));

        let day = table.day(DayType::Weekday);
        let next: Vec<_> = snapshot
            .next_departures(day)
            .iter()
            .map(|t| t.line.as_str())
            .collect();
        assert_eq!(next, vec!["1", "2"]);

        let active: Vec<_> = snapshot.active_trips(day).map(|t| t.id.as_str()).collect();
        assert_eq!(active, vec!["A01WKD_031500_1..S"]);
    }

    #[test]
    fn end_of_day_has_no_next_departures() {
        let friday = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let table = table();
        let snapshot = ScheduleSnapshot::at(&table, at(friday, 23, 0));

        assert_eq!(snapshot.cursor, 5);
        assert!(snapshot.next_departures(table.day(DayType::Weekday)).is_empty());
        assert!(snapshot.active.is_empty());
    }

    #[test]
    fn empty_day_snapshot() {
        let sunday = NaiveDate::from_ymd_opt(2024, 3, 17).unwrap();
        let table = table();
        let snapshot = ScheduleSnapshot::at(&table, at(sunday, 9, 0));

        assert_eq!(snapshot.day_type, DayType::Sunday);
        assert_eq!(snapshot.cursor, 0);
        assert!(snapshot.active.is_empty());
        assert!(snapshot.next_departures(table.day(DayType::Sunday)).is_empty());
    }
}
