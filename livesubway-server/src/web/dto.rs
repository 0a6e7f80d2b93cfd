//! Data transfer objects for web requests and responses.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::{DayType, Trip};
use crate::schedule::{DaySchedule, ScheduleSnapshot, progress};

/// Format used for wall-clock instants in requests and responses.
pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Query for the status endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct StatusQuery {
    /// Local instant to evaluate instead of now, `YYYY-MM-DDTHH:MM:SS`
    pub at: Option<String>,
}

/// A trip in a response.
#[derive(Debug, Serialize)]
pub struct TripView {
    pub id: String,
    pub line: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<char>,

    /// Departure from the first stop
    pub init_time: String,

    /// Arrival at the last stop
    pub completion_time: String,

    /// Number of stops served
    pub stops: usize,
}

/// A trip in service, with how far along it is.
#[derive(Debug, Serialize)]
pub struct ActiveTripView {
    #[serde(flatten)]
    pub trip: TripView,

    /// Fraction of the running time elapsed, 0.0 to 1.0
    pub progress: f64,
}

/// Where the schedule stands at an instant.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub day_type: DayType,
    pub now: String,

    /// Index of the next trip to depart within the day's schedule
    pub next_index: usize,

    /// Trips leaving together at the next departure boundary
    pub next_departures: Vec<TripView>,

    /// Trips departed but not yet finished
    pub active: Vec<ActiveTripView>,

    /// Connected event subscribers
    pub subscribers: usize,
}

/// One day type's complete schedule.
#[derive(Debug, Serialize)]
pub struct DayScheduleResponse {
    pub day_type: DayType,
    pub count: usize,
    pub trips: Vec<TripView>,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

impl TripView {
    pub fn from_trip(trip: &Trip) -> Self {
        Self {
            id: trip.id.to_string(),
            line: trip.line.clone(),
            direction: trip.direction,
            init_time: trip.init_time.to_string(),
            completion_time: trip.completion_time().to_string(),
            stops: trip.stops.len(),
        }
    }
}

impl StatusResponse {
    pub fn from_snapshot(
        snapshot: &ScheduleSnapshot,
        day: &DaySchedule,
        now: NaiveDateTime,
        subscribers: usize,
    ) -> Self {
        Self {
            day_type: snapshot.day_type,
            now: now.format(DATETIME_FORMAT).to_string(),
            next_index: snapshot.cursor,
            next_departures: snapshot
                .next_departures(day)
                .iter()
                .map(TripView::from_trip)
                .collect(),
            active: snapshot
                .active_trips(day)
                .map(|trip| ActiveTripView {
                    trip: TripView::from_trip(trip),
                    progress: progress(trip, snapshot.now),
                })
                .collect(),
            subscribers,
        }
    }
}

impl DayScheduleResponse {
    pub fn from_day(day: &DaySchedule) -> Self {
        Self {
            day_type: day.day_type(),
            count: day.len(),
            trips: day.trips().iter().map(TripView::from_trip).collect(),
        }
    }
}
