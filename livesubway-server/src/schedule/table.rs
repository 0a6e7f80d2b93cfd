//! The immutable, day-partitioned schedule table.

use std::collections::BTreeMap;
use std::io::{BufReader, Read};
use std::path::Path;

use tracing::{info, warn};

use crate::domain::{DayType, Trip};

use super::error::ScheduleError;

/// On-disk layout: `{"WKD": [...], "SAT": [...], "SUN": [...]}`.
type RawTable = BTreeMap<DayType, Vec<Trip>>;

/// All trips for one day type, sorted by [`Trip::sort_key`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaySchedule {
    day_type: DayType,
    trips: Vec<Trip>,
}

impl DaySchedule {
    /// Validate and wrap a day's trips.
    ///
    /// The trips must already be sorted; this never re-sorts. Every trip ID
    /// must carry this day's suffix.
    pub fn new(day_type: DayType, trips: Vec<Trip>) -> Result<Self, ScheduleError> {
        for trip in &trips {
            if trip.id.day_type() != day_type {
                return Err(ScheduleError::WrongDay {
                    day: day_type,
                    id: trip.id.clone(),
                    found: trip.id.day_type(),
                });
            }
        }

        if let Some(index) = trips
            .windows(2)
            .position(|pair| pair[1].sort_key() < pair[0].sort_key())
        {
            return Err(ScheduleError::Unsorted {
                day: day_type,
                index: index + 1,
                id: trips[index + 1].id.clone(),
            });
        }

        Ok(Self { day_type, trips })
    }

    /// Sort trips into schedule order, then validate.
    ///
    /// Used by the offline builder; the server only loads presorted data.
    pub fn from_unsorted(day_type: DayType, mut trips: Vec<Trip>) -> Result<Self, ScheduleError> {
        trips.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        Self::new(day_type, trips)
    }

    pub fn day_type(&self) -> DayType {
        self.day_type
    }

    pub fn trips(&self) -> &[Trip] {
        &self.trips
    }

    pub fn len(&self) -> usize {
        self.trips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trips.is_empty()
    }
}

/// Every day type's schedule.
///
/// Built once at startup and shared read-only (behind an `Arc`) between the
/// daemon and request handlers. There is no mutation or reload path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleTable {
    weekday: DaySchedule,
    saturday: DaySchedule,
    sunday: DaySchedule,
}

impl ScheduleTable {
    /// Assemble a table from validated days.
    ///
    /// Empty days are accepted (the daemon reports "no service" for them)
    /// but logged, since they usually mean a truncated feed.
    pub fn new(weekday: DaySchedule, saturday: DaySchedule, sunday: DaySchedule) -> Self {
        let table = Self {
            weekday,
            saturday,
            sunday,
        };
        for day in DayType::ALL {
            if table.day(day).is_empty() {
                warn!(day_type = %day, "schedule has no trips for day type");
            }
        }
        table
    }

    /// Load a table from its JSON form.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ScheduleError> {
        let mut raw: RawTable = serde_json::from_reader(reader)?;
        let mut take = |day: DayType| DaySchedule::new(day, raw.remove(&day).unwrap_or_default());

        let weekday = take(DayType::Weekday)?;
        let saturday = take(DayType::Saturday)?;
        let sunday = take(DayType::Sunday)?;

        Ok(Self::new(weekday, saturday, sunday))
    }

    /// Load a table from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScheduleError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| ScheduleError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let table = Self::from_reader(BufReader::new(file))?;
        info!(
            path = %path.display(),
            weekday = table.weekday.len(),
            saturday = table.saturday.len(),
            sunday = table.sunday.len(),
            "loaded schedule"
        );
        Ok(table)
    }

    /// Serialize the table to its JSON form.
    pub fn to_json(&self) -> Result<String, ScheduleError> {
        let raw: BTreeMap<DayType, &[Trip]> = DayType::ALL
            .into_iter()
            .map(|day| (day, self.day(day).trips()))
            .collect();
        Ok(serde_json::to_string(&raw)?)
    }

    /// Write the table as JSON to a file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ScheduleError> {
        let path = path.as_ref();
        let json = self.to_json()?;
        std::fs::write(path, json).map_err(|source| ScheduleError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn day(&self, day_type: DayType) -> &DaySchedule {
        match day_type {
            DayType::Weekday => &self.weekday,
            DayType::Saturday => &self.saturday,
            DayType::Sunday => &self.sunday,
        }
    }

    /// Total number of trips across all days.
    pub fn total_trips(&self) -> usize {
        DayType::ALL.iter().map(|d| self.day(*d).len()).sum()
    }
}
