//! Scheduled trips and their identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::day_type::DayType;
use super::time::ServiceTime;

/// Error returned when a trip ID does not follow the feed's format.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid trip ID {id:?}: {reason}")]
pub struct InvalidTripId {
    id: String,
    reason: &'static str,
}

impl InvalidTripId {
    fn new(id: &str, reason: &'static str) -> Self {
        Self {
            id: id.to_string(),
            reason,
        }
    }
}

/// A feed trip identifier, validated and decomposed at construction.
///
/// IDs look like `A20121216WKD_036000_1..S03R`: the first field ends in the
/// day-type suffix, the second is the nominal start offset in hundredths of a
/// minute after midnight, and the last names the line before the first `.`
/// and the direction after the last `.`.
///
/// # Examples
///
/// ```
/// use livesubway_server::domain::{DayType, TripId};
///
/// let id = TripId::parse("A20121216WKD_036000_1..S03R").unwrap();
/// assert_eq!(id.day_type(), DayType::Weekday);
/// assert_eq!(id.offset(), 36000);
/// assert_eq!(id.line(), "1");
/// assert_eq!(id.direction(), Some('S'));
/// assert_eq!(id.start_time().to_string(), "06:00:00");
///
/// assert!(TripId::parse("garbage").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TripId {
    raw: String,
    day_type: DayType,
    offset: u32,
    line_end: usize,
    direction: Option<char>,
}

impl TripId {
    pub fn parse(s: &str) -> Result<Self, InvalidTripId> {
        let fields: Vec<&str> = s.split('_').collect();
        if fields.len() < 3 {
            return Err(InvalidTripId::new(s, "expected at least three '_' fields"));
        }

        let prefix = fields[0];
        let suffix = prefix
            .len()
            .checked_sub(3)
            .and_then(|start| prefix.get(start..))
            .ok_or_else(|| InvalidTripId::new(s, "missing day-type suffix"))?;
        let day_type =
            DayType::from_code(suffix).map_err(|_| InvalidTripId::new(s, "unknown day type"))?;

        let offset_field = fields[1];
        if offset_field.len() < 3 || !offset_field.bytes().all(|b| b.is_ascii_digit()) {
            return Err(InvalidTripId::new(s, "offset must be at least three digits"));
        }
        let offset: u32 = offset_field
            .parse()
            .map_err(|_| InvalidTripId::new(s, "offset out of range"))?;
        if offset_start_time(offset) > ServiceTime::LATEST {
            return Err(InvalidTripId::new(s, "offset out of range"));
        }

        let route = fields[fields.len() - 1];
        let dot = route
            .find('.')
            .ok_or_else(|| InvalidTripId::new(s, "route field has no '.'"))?;
        if dot == 0 {
            return Err(InvalidTripId::new(s, "empty line"));
        }
        let direction = route
            .rfind('.')
            .and_then(|last| route[last + 1..].chars().next());

        Ok(Self {
            raw: s.to_string(),
            day_type,
            offset,
            line_end: s.len() - route.len() + dot,
            direction,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Day type encoded in the ID's first field.
    pub fn day_type(&self) -> DayType {
        self.day_type
    }

    /// Nominal start offset, in hundredths of a minute after midnight.
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Line (route) name.
    pub fn line(&self) -> &str {
        let start = self.raw[..self.line_end]
            .rfind('_')
            .map_or(0, |underscore| underscore + 1);
        &self.raw[start..self.line_end]
    }

    /// Direction code, if the ID carries one.
    pub fn direction(&self) -> Option<char> {
        self.direction
    }

    /// Start time derived from the offset.
    ///
    /// The offset is not wrapped at 24 hours, so trips starting after
    /// midnight sort after the rest of the day.
    pub fn start_time(&self) -> ServiceTime {
        offset_start_time(self.offset)
    }
}

/// Convert an offset in hundredths of a minute into a start time.
fn offset_start_time(offset: u32) -> ServiceTime {
    let minutes = offset / 100;
    let hundredths = offset % 100;
    ServiceTime::from_secs(minutes * 60 + hundredths * 60 / 100)
}

impl TryFrom<String> for TripId {
    type Error = InvalidTripId;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<TripId> for String {
    fn from(id: TripId) -> Self {
        id.raw
    }
}

impl fmt::Debug for TripId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TripId({})", self.raw)
    }
}

impl fmt::Display for TripId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// One stop of a trip's itinerary: `[stop_id, arrival_time]` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopTime(pub String, pub ServiceTime);

impl StopTime {
    pub fn new(stop_id: impl Into<String>, arrival: ServiceTime) -> Self {
        Self(stop_id.into(), arrival)
    }

    pub fn stop_id(&self) -> &str {
        &self.0
    }

    pub fn arrival(&self) -> ServiceTime {
        self.1
    }
}

/// One scheduled subway run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trip {
    /// Route identifier
    pub line: String,

    pub id: TripId,

    /// Direction code (older feeds omit it)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<char>,

    /// Time the trip leaves its first stop
    pub init_time: ServiceTime,

    /// Ordered itinerary
    #[serde(rename = "trip_time", default)]
    pub stops: Vec<StopTime>,
}

impl Trip {
    /// Build a trip from its ID, taking line, direction and start time from it.
    pub fn from_id(id: TripId, stops: Vec<StopTime>) -> Self {
        Self {
            line: id.line().to_string(),
            direction: id.direction(),
            init_time: id.start_time(),
            id,
            stops,
        }
    }

    /// Arrival time at the final stop, or the start time if there are no stops.
    pub fn completion_time(&self) -> ServiceTime {
        self.stops.last().map_or(self.init_time, StopTime::arrival)
    }

    /// Key the schedule is ordered by: start time, then ID offset, then line.
    pub fn sort_key(&self) -> (ServiceTime, u32, &str) {
        (self.init_time, self.id.offset(), &self.line)
    }
}
