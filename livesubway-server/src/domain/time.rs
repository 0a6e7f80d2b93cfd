//! Service-day time handling.
//!
//! Schedule feeds give times as "HH:MM:SS" strings counted from the start of
//! the service day. Trips that run past midnight keep counting, so "25:10:00"
//! is ten past one the following morning. This module provides a type for
//! such times and the arithmetic the daemon needs against the wall clock.

use chrono::{Duration, NaiveTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Error returned when parsing an invalid time string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time: {reason}")]
pub struct TimeError {
    reason: &'static str,
}

impl TimeError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

const SECS_PER_MINUTE: u32 = 60;
const SECS_PER_HOUR: u32 = 60 * SECS_PER_MINUTE;
const SECS_PER_DAY: u32 = 24 * SECS_PER_HOUR;

/// Feeds never describe a trip running more than a day past its start.
const MAX_HOURS: u32 = 48;

/// A time of day within a service day, with one-second resolution.
///
/// Unlike [`NaiveTime`], values at or beyond 24:00:00 are representable.
///
/// # Examples
///
/// ```
/// use livesubway_server::domain::ServiceTime;
///
/// let t = ServiceTime::parse("06:15:30").unwrap();
/// assert_eq!(t.as_secs(), 6 * 3600 + 15 * 60 + 30);
/// assert_eq!(t.to_string(), "06:15:30");
///
/// let late = ServiceTime::parse("24:30:00").unwrap();
/// assert!(late.is_next_day());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServiceTime(u32);

impl ServiceTime {
    /// Midnight at the start of the service day.
    pub const START_OF_DAY: ServiceTime = ServiceTime(0);

    /// Midnight at the end of the service day (24:00:00).
    pub const END_OF_DAY: ServiceTime = ServiceTime(SECS_PER_DAY);

    /// Latest time that [`ServiceTime::parse`] accepts (47:59:59).
    pub const LATEST: ServiceTime = ServiceTime(MAX_HOURS * SECS_PER_HOUR - 1);

    /// Create a time from seconds since the start of the service day.
    pub fn from_secs(secs: u32) -> Self {
        Self(secs)
    }

    /// Create a time from hour, minute and second components.
    ///
    /// Returns `None` if minute or second is out of range, or the hour
    /// exceeds what a feed can express.
    pub fn from_hms(hour: u32, minute: u32, second: u32) -> Option<Self> {
        if hour >= MAX_HOURS || minute >= 60 || second >= 60 {
            return None;
        }
        Some(Self(hour * SECS_PER_HOUR + minute * SECS_PER_MINUTE + second))
    }

    /// Truncate a wall-clock time of day to whole seconds.
    pub fn from_naive_time(time: NaiveTime) -> Self {
        Self(time.num_seconds_from_midnight())
    }

    /// Parse "HH:MM:SS" (a single-digit hour is accepted, as GTFS allows).
    ///
    /// # Examples
    ///
    /// ```
    /// use livesubway_server::domain::ServiceTime;
    ///
    /// assert!(ServiceTime::parse("00:00:00").is_ok());
    /// assert!(ServiceTime::parse("7:05:00").is_ok());
    /// assert!(ServiceTime::parse("25:10:00").is_ok());
    ///
    /// assert!(ServiceTime::parse("07:05").is_err());
    /// assert!(ServiceTime::parse("07:60:00").is_err());
    /// assert!(ServiceTime::parse("07:05:0a").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, TimeError> {
        let mut parts = s.trim().split(':');
        let (Some(h), Some(m), Some(sec), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(TimeError::new("expected HH:MM:SS format"));
        };

        if h.is_empty() || h.len() > 2 {
            return Err(TimeError::new("hour must have one or two digits"));
        }
        let hour = parse_digits(h).ok_or_else(|| TimeError::new("invalid hour digits"))?;
        if hour >= MAX_HOURS {
            return Err(TimeError::new("hour out of range"));
        }

        let minute = parse_two_digits(m).ok_or_else(|| TimeError::new("invalid minute digits"))?;
        if minute > 59 {
            return Err(TimeError::new("minute must be 0-59"));
        }

        let second = parse_two_digits(sec).ok_or_else(|| TimeError::new("invalid second digits"))?;
        if second > 59 {
            return Err(TimeError::new("second must be 0-59"));
        }

        Self::from_hms(hour, minute, second).ok_or_else(|| TimeError::new("invalid time"))
    }

    /// Seconds since the start of the service day.
    pub fn as_secs(&self) -> u32 {
        self.0
    }

    /// Returns the hour, which may be 24 or more.
    pub fn hour(&self) -> u32 {
        self.0 / SECS_PER_HOUR
    }

    pub fn minute(&self) -> u32 {
        (self.0 % SECS_PER_HOUR) / SECS_PER_MINUTE
    }

    pub fn second(&self) -> u32 {
        self.0 % SECS_PER_MINUTE
    }

    /// True when this time falls after the midnight that ends the service day.
    pub fn is_next_day(&self) -> bool {
        self.0 >= SECS_PER_DAY
    }

    /// Signed duration from the wall-clock time `now` until this time.
    ///
    /// Negative when `now` is already past this time. Sub-second precision
    /// of `now` is kept, so the result is exact.
    pub fn signed_duration_since(&self, now: NaiveTime) -> Duration {
        Duration::seconds(i64::from(self.0)) - since_midnight(now)
    }
}

/// Duration elapsed between midnight and `time`, including fractional seconds.
pub fn since_midnight(time: NaiveTime) -> Duration {
    Duration::seconds(i64::from(time.num_seconds_from_midnight()))
        + Duration::nanoseconds(i64::from(time.nanosecond()))
}

/// Duration from `time` until the next midnight.
pub fn until_midnight(time: NaiveTime) -> Duration {
    Duration::seconds(i64::from(SECS_PER_DAY)) - since_midnight(time)
}

impl FromStr for ServiceTime {
    type Err = TimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Debug for ServiceTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServiceTime({self})")
    }
}

impl fmt::Display for ServiceTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.hour(),
            self.minute(),
            self.second()
        )
    }
}

impl Serialize for ServiceTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ServiceTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ServiceTime::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Parse exactly two ASCII digits.
fn parse_two_digits(s: &str) -> Option<u32> {
    if s.len() != 2 {
        return None;
    }
    parse_digits(s)
}

fn parse_digits(s: &str) -> Option<u32> {
    s.chars()
        .try_fold(0u32, |acc, c| Some(acc * 10 + c.to_digit(10)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hms(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    #[test]
    fn parse_valid_times() {
        let t = ServiceTime::parse("00:00:00").unwrap();
        assert_eq!(t, ServiceTime::START_OF_DAY);

        let t = ServiceTime::parse("23:59:59").unwrap();
        assert_eq!((t.hour(), t.minute(), t.second()), (23, 59, 59));

        let t = ServiceTime::parse("6:07:08").unwrap();
        assert_eq!((t.hour(), t.minute(), t.second()), (6, 7, 8));
    }

    #[test]
    fn parse_past_midnight() {
        let t = ServiceTime::parse("24:00:00").unwrap();
        assert_eq!(t, ServiceTime::END_OF_DAY);
        assert!(t.is_next_day());

        let t = ServiceTime::parse("25:10:00").unwrap();
        assert_eq!(t.hour(), 25);
        assert!(t.is_next_day());

        assert!(!ServiceTime::parse("23:59:59").unwrap().is_next_day());
    }

    #[test]
    fn parse_invalid_format() {
        assert!(ServiceTime::parse("").is_err());
        assert!(ServiceTime::parse("06:00").is_err());
        assert!(ServiceTime::parse("06:00:00:00").is_err());
        assert!(ServiceTime::parse("06-00-00").is_err());
        assert!(ServiceTime::parse("006:00:00").is_err());
        assert!(ServiceTime::parse("06:0:00").is_err());
        assert!(ServiceTime::parse("ab:cd:ef").is_err());
        assert!(ServiceTime::parse(":00:00").is_err());
    }

    #[test]
    fn parse_invalid_values() {
        assert!(ServiceTime::parse("48:00:00").is_err());
        assert!(ServiceTime::parse("12:60:00").is_err());
        assert!(ServiceTime::parse("12:00:60").is_err());
    }

    #[test]
    fn display_pads_components() {
        assert_eq!(ServiceTime::from_secs(0).to_string(), "00:00:00");
        assert_eq!(ServiceTime::from_secs(3723).to_string(), "01:02:03");
        assert_eq!(ServiceTime::from_secs(90_000).to_string(), "25:00:00");
    }

    #[test]
    fn from_naive_time_truncates_fraction() {
        let t = NaiveTime::from_hms_milli_opt(6, 0, 0, 900).unwrap();
        assert_eq!(
            ServiceTime::from_naive_time(t),
            ServiceTime::parse("06:00:00").unwrap()
        );
    }

    #[test]
    fn signed_duration_exact() {
        let departure = ServiceTime::parse("06:15:00").unwrap();

        assert_eq!(
            departure.signed_duration_since(hms(6, 10, 0)),
            Duration::minutes(5)
        );
        assert_eq!(
            departure.signed_duration_since(hms(6, 20, 0)),
            -Duration::minutes(5)
        );

        let now = NaiveTime::from_hms_milli_opt(6, 14, 59, 250).unwrap();
        assert_eq!(
            departure.signed_duration_since(now),
            Duration::milliseconds(750)
        );
    }

    #[test]
    fn until_midnight_from_late_evening() {
        assert_eq!(until_midnight(hms(23, 30, 0)), Duration::minutes(30));
        assert_eq!(until_midnight(hms(0, 0, 0)), Duration::hours(24));
    }

    #[test]
    fn serde_as_string() {
        let t = ServiceTime::parse("07:45:30").unwrap();
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(json, "\"07:45:30\"");

        let back: ServiceTime = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);

        assert!(serde_json::from_str::<ServiceTime>("\"7:45\"").is_err());
    }
}
