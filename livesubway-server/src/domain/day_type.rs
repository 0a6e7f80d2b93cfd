//! Day-type partitioning of the schedule.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// Error returned when parsing an unknown day-type code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid day type: {0:?} (expected WKD, SAT or SUN)")]
pub struct InvalidDayType(pub String);

/// The schedule partition a calendar date runs on.
///
/// Monday through Friday share one weekday timetable; Saturday and Sunday
/// each have their own. Serialized with the feed suffixes `WKD`, `SAT`, `SUN`.
///
/// # Examples
///
/// ```
/// use livesubway_server::domain::DayType;
/// use chrono::NaiveDate;
///
/// let friday = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
/// assert_eq!(DayType::for_date(friday), DayType::Weekday);
///
/// let saturday = friday.succ_opt().unwrap();
/// assert_eq!(DayType::for_date(saturday), DayType::Saturday);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DayType {
    #[serde(rename = "WKD")]
    Weekday,
    #[serde(rename = "SAT")]
    Saturday,
    #[serde(rename = "SUN")]
    Sunday,
}

impl DayType {
    /// All day types, in table order.
    pub const ALL: [DayType; 3] = [DayType::Weekday, DayType::Saturday, DayType::Sunday];

    pub fn from_weekday(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Sat => DayType::Saturday,
            Weekday::Sun => DayType::Sunday,
            Weekday::Mon | Weekday::Tue | Weekday::Wed | Weekday::Thu | Weekday::Fri => {
                DayType::Weekday
            }
        }
    }

    /// Day type that the given calendar date runs on.
    pub fn for_date(date: NaiveDate) -> Self {
        Self::from_weekday(date.weekday())
    }

    /// The three-letter suffix used in feed trip IDs.
    pub fn code(&self) -> &'static str {
        match self {
            DayType::Weekday => "WKD",
            DayType::Saturday => "SAT",
            DayType::Sunday => "SUN",
        }
    }

    /// Parse a feed suffix (`WKD`, `SAT`, `SUN`), case-insensitively.
    pub fn from_code(code: &str) -> Result<Self, InvalidDayType> {
        DayType::ALL
            .into_iter()
            .find(|d| d.code().eq_ignore_ascii_case(code))
            .ok_or_else(|| InvalidDayType(code.to_string()))
    }
}

impl FromStr for DayType {
    type Err = InvalidDayType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s)
    }
}

impl fmt::Display for DayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
