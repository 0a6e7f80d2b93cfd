//! Domain types for the live subway schedule.
//!
//! All types enforce their invariants at construction time, so code that
//! receives them (the search routines, the daemon) can trust their validity.

mod day_type;
mod time;
mod trip;

pub use day_type::{DayType, InvalidDayType};
pub use time::{ServiceTime, TimeError, since_midnight, until_midnight};
pub use trip::{InvalidTripId, StopTime, Trip, TripId};
