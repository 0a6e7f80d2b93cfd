//! Schedule table and the lookups the daemon is built on.
//!
//! The table is loaded (or built offline from a GTFS feed) once and never
//! mutated. Lookups are pure functions over a day's sorted trips:
//! [`find_next`] locates the next departure by binary search and
//! [`active_before`] finds trips that have departed but not finished.

mod active;
mod build;
mod error;
mod index;
mod snapshot;
mod table;

pub use active::{active_before, progress};
pub use build::{build_table, build_table_from_path};
pub use error::ScheduleError;
pub use index::{boundary_end, find_next};
pub use snapshot::ScheduleSnapshot;
pub use table::{DaySchedule, ScheduleTable};
