//! Background tasks: the schedule daemon and the heartbeat.

mod clock;
mod error;
mod heartbeat;
mod schedule_daemon;
mod task;
mod wait;

pub use clock::{Clock, SystemClock};
pub use error::DaemonError;
pub use heartbeat::HeartbeatTask;
pub use schedule_daemon::ScheduleDaemon;
pub use task::TaskHandle;
pub use wait::{Wait, plan_wait};
