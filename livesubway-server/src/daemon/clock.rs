//! Wall-clock source for the daemon and the status endpoint.

use std::sync::Arc;

use chrono::{Local, NaiveDateTime};

/// Source of the current local date and time.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> NaiveDateTime;
}

/// The system's local clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> NaiveDateTime {
        (**self).now()
    }
}

/// Clock driven by tokio's (pausable) timer, starting at a fixed instant.
///
/// With tokio time paused, sleeping advances this clock by exactly the
/// slept duration.
#[cfg(test)]
#[derive(Debug, Clone)]
pub(crate) struct PausedClock {
    origin: NaiveDateTime,
    started: tokio::time::Instant,
}

#[cfg(test)]
impl PausedClock {
    pub(crate) fn starting_at(origin: NaiveDateTime) -> Self {
        Self {
            origin,
            started: tokio::time::Instant::now(),
        }
    }
}

#[cfg(test)]
impl Clock for PausedClock {
    fn now(&self) -> NaiveDateTime {
        let elapsed = chrono::Duration::from_std(self.started.elapsed())
            .unwrap_or_else(|_| chrono::Duration::zero());
        self.origin + elapsed
    }
}
