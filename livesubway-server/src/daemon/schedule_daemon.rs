//! The schedule daemon: wakes at each departure boundary and broadcasts the
//! trips leaving at that instant.
//!
//! Each calendar day runs as one pass: initialise from the live clock, then
//! repeatedly sleep until the next boundary, emit its batch, advance the
//! cursor and refresh the set of trips in service. When the day's trips run
//! out the daemon sleeps until midnight and initialises again for the new
//! day.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::broadcast::{BroadcastError, Broadcaster, Event};
use crate::config::DaemonConfig;
use crate::domain::{DayType, ServiceTime, Trip};
use crate::schedule::{ScheduleSnapshot, ScheduleTable, active_before, boundary_end};

use super::clock::Clock;
use super::error::DaemonError;
use super::task::TaskHandle;
use super::wait::{Wait, plan_wait};

/// Broadcasts departure batches from a [`ScheduleTable`] in real time.
pub struct ScheduleDaemon<B, C> {
    table: Arc<ScheduleTable>,
    broadcaster: B,
    clock: C,
    config: DaemonConfig,
}

/// Per-day state, rebuilt from the clock at every initialisation.
#[derive(Debug, Clone, PartialEq, Eq)]
struct DaemonState {
    date: NaiveDate,
    day_type: DayType,
    cursor: usize,
    active: BTreeSet<usize>,
}

/// How a day's pass ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DayEnd {
    Rollover,
    Cancelled,
}

impl DaemonState {
    fn init(table: &ScheduleTable, now: NaiveDateTime) -> Self {
        let snapshot = ScheduleSnapshot::at(table, now);
        Self {
            date: now.date(),
            day_type: snapshot.day_type,
            cursor: snapshot.cursor,
            active: snapshot.active,
        }
    }

    /// Take every trip sharing the cursor's departure time and advance the
    /// cursor past them.
    fn collect_batch(&mut self, trips: &[Trip], now: ServiceTime) -> Result<Vec<Trip>, DaemonError> {
        if self.cursor >= trips.len() {
            return Err(DaemonError::SequenceExhausted {
                day_type: self.day_type,
                cursor: self.cursor,
                now,
            });
        }

        let end = boundary_end(trips, self.cursor);
        let batch = trips[self.cursor..end].to_vec();
        self.cursor = end;
        Ok(batch)
    }
}

impl<B: Broadcaster, C: Clock> ScheduleDaemon<B, C> {
    pub fn new(table: Arc<ScheduleTable>, broadcaster: B, clock: C, config: DaemonConfig) -> Self {
        Self {
            table,
            broadcaster,
            clock,
            config,
        }
    }

    /// Run the daemon on a background task.
    pub fn spawn(self) -> TaskHandle {
        TaskHandle::spawn("schedule daemon", |cancel| self.run(cancel))
    }

    /// Run until `cancel` fires.
    ///
    /// Cycle failures are logged and followed by a back-off and a fresh
    /// initialisation; they never end the loop.
    pub async fn run(self, cancel: CancellationToken) {
        info!(trips = self.table.total_trips(), "schedule daemon started");

        loop {
            let mut state = DaemonState::init(&self.table, self.clock.now());
            info!(
                date = %state.date,
                day_type = %state.day_type,
                cursor = state.cursor,
                active = state.active.len(),
                trips = self.table.day(state.day_type).len(),
                "schedule initialised"
            );

            match self.run_day(&mut state, &cancel).await {
                Ok(DayEnd::Rollover) => continue,
                Ok(DayEnd::Cancelled) => break,
                Err(e) => {
                    error!(error = %e, cursor = state.cursor, "schedule cycle failed, reinitialising");
                    if !sleep_or_cancel(self.config.error_backoff, &cancel).await {
                        break;
                    }
                }
            }
        }

        info!("schedule daemon stopped");
    }

    async fn run_day(
        &self,
        state: &mut DaemonState,
        cancel: &CancellationToken,
    ) -> Result<DayEnd, DaemonError> {
        let trips = self.table.day(state.day_type).trips();
        if trips.is_empty() {
            info!(day_type = %state.day_type, "no service today");
        }

        loop {
            let now = self.clock.now();
            if now.date() != state.date {
                debug!(from = %state.date, to = %now.date(), "calendar date changed");
                return Ok(DayEnd::Rollover);
            }

            match plan_wait(trips, state.cursor, now.time()) {
                Wait::EndOfDay { delay, skipped } => {
                    let running =
                        active_before(trips, state.cursor, ServiceTime::from_naive_time(now.time()));
                    if skipped > 0 || !running.is_empty() {
                        debug!(
                            day_type = %state.day_type,
                            after_midnight = skipped,
                            still_running = running.len(),
                            "trips past midnight are not carried into the next day"
                        );
                    }
                    info!(
                        day_type = %state.day_type,
                        wait_secs = delay.as_secs(),
                        "no more departures today, waiting for midnight"
                    );
                    return Ok(if sleep_or_cancel(delay, cancel).await {
                        DayEnd::Rollover
                    } else {
                        DayEnd::Cancelled
                    });
                }
                Wait::Departure { boundary, delay } => {
                    debug!(%boundary, cursor = state.cursor, wait_ms = delay.as_millis() as u64, "waiting for departure");
                    if !sleep_or_cancel(delay, cancel).await {
                        return Ok(DayEnd::Cancelled);
                    }
                }
            }

            let now = ServiceTime::from_naive_time(self.clock.now().time());
            let batch = state.collect_batch(trips, now)?;
            self.emit(batch);
            state.active = active_before(trips, state.cursor, now);
        }
    }

    fn emit(&self, batch: Vec<Trip>) {
        let boundary = batch.first().map(|trip| trip.init_time);
        let size = batch.len();

        match self.broadcaster.publish(Event::Schedule(batch)) {
            Ok(subscribers) => {
                info!(boundary = ?boundary, trips = size, subscribers, "schedule batch emitted")
            }
            Err(e @ BroadcastError::NoSubscribers { .. }) => {
                debug!(boundary = ?boundary, trips = size, error = %e, "schedule batch not delivered")
            }
        }
    }
}

/// Sleep for `delay` unless cancelled first. Returns `false` on cancellation.
pub(crate) async fn sleep_or_cancel(delay: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}

impl<B, C> std::fmt::Debug for ScheduleDaemon<B, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduleDaemon")
            .field("trips", &self.table.total_trips())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
