//! Periodic keepalive events, independent of departures.

use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::broadcast::{Broadcaster, Event, Heartbeat};

use super::clock::Clock;
use super::task::TaskHandle;

/// Publishes an `update` event every `interval`, starting immediately.
#[derive(Debug)]
pub struct HeartbeatTask<B, C> {
    broadcaster: B,
    clock: C,
    interval: Duration,
}

impl<B: Broadcaster, C: Clock> HeartbeatTask<B, C> {
    pub fn new(broadcaster: B, clock: C, interval: Duration) -> Self {
        Self {
            broadcaster,
            clock,
            interval,
        }
    }

    pub fn spawn(self) -> TaskHandle {
        TaskHandle::spawn("heartbeat", |cancel| self.run(cancel))
    }

    pub async fn run(self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        debug!(interval_secs = self.interval.as_secs(), "heartbeat started");

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => self.beat(),
            }
        }

        debug!("heartbeat stopped");
    }

    fn beat(&self) {
        let sent_at = self.clock.now().format("%Y-%m-%dT%H:%M:%S").to_string();
        match self.broadcaster.publish(Event::Update(Heartbeat { sent_at })) {
            Ok(subscribers) => trace!(subscribers, "heartbeat sent"),
            Err(e) => trace!(error = %e, "heartbeat not delivered"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::ChannelBroadcaster;
    use crate::daemon::clock::PausedClock;
    use chrono::NaiveDate;

    #[tokio::test(start_paused = true)]
    async fn beats_at_each_interval() {
        let broadcaster = ChannelBroadcaster::new(16);
        let mut rx = broadcaster.subscribe();
        let start = NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let clock = PausedClock::starting_at(start);
        let handle =
            HeartbeatTask::new(broadcaster.clone(), clock, Duration::from_secs(5)).spawn();

        let mut sent = Vec::new();
        for _ in 0..3 {
            match &*rx.recv().await.unwrap() {
                Event::Update(heartbeat) => sent.push(heartbeat.sent_at.clone()),
                other => panic!("expected update event, got {other:?}"),
            }
        }
        assert_eq!(
            sent,
            vec![
                "2024-03-15T12:00:00",
                "2024-03-15T12:00:05",
                "2024-03-15T12:00:10"
            ]
        );

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn keeps_beating_without_subscribers() {
        let broadcaster = ChannelBroadcaster::new(16);
        let clock = PausedClock::starting_at(
            NaiveDate::from_ymd_opt(2024, 3, 15)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
        );
        let handle =
            HeartbeatTask::new(broadcaster.clone(), clock, Duration::from_secs(5)).spawn();

        tokio::time::sleep(Duration::from_secs(12)).await;
        let mut rx = broadcaster.subscribe();

        let event = rx.recv().await.unwrap();
        assert_eq!(event.name(), "update");
        assert!(!handle.is_finished());

        handle.shutdown().await;
    }
}
