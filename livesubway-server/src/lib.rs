//! Real-time subway departure broadcasting.
//!
//! A static schedule table ([`schedule::ScheduleTable`]) is loaded once at
//! startup. The [`daemon::ScheduleDaemon`] wakes at every departure boundary
//! and publishes the departing trips through a [`broadcast::Broadcaster`];
//! the [`web`] layer relays those events to WebSocket clients and serves the
//! schedule and the route geometry ([`shapes`]) over HTTP.

pub mod broadcast;
pub mod config;
pub mod daemon;
pub mod domain;
pub mod schedule;
pub mod shapes;
pub mod web;
