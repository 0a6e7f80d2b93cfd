//! Runtime configuration for the server and its background tasks.
//!
//! Every setting has a default; environment variables override them.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::broadcast::{DEFAULT_CAPACITY, MAX_CAPACITY};

/// Path of the schedule table JSON.
pub const SCHEDULE_VAR: &str = "LIVESUBWAY_SCHEDULE";
/// Path of the feed's route shapes JSON.
pub const SHAPES_VAR: &str = "LIVESUBWAY_SHAPES";
/// Directory served under `/map_files`.
pub const MAP_DIR_VAR: &str = "LIVESUBWAY_MAP_DIR";
/// Socket address to listen on.
pub const ADDR_VAR: &str = "LIVESUBWAY_ADDR";
/// Seconds between heartbeat events.
pub const HEARTBEAT_VAR: &str = "LIVESUBWAY_HEARTBEAT_SECS";
/// Events buffered per subscriber.
pub const CAPACITY_VAR: &str = "LIVESUBWAY_CHANNEL_CAPACITY";

/// Longest accepted heartbeat interval, one day.
const MAX_HEARTBEAT_SECS: usize = 24 * 60 * 60;

/// Error for a configuration value that cannot be used.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {var}={value:?}: {reason}")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
    pub reason: String,
}

/// Configuration for the schedule daemon loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonConfig {
    /// How long to wait before re-initialising after a failed cycle.
    /// Keeps a persistent fault from spinning the loop.
    pub error_backoff: Duration,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            error_backoff: Duration::from_secs(1),
        }
    }
}

/// Configuration for the whole server process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub schedule_path: PathBuf,
    pub shapes_path: PathBuf,
    pub map_dir: PathBuf,
    pub addr: SocketAddr,

    /// Interval between heartbeat (`update`) events.
    pub heartbeat_interval: Duration,

    /// Events buffered per subscriber before a slow one starts missing events.
    pub channel_capacity: usize,

    pub daemon: DaemonConfig,
}

impl ServerConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build the configuration from a variable lookup, falling back to the
    /// defaults for anything unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = lookup(SCHEDULE_VAR) {
            config.schedule_path = PathBuf::from(path);
        }
        if let Some(path) = lookup(SHAPES_VAR) {
            config.shapes_path = PathBuf::from(path);
        }
        if let Some(dir) = lookup(MAP_DIR_VAR) {
            config.map_dir = PathBuf::from(dir);
        }
        if let Some(addr) = lookup(ADDR_VAR) {
            config.addr = addr.parse().map_err(|e: std::net::AddrParseError| ConfigError {
                var: ADDR_VAR,
                value: addr.clone(),
                reason: e.to_string(),
            })?;
        }
        if let Some(secs) = lookup(HEARTBEAT_VAR) {
            let secs = parse_bounded(HEARTBEAT_VAR, &secs, MAX_HEARTBEAT_SECS)?;
            config.heartbeat_interval = Duration::from_secs(secs as u64);
        }
        if let Some(capacity) = lookup(CAPACITY_VAR) {
            config.channel_capacity = parse_bounded(CAPACITY_VAR, &capacity, MAX_CAPACITY)?;
        }

        Ok(config)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            schedule_path: PathBuf::from("map_files/times.json"),
            shapes_path: PathBuf::from("map_files/shapes.json"),
            map_dir: PathBuf::from("map_files"),
            addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
            heartbeat_interval: Duration::from_secs(5),
            channel_capacity: DEFAULT_CAPACITY,
            daemon: DaemonConfig::default(),
        }
    }
}

/// Parse a whole number in `1..=max`.
fn parse_bounded(var: &'static str, value: &str, max: usize) -> Result<usize, ConfigError> {
    let invalid = |reason: String| ConfigError {
        var,
        value: value.to_string(),
        reason,
    };
    match value.trim().parse::<usize>() {
        Ok(0) => Err(invalid("must be at least 1".to_string())),
        Ok(n) if n > max => Err(invalid(format!("must be at most {max}"))),
        Ok(n) => Ok(n),
        Err(_) => Err(invalid("not a whole number".to_string())),
    }
}
