use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use livesubway_server::broadcast::ChannelBroadcaster;
use livesubway_server::config::ServerConfig;
use livesubway_server::daemon::{HeartbeatTask, ScheduleDaemon, SystemClock};
use livesubway_server::schedule::ScheduleTable;
use livesubway_server::shapes::ShapeSet;
use livesubway_server::web::{AppState, create_router};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    // A table that fails to load or validate is fatal; the daemon never starts.
    let table = match ScheduleTable::load(&config.schedule_path) {
        Ok(table) => Arc::new(table),
        Err(e) => {
            error!(error = %e, "failed to load schedule");
            return ExitCode::FAILURE;
        }
    };

    // The map still works without route lines, so missing shapes are not fatal.
    let shapes = match ShapeSet::load(&config.shapes_path) {
        Ok(shapes) => Arc::new(shapes),
        Err(e) => {
            warn!(error = %e, "route shapes unavailable, serving none");
            Arc::new(ShapeSet::default())
        }
    };

    let broadcaster = ChannelBroadcaster::new(config.channel_capacity);

    let daemon = ScheduleDaemon::new(
        table.clone(),
        broadcaster.clone(),
        SystemClock,
        config.daemon.clone(),
    )
    .spawn();
    let heartbeat =
        HeartbeatTask::new(broadcaster.clone(), SystemClock, config.heartbeat_interval).spawn();

    let state = AppState::new(table, shapes, broadcaster, SystemClock);
    let app = create_router(state, &config.map_dir);

    let listener = match tokio::net::TcpListener::bind(config.addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(addr = %config.addr, error = %e, "failed to bind");
            return ExitCode::FAILURE;
        }
    };
    info!(addr = %config.addr, "listening on http://{}", config.addr);
    info!("  GET /health               - Health check");
    info!("  GET /api/status           - Next departures and trips in service");
    info!("  GET /api/schedule/:day    - Full schedule for WKD, SAT or SUN");
    info!("  GET /api/shapes/:shape    - Points of one route shape");
    info!("  GET /api/routes           - Route lines as GeoJSON");
    info!("  GET /ws                   - Live schedule and update events");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    heartbeat.shutdown().await;
    daemon.shutdown().await;

    match served {
        Ok(()) => {
            info!("server stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "server failed");
            ExitCode::FAILURE
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
