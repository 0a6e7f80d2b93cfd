//! Build the map's static data files from a GTFS feed: the schedule table
//! from `stop_times.txt` and the route collection from `shapes.json`.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use livesubway_server::domain::DayType;
use livesubway_server::schedule::build_table_from_path;
use livesubway_server::shapes::{ShapeSet, build_routes, save_routes};

#[derive(Parser)]
#[command(about = "Build the subway map's static data files")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the schedule table from GTFS stop times
    Times {
        /// Path to the feed's stop_times.txt
        #[arg(long, default_value = "google_transit/stop_times.txt")]
        stop_times: PathBuf,

        /// Where to write the schedule table JSON
        #[arg(long, short, default_value = "map_files/times.json")]
        output: PathBuf,
    },

    /// Build the route collection, one line per route, from shapes
    Routes {
        /// Path to the shapes JSON
        #[arg(long, default_value = "map_files/shapes.json")]
        shapes: PathBuf,

        /// Where to write the GeoJSON route collection
        #[arg(long, short, default_value = "map_files/routes.json")]
        output: PathBuf,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match Args::parse().command {
        Command::Times { stop_times, output } => times(&stop_times, &output),
        Command::Routes { shapes, output } => routes(&shapes, &output),
    }
}

fn times(stop_times: &Path, output: &Path) -> ExitCode {
    let table = match build_table_from_path(stop_times) {
        Ok(table) => table,
        Err(e) => {
            error!(error = %e, "failed to build schedule");
            return ExitCode::FAILURE;
        }
    };

    for day_type in DayType::ALL {
        info!(%day_type, trips = table.day(day_type).len(), "built day schedule");
    }

    if let Err(e) = table.save(output) {
        error!(error = %e, "failed to write schedule");
        return ExitCode::FAILURE;
    }

    info!(path = %output.display(), trips = table.total_trips(), "schedule written");
    ExitCode::SUCCESS
}

fn routes(shapes: &Path, output: &Path) -> ExitCode {
    let shapes = match ShapeSet::load(shapes) {
        Ok(shapes) => shapes,
        Err(e) => {
            error!(error = %e, "failed to read shapes");
            return ExitCode::FAILURE;
        }
    };

    let routes = build_routes(&shapes);
    if let Err(e) = save_routes(&routes, output) {
        error!(error = %e, "failed to write routes");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
