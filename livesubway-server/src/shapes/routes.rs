//! The map's route collection: one GeoJSON `LineString` per line.

use std::collections::BTreeMap;
use std::io::BufWriter;
use std::path::Path;

use geojson::{Feature, FeatureCollection, Geometry, Value};
use tracing::info;

use super::{Shape, ShapeError, ShapeSet};

/// Color for shapes the feed gives none.
pub const DEFAULT_COLOR: &str = "#2850AD";

/// Pick the longest northbound shape of every line, in line order.
///
/// Southbound shapes retrace the same track and are left out. Ties keep the
/// shape whose ID sorts first. Each feature carries `color`, `length` (the
/// point count) and `route_id` properties.
pub fn build_routes(shapes: &ShapeSet) -> FeatureCollection {
    let mut longest: BTreeMap<&str, &Shape> = BTreeMap::new();

    for (shape_id, shape) in shapes.iter() {
        if Shape::direction_of(shape_id) != Some('N') {
            continue;
        }
        let line = Shape::line_of(shape_id);
        match longest.get(line) {
            Some(best) if best.sequence >= shape.sequence => {}
            _ => {
                longest.insert(line, shape);
            }
        }
    }

    let features = longest
        .into_iter()
        .map(|(line, shape)| {
            let coordinates = shape.points.iter().map(|point| point.to_vec()).collect();
            let mut feature = Feature::from(Geometry::new(Value::LineString(coordinates)));
            feature.set_property("color", route_color(&shape.color));
            feature.set_property("length", shape.sequence);
            feature.set_property("route_id", line);
            feature
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

/// Write a route collection as JSON.
pub fn save_routes(routes: &FeatureCollection, path: impl AsRef<Path>) -> Result<(), ShapeError> {
    let path = path.as_ref();
    let file = std::fs::File::create(path).map_err(|source| ShapeError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::to_writer(BufWriter::new(file), routes)?;
    info!(path = %path.display(), routes = routes.features.len(), "wrote route collection");
    Ok(())
}

fn route_color(color: &str) -> &str {
    if color.len() > 1 && color.starts_with('#') {
        color
    } else {
        DEFAULT_COLOR
    }
}
