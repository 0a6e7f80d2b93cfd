//! Route geometry: the per-shape point lists of the feed and the map's
//! per-line route collection derived from them.
//!
//! `shapes.json` maps a shape ID such as `1..N03R` to its points. The map
//! draws one line per route, so [`build_routes`] keeps the longest
//! northbound shape of each line.

mod error;
mod routes;

use std::collections::BTreeMap;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::info;

pub use error::ShapeError;
pub use routes::{DEFAULT_COLOR, build_routes, save_routes};

/// A `[lon, lat]` pair.
pub type Point = [f64; 2];

/// One shape of the feed: an ordered polyline for a line and direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    /// Number of points; feeds write it as a number or a numeric string
    #[serde(deserialize_with = "count_from_number_or_string")]
    pub sequence: u64,

    /// Route color, `#RRGGBB` (some lines have none)
    #[serde(default)]
    pub color: String,

    pub points: Vec<Point>,
}

impl Shape {
    /// Line name: the shape ID up to its first `.`.
    pub fn line_of(shape_id: &str) -> &str {
        shape_id.find('.').map_or(shape_id, |dot| &shape_id[..dot])
    }

    /// Direction code: the character after the shape ID's last `.`.
    pub fn direction_of(shape_id: &str) -> Option<char> {
        shape_id
            .rfind('.')
            .and_then(|dot| shape_id[dot + 1..].chars().next())
    }
}

/// All shapes of a feed, by shape ID.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShapeSet {
    shapes: BTreeMap<String, Shape>,
}

impl ShapeSet {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ShapeError> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Load `shapes.json`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ShapeError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| ShapeError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let shapes = Self::from_reader(BufReader::new(file))?;
        info!(path = %path.display(), shapes = shapes.len(), "loaded route shapes");
        Ok(shapes)
    }

    pub fn get(&self, shape_id: &str) -> Option<&Shape> {
        self.shapes.get(shape_id)
    }

    /// Shapes in shape-ID order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Shape)> {
        self.shapes.iter().map(|(id, shape)| (id.as_str(), shape))
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

impl FromIterator<(String, Shape)> for ShapeSet {
    fn from_iter<I: IntoIterator<Item = (String, Shape)>>(iter: I) -> Self {
        Self {
            shapes: iter.into_iter().collect(),
        }
    }
}

fn count_from_number_or_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Count {
        Number(u64),
        Text(String),
    }

    match Count::deserialize(deserializer)? {
        Count::Number(n) => Ok(n),
        Count::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}
