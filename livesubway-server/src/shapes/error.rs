//! Errors from loading or writing route shape files.

use std::path::PathBuf;

/// Error reading shapes or writing the route collection.
#[derive(Debug, thiserror::Error)]
pub enum ShapeError {
    #[error("cannot access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed shapes JSON: {0}")]
    Json(#[from] serde_json::Error),
}
