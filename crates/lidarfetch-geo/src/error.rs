//! Error types for the geometry crate.

use thiserror::Error;

/// Errors that can occur while preparing query geometry.
#[derive(Debug, Error)]
pub enum GeometryError {
    /// Polygon has fewer vertices than a ring needs.
    #[error("Polygon needs at least 3 vertices, got {0}")]
    TooFewVertices(usize),

    /// A vertex coordinate is NaN or infinite.
    #[error("Vertex {index} has a non-finite coordinate ({x}, {y})")]
    NonFinite {
        /// Index of the offending vertex.
        index: usize,
        /// X coordinate as given.
        x: f64,
        /// Y coordinate as given.
        y: f64,
    },

    /// The CRS identifier could not be parsed.
    #[error("Invalid CRS identifier: {0}")]
    InvalidCrs(String),

    /// The EPSG code is not in the crs-definitions database.
    #[error("EPSG:{0} is not in the crs-definitions database")]
    UnsupportedCrs(u16),

    /// The projection library rejected a transformation.
    #[error("Transform from EPSG:{source_crs} to EPSG:{target_crs} failed: {reason}")]
    Transform {
        /// Source EPSG code.
        source_crs: u16,
        /// Target EPSG code.
        target_crs: u16,
        /// Reason reported by proj4rs.
        reason: String,
    },

    /// Bounding box corners are inverted.
    #[error("Invalid bounding box: min ({min_x}, {min_y}) exceeds max ({max_x}, {max_y})")]
    InvertedBounds {
        /// Minimum X.
        min_x: f64,
        /// Maximum X.
        max_x: f64,
        /// Minimum Y.
        min_y: f64,
        /// Maximum Y.
        max_y: f64,
    },
}
