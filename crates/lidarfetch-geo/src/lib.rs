//! # lidarfetch-geo
//!
//! Query geometry for USGS 3DEP point-cloud requests.
//!
//! The USGS public LiDAR archive indexes its Entwine Point Tile datasets in
//! Web Mercator (EPSG:3857). A user polygon arrives in whatever CRS the caller
//! works in, so before a request can be made the polygon is:
//!
//! - reprojected into the working CRS,
//! - reduced to a bounding box for the reader's spatial query, and
//! - serialized as a WKT polygon for clipping the returned points exactly.
//!
//! ## Example
//!
//! ```no_run
//! use lidarfetch_geo::{CoordinateProjector, Crs, Polygon};
//!
//! let polygon = Polygon::from_bbox(-93.756155, 41.918015, -93.747334, 41.921429);
//! let projector = CoordinateProjector::new();
//!
//! let query = projector.query_geometry(&polygon, Crs::WGS84)?;
//! println!("bounds: {}", query.bounds.to_bounds_text());
//! println!("clip:   {}", query.clip);
//! # Ok::<(), lidarfetch_geo::GeometryError>(())
//! ```

mod bounds;
mod crs;
mod error;
mod polygon;
mod projector;

pub use bounds::BoundingBox;
pub use crs::{Crs, WORKING_CRS};
pub use error::GeometryError;
pub use polygon::Polygon;
pub use projector::{ClipGeometry, CoordinateProjector, QueryGeometry};

/// Result type for geometry operations.
pub type Result<T> = std::result::Result<T, GeometryError>;

/// Render a coordinate in shortest round-trip form, always with a decimal
/// point (`1.0`, not `1`), matching the archive tooling's number syntax.
pub(crate) fn fmt_coord(value: f64) -> String {
    format!("{:?}", value)
}
