//! Polygon reprojection and query geometry derivation.

use crate::{fmt_coord, BoundingBox, Crs, GeometryError, Polygon, Result, WORKING_CRS};
use geo_types::Coord;
use proj4rs::proj::Proj;
use std::fmt;
use tracing::{debug, warn};

/// WKT polygon used to clip returned points to the exact user shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipGeometry(String);

impl ClipGeometry {
    /// The WKT text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the WKT text.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ClipGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Bounding box and clip geometry for one request, both in the working CRS.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryGeometry {
    /// Box handed to the reader's spatial query.
    pub bounds: BoundingBox,
    /// Polygon handed to the crop stage.
    pub clip: ClipGeometry,
}

/// Point transformer between two EPSG codes using proj4rs.
struct Transformer {
    source: Crs,
    target: Crs,
    source_proj: Proj,
    target_proj: Proj,
    source_is_geographic: bool,
    target_is_geographic: bool,
}

impl Transformer {
    fn new(source: Crs, target: Crs) -> Result<Self> {
        let source_str = source
            .proj_string()
            .ok_or(GeometryError::UnsupportedCrs(source.code()))?;
        let target_str = target
            .proj_string()
            .ok_or(GeometryError::UnsupportedCrs(target.code()))?;

        let source_proj =
            Proj::from_proj_string(source_str).map_err(|e| GeometryError::Transform {
                source_crs: source.code(),
                target_crs: target.code(),
                reason: format!("invalid source projection: {:?}", e),
            })?;
        let target_proj =
            Proj::from_proj_string(target_str).map_err(|e| GeometryError::Transform {
                source_crs: source.code(),
                target_crs: target.code(),
                reason: format!("invalid target projection: {:?}", e),
            })?;

        Ok(Self {
            source,
            target,
            source_proj,
            target_proj,
            source_is_geographic: source.is_geographic(),
            target_is_geographic: target.is_geographic(),
        })
    }

    fn transform(&self, c: Coord<f64>) -> Result<Coord<f64>> {
        // proj4rs works in radians for geographic systems
        let mut point = if self.source_is_geographic {
            (c.x.to_radians(), c.y.to_radians(), 0.0)
        } else {
            (c.x, c.y, 0.0)
        };

        proj4rs::transform::transform(&self.source_proj, &self.target_proj, &mut point).map_err(
            |e| GeometryError::Transform {
                source_crs: self.source.code(),
                target_crs: self.target.code(),
                reason: format!("{:?}", e),
            },
        )?;

        let (x, y) = if self.target_is_geographic {
            (point.0.to_degrees(), point.1.to_degrees())
        } else {
            (point.0, point.1)
        };

        if !x.is_finite() || !y.is_finite() {
            return Err(GeometryError::Transform {
                source_crs: self.source.code(),
                target_crs: self.target.code(),
                reason: format!("({}, {}) has no finite image", c.x, c.y),
            });
        }

        Ok(Coord { x, y })
    }
}

/// Reprojects user polygons and derives the archive's query geometry.
///
/// The projector is stateless apart from the working CRS, so one instance can
/// serve any number of requests.
#[derive(Debug, Clone, Copy)]
pub struct CoordinateProjector {
    working_crs: Crs,
}

impl Default for CoordinateProjector {
    fn default() -> Self {
        Self::new()
    }
}

impl CoordinateProjector {
    /// Create a projector targeting the archive's working CRS.
    pub fn new() -> Self {
        Self {
            working_crs: WORKING_CRS,
        }
    }

    /// The CRS query geometry is expressed in.
    pub fn working_crs(&self) -> Crs {
        self.working_crs
    }

    /// Transform every vertex of `polygon` from `source` to `target`.
    pub fn reproject(&self, polygon: &Polygon, source: Crs, target: Crs) -> Result<Polygon> {
        polygon.validate()?;

        if source == target {
            return Ok(polygon.clone());
        }

        let transformer = Transformer::new(source, target)?;
        let vertices = polygon
            .vertices()
            .iter()
            .map(|c| transformer.transform(*c))
            .collect::<Result<Vec<_>>>()?;

        Ok(Polygon::from_coords(vertices))
    }

    /// Bounding box of all vertices.
    pub fn bounding_box(&self, polygon: &Polygon) -> Result<BoundingBox> {
        polygon.validate()?;

        let first = polygon.vertices()[0];
        let (mut min_x, mut max_x, mut min_y, mut max_y) = (first.x, first.x, first.y, first.y);
        for c in &polygon.vertices()[1..] {
            min_x = min_x.min(c.x);
            max_x = max_x.max(c.x);
            min_y = min_y.min(c.y);
            max_y = max_y.max(c.y);
        }

        let bounds = BoundingBox::new(min_x, max_x, min_y, max_y)?;
        if bounds.is_degenerate() {
            warn!(
                bounds = %bounds.to_bounds_text(),
                "Polygon has a zero-area bounding box"
            );
        }
        Ok(bounds)
    }

    /// WKT text of the polygon, ring explicitly closed.
    pub fn clip_geometry(&self, polygon: &Polygon) -> Result<ClipGeometry> {
        polygon.validate()?;

        let pairs: Vec<String> = polygon
            .closed_ring()
            .map(|c| format!("{} {}", fmt_coord(c.x), fmt_coord(c.y)))
            .collect();

        Ok(ClipGeometry(format!("POLYGON(({}))", pairs.join(", "))))
    }

    /// Reproject `polygon` into the working CRS and derive its query box and
    /// clip geometry.
    pub fn query_geometry(&self, polygon: &Polygon, source: Crs) -> Result<QueryGeometry> {
        let projected = self.reproject(polygon, source, self.working_crs)?;
        let bounds = self.bounding_box(&projected)?;
        let clip = self.clip_geometry(&projected)?;

        debug!(
            source = %source,
            working = %self.working_crs,
            bounds = %bounds.to_bounds_text(),
            "Derived query geometry"
        );

        Ok(QueryGeometry { bounds, clip })
    }
}
