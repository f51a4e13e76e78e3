//! Simple polygons described by a single exterior ring.

use crate::{GeometryError, Result};
use geo_types::{Coord, LineString};

/// A polygon given as an ordered ring of vertices.
///
/// The ring is stored implicitly closed: if the caller repeats the first
/// vertex at the end of a ring of four or more entries, that closing
/// duplicate is dropped on construction. Three entries are always kept, so
/// a ring collapsed to one location stays a valid, zero-area polygon.
/// Vertex order is kept exactly as given; orientation is never normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    vertices: Vec<Coord<f64>>,
}

impl Polygon {
    /// Create a polygon from `(x, y)` pairs.
    pub fn new<I>(vertices: I) -> Self
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        Self::from_coords(vertices.into_iter().map(|(x, y)| Coord { x, y }).collect())
    }

    /// Create a polygon from coordinates.
    pub fn from_coords(mut vertices: Vec<Coord<f64>>) -> Self {
        if vertices.len() > 3 && vertices.first() == vertices.last() {
            vertices.pop();
        }
        Self { vertices }
    }

    /// Axis-aligned rectangle, wound min-min, min-max, max-max, max-min.
    pub fn from_bbox(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self::new([
            (min_x, min_y),
            (min_x, max_y),
            (max_x, max_y),
            (max_x, min_y),
        ])
    }

    /// Vertices of the open ring.
    pub fn vertices(&self) -> &[Coord<f64>] {
        &self.vertices
    }

    /// Number of vertices, not counting the implicit closing vertex.
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Whether the polygon has no vertices at all.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Check that the polygon has a usable ring with finite coordinates.
    pub fn validate(&self) -> Result<()> {
        if self.vertices.len() < 3 {
            return Err(GeometryError::TooFewVertices(self.vertices.len()));
        }
        for (index, c) in self.vertices.iter().enumerate() {
            if !c.x.is_finite() || !c.y.is_finite() {
                return Err(GeometryError::NonFinite {
                    index,
                    x: c.x,
                    y: c.y,
                });
            }
        }
        Ok(())
    }

    /// Iterate over the ring with the first vertex repeated at the end.
    pub fn closed_ring(&self) -> impl Iterator<Item = &Coord<f64>> + '_ {
        self.vertices.iter().chain(self.vertices.first())
    }
}

impl From<&geo_types::Polygon<f64>> for Polygon {
    /// Takes the exterior ring; interior rings are ignored.
    fn from(polygon: &geo_types::Polygon<f64>) -> Self {
        Self::from_coords(polygon.exterior().0.clone())
    }
}

impl From<&Polygon> for geo_types::Polygon<f64> {
    fn from(polygon: &Polygon) -> Self {
        geo_types::Polygon::new(LineString::from(polygon.vertices.clone()), vec![])
    }
}
