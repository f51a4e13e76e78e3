//! Axis-aligned bounding boxes.

use crate::{fmt_coord, GeometryError, Result};

/// Axis-aligned bounding box.
///
/// Zero-area boxes are allowed; callers should treat them as a boundary
/// condition (see [`BoundingBox::is_degenerate`]).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Minimum X (west edge).
    pub min_x: f64,
    /// Maximum X (east edge).
    pub max_x: f64,
    /// Minimum Y (south edge).
    pub min_y: f64,
    /// Maximum Y (north edge).
    pub max_y: f64,
}

impl BoundingBox {
    /// Create a bounding box, rejecting inverted corners.
    pub fn new(min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> Result<Self> {
        if min_x > max_x || min_y > max_y {
            return Err(GeometryError::InvertedBounds {
                min_x,
                max_x,
                min_y,
                max_y,
            });
        }
        Ok(Self {
            min_x,
            max_x,
            min_y,
            max_y,
        })
    }

    /// Width along the X axis.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height along the Y axis.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// True when the box has zero area.
    pub fn is_degenerate(&self) -> bool {
        self.width() == 0.0 || self.height() == 0.0
    }

    /// Check if a coordinate is within the bounds.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Check if two boxes overlap (touching edges count).
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_x <= other.max_x
            && other.min_x <= self.max_x
            && self.min_y <= other.max_y
            && other.min_y <= self.max_y
    }

    /// Reader bounds syntax: `([minX, maxX],[minY, maxY])`.
    pub fn to_bounds_text(&self) -> String {
        format!(
            "([{}, {}],[{}, {}])",
            fmt_coord(self.min_x),
            fmt_coord(self.max_x),
            fmt_coord(self.min_y),
            fmt_coord(self.max_y)
        )
    }
}
