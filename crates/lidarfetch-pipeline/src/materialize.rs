//! Turning engine point views into elevation tables.

use crate::{EngineOutput, PipelineError, PointView, Result};
use lidarfetch_geo::Crs;
use serde_json::{json, Value};
use tracing::debug;

/// A single elevation sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElevationPoint {
    /// Easting or longitude in the table's CRS.
    pub x: f64,
    /// Northing or latitude in the table's CRS.
    pub y: f64,
    /// Elevation.
    pub z: f64,
}

impl ElevationPoint {
    /// Planar location of the sample.
    pub fn geometry(&self) -> geo_types::Point<f64> {
        geo_types::Point::new(self.x, self.y)
    }
}

/// Elevation points sharing one coordinate reference system.
#[derive(Debug, Clone, PartialEq)]
pub struct ElevationTable {
    crs: Crs,
    points: Vec<ElevationPoint>,
}

impl ElevationTable {
    /// Wrap points that are all in `crs`.
    pub fn new(crs: Crs, points: Vec<ElevationPoint>) -> Self {
        Self { crs, points }
    }

    /// CRS of every point in the table.
    pub fn crs(&self) -> Crs {
        self.crs
    }

    /// Points in engine order.
    pub fn points(&self) -> &[ElevationPoint] {
        &self.points
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the table holds no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Iterate over the points.
    pub fn iter(&self) -> std::slice::Iter<'_, ElevationPoint> {
        self.points.iter()
    }

    /// Lowest and highest elevation, or `None` for an empty table.
    pub fn elevation_range(&self) -> Option<(f64, f64)> {
        self.points.iter().fold(None, |range, p| match range {
            None => Some((p.z, p.z)),
            Some((lo, hi)) => Some((lo.min(p.z), hi.max(p.z))),
        })
    }

    /// GeoJSON `FeatureCollection` with one `Point` feature per sample and
    /// the elevation stored as the `elevation` property.
    pub fn to_geojson(&self) -> Value {
        let features: Vec<Value> = self
            .points
            .iter()
            .map(|p| {
                json!({
                    "type": "Feature",
                    "geometry": {"type": "Point", "coordinates": [p.x, p.y]},
                    "properties": {"elevation": p.z},
                })
            })
            .collect();

        json!({
            "type": "FeatureCollection",
            "crs": {
                "type": "name",
                "properties": {"name": format!("urn:ogc:def:crs:EPSG::{}", self.crs.code())},
            },
            "features": features,
        })
    }
}

impl<'a> IntoIterator for &'a ElevationTable {
    type Item = &'a ElevationPoint;
    type IntoIter = std::slice::Iter<'a, ElevationPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

/// Converts engine output into [`ElevationTable`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultMaterializer;

impl ResultMaterializer {
    /// One point per row of `view`, taking X, Y and Z as-is.
    ///
    /// An empty view gives an empty table. Extra dimensions are ignored.
    pub fn from_rows(view: &PointView, crs: Crs) -> Result<ElevationTable> {
        if view.is_empty() {
            return Ok(ElevationTable::new(crs, Vec::new()));
        }

        let x = dimension(view, "X")?;
        let y = dimension(view, "Y")?;
        let z = dimension(view, "Z")?;

        let points = x
            .iter()
            .zip(y)
            .zip(z)
            .map(|((&x, &y), &z)| ElevationPoint { x, y, z })
            .collect();

        Ok(ElevationTable::new(crs, points))
    }

    /// One table per view, in the engine's order.
    pub fn from_output(output: &EngineOutput, crs: Crs) -> Result<Vec<ElevationTable>> {
        let tables = output
            .views
            .iter()
            .map(|view| Self::from_rows(view, crs))
            .collect::<Result<Vec<_>>>()?;

        debug!(
            tables = tables.len(),
            points = output.point_count(),
            crs = %crs,
            "Materialized elevation tables"
        );
        Ok(tables)
    }
}

fn dimension<'v>(view: &'v PointView, name: &str) -> Result<&'v [f64]> {
    view.column(name)
        .ok_or_else(|| PipelineError::MissingDimension(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn three_rows() -> PointView {
        PointView::from_rows(
            &["X", "Y", "Z"],
            vec![
                vec![1.0, 2.0, 3.0],
                vec![4.0, 5.0, 6.0],
                vec![7.0, 8.0, 9.0],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_three_rows() {
        let crs: Crs = "4326".parse().unwrap();
        let table = ResultMaterializer::from_rows(&three_rows(), crs).unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table.crs(), Crs::WGS84);
        assert_eq!(table.points()[1].z, 6.0);
        assert_eq!(table.points()[1].geometry(), geo_types::Point::new(4.0, 5.0));
        assert_eq!(
            table.iter().map(|p| p.x).collect::<Vec<_>>(),
            vec![1.0, 4.0, 7.0]
        );
    }

    #[test]
    fn test_empty_view() {
        let table = ResultMaterializer::from_rows(&PointView::empty(), Crs::WGS84).unwrap();
        assert!(table.is_empty());
        assert!(table.elevation_range().is_none());
    }

    #[test]
    fn test_missing_z() {
        let view = PointView::from_rows(&["X", "Y"], vec![vec![1.0, 2.0]]).unwrap();
        match ResultMaterializer::from_rows(&view, Crs::WGS84) {
            Err(PipelineError::MissingDimension(name)) => assert_eq!(name, "Z"),
            other => panic!("expected missing dimension, got {:?}", other),
        }
    }

    #[test]
    fn test_extra_dimensions_ignored() {
        let view = PointView::from_rows(
            &["Classification", "X", "Y", "Z"],
            vec![vec![2.0, 10.5, 20.25, 301.125]],
        )
        .unwrap();
        let table = ResultMaterializer::from_rows(&view, Crs::WEB_MERCATOR).unwrap();
        assert_eq!(
            table.points(),
            &[ElevationPoint { x: 10.5, y: 20.25, z: 301.125 }]
        );
    }

    #[test]
    fn test_one_table_per_view() {
        let output = EngineOutput::from_views(vec![three_rows(), PointView::empty()]);
        let tables = ResultMaterializer::from_output(&output, Crs::WGS84).unwrap();
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].len(), 3);
        assert!(tables[1].is_empty());
    }

    #[test]
    fn test_elevation_range() {
        let table = ResultMaterializer::from_rows(&three_rows(), Crs::WGS84).unwrap();
        let (lo, hi) = table.elevation_range().unwrap();
        assert_relative_eq!(lo, 3.0);
        assert_relative_eq!(hi, 9.0);
    }

    #[test]
    fn test_geojson() {
        let table = ResultMaterializer::from_rows(&three_rows(), Crs::WGS84).unwrap();
        let geojson = table.to_geojson();

        assert_eq!(geojson["type"], "FeatureCollection");
        assert_eq!(geojson["crs"]["properties"]["name"], "urn:ogc:def:crs:EPSG::4326");
        let features = geojson["features"].as_array().unwrap();
        assert_eq!(features.len(), 3);
        assert_eq!(features[2]["geometry"]["coordinates"], json!([7.0, 8.0]));
        assert_eq!(features[2]["properties"]["elevation"], json!(9.0));
    }
}
