//! Integration tests for query geometry derivation.

use approx::assert_abs_diff_eq;
use lidarfetch_geo::{CoordinateProjector, Crs, Polygon, WORKING_CRS};

/// A few shapes around the US, in WGS84.
fn sample_polygons() -> Vec<Polygon> {
    vec![
        // Farmland near Ames, IA
        Polygon::from_bbox(-93.756155, 41.918015, -93.747334, 41.921429),
        // Ten-metre square at the corner of the Ames farm
        Polygon::from_bbox(-93.756155, 41.918015, -93.756055, 41.918115),
        // Triangle over the Puget Sound, explicitly closed
        Polygon::new([
            (-122.40, 47.55),
            (-122.30, 47.70),
            (-122.20, 47.55),
            (-122.40, 47.55),
        ]),
        // Concave pentagon in Colorado
        Polygon::new([
            (-105.30, 39.90),
            (-105.10, 39.90),
            (-105.20, 40.00),
            (-105.10, 40.10),
            (-105.30, 40.10),
        ]),
    ]
}

#[test]
fn test_bounding_box_ordered_for_all_samples() {
    let projector = CoordinateProjector::new();
    for polygon in sample_polygons() {
        let query = projector
            .query_geometry(&polygon, Crs::WGS84)
            .expect("Failed to derive query geometry");
        assert!(query.bounds.min_x <= query.bounds.max_x);
        assert!(query.bounds.min_y <= query.bounds.max_y);
        assert!(!query.bounds.is_degenerate());
    }
}

#[test]
fn test_clip_text_is_closed_ring() {
    let projector = CoordinateProjector::new();
    for polygon in sample_polygons() {
        let query = projector
            .query_geometry(&polygon, Crs::WGS84)
            .expect("Failed to derive query geometry");

        let text = query.clip.as_str();
        let inner = text
            .strip_prefix("POLYGON((")
            .and_then(|rest| rest.strip_suffix("))"))
            .expect("Clip text should be a WKT polygon");
        let pairs: Vec<&str> = inner.split(", ").collect();

        assert_eq!(pairs.len(), polygon.len() + 1, "Ring closed exactly once");
        assert_eq!(pairs.first(), pairs.last());
        assert!(!inner.ends_with(','));
    }
}

#[test]
fn test_clip_text_vertices_match_bounds() {
    let projector = CoordinateProjector::new();
    let polygon = Polygon::from_bbox(-93.756155, 41.918015, -93.747334, 41.921429);
    let query = projector
        .query_geometry(&polygon, Crs::WGS84)
        .expect("Failed to derive query geometry");

    let inner = &query.clip.as_str()["POLYGON((".len()..query.clip.as_str().len() - 2];
    for pair in inner.split(", ") {
        let mut parts = pair.split(' ');
        let x: f64 = parts.next().unwrap().parse().unwrap();
        let y: f64 = parts.next().unwrap().parse().unwrap();
        assert!(query.bounds.contains(x, y), "({}, {}) outside query bounds", x, y);
    }
}

#[test]
fn test_round_trip_through_working_crs() {
    let projector = CoordinateProjector::new();
    for polygon in sample_polygons() {
        let projected = projector
            .reproject(&polygon, Crs::WGS84, WORKING_CRS)
            .expect("Forward projection failed");
        let back = projector
            .reproject(&projected, WORKING_CRS, Crs::WGS84)
            .expect("Inverse projection failed");

        assert_eq!(back.len(), polygon.len());
        for (a, b) in polygon.vertices().iter().zip(back.vertices()) {
            assert_abs_diff_eq!(a.x, b.x, epsilon = 1e-6);
            assert_abs_diff_eq!(a.y, b.y, epsilon = 1e-6);
        }
    }
}

#[test]
fn test_round_trip_through_utm() {
    let projector = CoordinateProjector::new();
    let utm_15n = Crs::from_epsg(32615);
    let polygon = Polygon::from_bbox(-93.756155, 41.918015, -93.747334, 41.921429);

    let utm = projector
        .reproject(&polygon, Crs::WGS84, utm_15n)
        .expect("Projection to UTM failed");
    // Central Iowa sits a little west of the zone's central meridian (93°W)
    for c in utm.vertices() {
        assert!(c.x > 400_000.0 && c.x < 500_000.0, "easting {}", c.x);
        assert!(c.y > 4_600_000.0 && c.y < 4_700_000.0, "northing {}", c.y);
    }

    let back = projector
        .reproject(&utm, utm_15n, Crs::WGS84)
        .expect("Projection from UTM failed");
    for (a, b) in polygon.vertices().iter().zip(back.vertices()) {
        assert_abs_diff_eq!(a.x, b.x, epsilon = 1e-6);
        assert_abs_diff_eq!(a.y, b.y, epsilon = 1e-6);
    }
}

#[test]
fn test_query_geometry_from_working_crs_input() {
    // Input already in the working CRS is passed through untouched
    let projector = CoordinateProjector::new();
    let polygon = Polygon::from_bbox(-10_436_887.0, 5_148_706.0, -10_435_905.0, 5_149_217.0);
    let query = projector
        .query_geometry(&polygon, WORKING_CRS)
        .expect("Failed to derive query geometry");

    assert_eq!(
        query.bounds.to_bounds_text(),
        "([-10436887.0, -10435905.0],[5148706.0, 5149217.0])"
    );
    assert_eq!(
        query.clip.as_str(),
        "POLYGON((-10436887.0 5148706.0, -10436887.0 5149217.0, -10435905.0 5149217.0, \
         -10435905.0 5148706.0, -10436887.0 5148706.0))"
    );
}
