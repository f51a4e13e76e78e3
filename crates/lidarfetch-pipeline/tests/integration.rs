//! End-to-end tests for lidarfetch-pipeline.
//!
//! Most tests use an in-memory engine. `test_live_pdal_fetch` needs the `pdal`
//! executable on PATH and network access, and skips itself otherwise.

use lidarfetch_geo::{CoordinateProjector, Crs, Polygon};
use lidarfetch_pipeline::{
    ElevationFetcher, ElevationRequest, EngineError, EngineOutput, OutputPaths, PdalCommand,
    PipelineDescription, PipelineError, PipelineTemplate, PipelineTemplateBinder,
    PointCloudEngine, PointView, RasterOptions, StageRole,
};
use std::process::Command;

/// Returns two fixed points. The second point's elevation is the number of
/// stages it was asked to run.
struct EchoEngine;

impl PointCloudEngine for EchoEngine {
    fn execute(&self, description: &PipelineDescription) -> Result<EngineOutput, EngineError> {
        let view = PointView::from_rows(
            &["X", "Y", "Z", "Classification"],
            vec![
                vec![-93.7515, 41.9195, 300.5, 2.0],
                vec![-93.7510, 41.9200, description.len() as f64, 2.0],
            ],
        )
        .map_err(|e| EngineError::Output(e.to_string()))?;
        Ok(EngineOutput::from_views(vec![view]))
    }
}

fn ames_farm() -> Polygon {
    Polygon::new(vec![
        (-93.756155, 41.918015),
        (-93.756155, 41.921429),
        (-93.747334, 41.921429),
        (-93.747334, 41.918015),
    ])
}

#[test]
fn test_ia_full_state_pipeline() {
    let template = PipelineTemplate::builtin().expect("Failed to load builtin template");
    let projector = CoordinateProjector::new();
    let query = projector
        .query_geometry(&ames_farm(), Crs::WGS84)
        .expect("Failed to project polygon");

    let description = PipelineTemplateBinder::new()
        .bind(&template, "IA_FullState", &query, Crs::WGS84, &OutputPaths::none())
        .expect("Failed to bind template");

    let reader = description.stage(StageRole::Reader).unwrap();
    assert_eq!(
        reader.get_str("filename"),
        Some("https://s3-us-west-2.amazonaws.com/usgs-lidar-public/IA_FullState/ept.json")
    );
    assert_eq!(reader.get_str("bounds"), Some(query.bounds.to_bounds_text().as_str()));

    let crop = description.stage(StageRole::Crop).unwrap();
    assert_eq!(crop.get_str("polygon"), Some(query.clip.as_str()));

    // Projected Ames bounds sit around x = -10.436e6, y = 5.1487e6
    assert!(query.bounds.min_x > -10_437_000.0 && query.bounds.max_x < -10_435_000.0);
    assert!(query.bounds.min_y > 5_148_000.0 && query.bounds.max_y < 5_150_000.0);

    let json: serde_json::Value =
        serde_json::from_str(&description.to_json().unwrap()).expect("Failed to parse pipeline");
    let types: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|stage| stage["type"].as_str().unwrap())
        .collect();
    assert_eq!(
        types,
        vec![
            "readers.ept",
            "filters.crop",
            "filters.range",
            "filters.assign",
            "filters.reprojection"
        ]
    );
}

#[test]
fn test_cropping_filter_alias_binds_identically() {
    let canonical = PipelineTemplate::builtin().unwrap();
    let aliased_json = include_str!("../templates/usgs_pipeline.json")
        .replace("\"crop_filter\"", "\"cropping_filter\"");
    let aliased = PipelineTemplate::from_json_str(&aliased_json).unwrap();

    let query = CoordinateProjector::new()
        .query_geometry(&ames_farm(), Crs::WGS84)
        .unwrap();
    let binder = PipelineTemplateBinder::new();
    let outputs = OutputPaths::from_stem("out", "farm", "IA_FullState");

    let a = binder
        .bind(&canonical, "IA_FullState", &query, Crs::WGS84, &outputs)
        .unwrap();
    let b = binder
        .bind(&aliased, "IA_FullState", &query, Crs::WGS84, &outputs)
        .unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_template_from_file() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("pipeline.json");
    std::fs::write(
        &path,
        r#"{
            "reader": {"type": "readers.ept", "filename": "", "bounds": ""},
            "crop_filter": {"type": "filters.crop", "polygon": ""},
            "range_filter": {"type": "filters.range", "limits": "Classification![7:7]"},
            "assign_filter": {"type": "filters.assign", "assignment": "Classification[:]=0"},
            "reprojection_filter": {"type": "filters.reprojection", "out_srs": ""},
            "smr_filter": {"type": "filters.smrf"}
        }"#,
    )
    .unwrap();

    let template = PipelineTemplate::from_path(&path).expect("Failed to load template");
    assert_eq!(template.declared_roles().len(), 6);
    assert!(template.has_role(StageRole::SmrFilter));
    assert!(!template.has_role(StageRole::TifWriter));
}

#[test]
fn test_fetch_end_to_end_with_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let outputs = OutputPaths::from_stem(dir.path(), "farm", "IA_FullState").with_raster(
        RasterOptions {
            resolution: 2.0,
            ..RasterOptions::default()
        },
    );

    let fetcher = ElevationFetcher::new(PipelineTemplate::builtin().unwrap(), EchoEngine);
    let request = ElevationRequest::new(ames_farm(), Crs::WGS84, "IA_FullState").with_outputs(outputs);

    let description = fetcher.prepare(&request).unwrap();
    assert_eq!(description.len(), 7);
    let tif = description.stage(StageRole::TifWriter).unwrap();
    assert_eq!(tif.get("resolution"), Some(&serde_json::json!(2.0)));
    let expected = dir.path().join("farm_IA_FullState.tif");
    assert_eq!(tif.get_str("filename"), expected.to_str());

    let tables = fetcher.fetch(&request).unwrap();
    assert_eq!(tables.len(), 1);
    let table = &tables[0];
    assert_eq!(table.crs(), Crs::WGS84);
    assert_eq!(table.len(), 2);
    assert_eq!(table.points()[1].z, 7.0);

    let geojson = table.to_geojson();
    assert_eq!(geojson["features"].as_array().unwrap().len(), 2);
}

#[test]
fn test_missing_reprojection_stage() {
    let template = PipelineTemplate::from_json_str(
        r#"{
            "reader": {"type": "readers.ept", "filename": "", "bounds": ""},
            "crop_filter": {"type": "filters.crop", "polygon": ""},
            "range_filter": {"type": "filters.range"},
            "assign_filter": {"type": "filters.assign"}
        }"#,
    )
    .unwrap();

    let fetcher = ElevationFetcher::new(template, EchoEngine);
    let request = ElevationRequest::new(ames_farm(), Crs::WGS84, "IA_FullState");
    assert!(matches!(
        fetcher.fetch(&request),
        Err(PipelineError::MissingStage(StageRole::Reprojection))
    ));
}

fn pdal_available() -> bool {
    Command::new("pdal").arg("--version").output().is_ok()
}

#[test]
fn test_live_pdal_fetch() {
    if !pdal_available() || std::env::var("LIDARFETCH_LIVE").is_err() {
        eprintln!("Skipping test: set LIDARFETCH_LIVE and install pdal to run");
        return;
    }

    let fetcher = ElevationFetcher::new(PipelineTemplate::builtin().unwrap(), PdalCommand::new());
    let request = ElevationRequest::new(ames_farm(), Crs::WGS84, "IA_FullState");
    let tables = fetcher.fetch(&request).expect("Failed to fetch elevation");

    let table = &tables[0];
    println!("Fetched {} points", table.len());
    assert!(!table.is_empty());
    if let Some((lo, hi)) = table.elevation_range() {
        println!("Elevation range: {:.2} .. {:.2}", lo, hi);
        assert!(lo > 200.0 && hi < 400.0, "Ames elevations should be near 300 m");
    }
}
