//! # lidarfetch-pipeline
//!
//! Turns an elevation request for a polygon into a PDAL pipeline over the
//! USGS 3DEP public LiDAR archive, runs it through a [`PointCloudEngine`], and
//! materializes the returned points as [`ElevationTable`]s.
//!
//! ## Overview
//!
//! The archive is published on S3 as one Entwine Point Tile dataset per
//! region, addressed as `https://s3-us-west-2.amazonaws.com/usgs-lidar-public/{region}/ept.json`.
//!
//! A request moves through three steps:
//! - the polygon is reprojected into EPSG:3857 and reduced to query bounds
//!   and a clip polygon ([`lidarfetch_geo::CoordinateProjector`]),
//! - a role-keyed [`PipelineTemplate`] is bound into an ordered
//!   [`PipelineDescription`] ([`PipelineTemplateBinder`]),
//! - the engine's point views become tables ([`ResultMaterializer`]).
//!
//! [`ElevationFetcher`] strings the steps together.
//!
//! ## Example
//!
//! ```no_run
//! use lidarfetch_geo::{Crs, Polygon};
//! use lidarfetch_pipeline::{ElevationFetcher, ElevationRequest, PdalCommand, PipelineTemplate};
//!
//! let template = PipelineTemplate::builtin()?;
//! let fetcher = ElevationFetcher::new(template, PdalCommand::new());
//!
//! let polygon = Polygon::from_bbox(-93.756155, 41.918015, -93.747334, 41.921429);
//! let request = ElevationRequest::new(polygon, Crs::WGS84, "IA_FullState");
//!
//! for table in fetcher.fetch(&request)? {
//!     println!("{} points in {}", table.len(), table.crs());
//! }
//! # Ok::<(), lidarfetch_pipeline::PipelineError>(())
//! ```

mod archive;
mod binder;
mod description;
mod engine;
mod error;
mod fetcher;
mod materialize;
mod pdal;
mod role;
mod template;

pub use archive::{ArchiveClient, EptDimension, EptMetadata, EptSrs, EPT_INDEX_FILENAME, USGS_LIDAR_BASE_URL};
pub use binder::{OutputPaths, PipelineTemplateBinder, RasterOptions};
pub use description::{PipelineDescription, Stage};
pub use engine::{EngineOutput, PointCloudEngine, PointView};
pub use error::{EngineError, PipelineError};
pub use fetcher::{ElevationFetcher, ElevationRequest};
pub use materialize::{ElevationPoint, ElevationTable, ResultMaterializer};
pub use pdal::PdalCommand;
pub use role::StageRole;
pub use template::PipelineTemplate;

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
