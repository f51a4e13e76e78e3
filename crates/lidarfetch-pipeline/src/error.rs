//! Error types for the pipeline crate.

use crate::StageRole;
use lidarfetch_geo::GeometryError;
use thiserror::Error;

/// Errors that can occur while preparing, running or materializing a request.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Input polygon or CRS was unusable.
    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),

    /// Template is malformed: bad field shape, bad stage order, bad region.
    #[error("Template error: {0}")]
    Template(String),

    /// Template has no fragment for a required stage role.
    #[error("Template is missing the '{0}' stage")]
    MissingStage(StageRole),

    /// The point-cloud engine failed to run the pipeline.
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// I/O error reading a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error when querying the archive.
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// The archive answered with a non-success status.
    #[error("Archive returned HTTP {status} for region '{region}'")]
    ArchiveStatus {
        /// Region that was requested.
        region: String,
        /// HTTP status code.
        status: u16,
    },

    /// A point view lacks one of the X/Y/Z dimensions.
    #[error("Point view has no '{0}' dimension")]
    MissingDimension(String),

    /// Point view columns disagree on the number of points.
    #[error("Dimension '{dimension}' has {actual} values, expected {expected}")]
    RaggedView {
        /// Offending dimension.
        dimension: String,
        /// Point count of the view.
        expected: usize,
        /// Values found for the dimension.
        actual: usize,
    },
}

/// Errors reported by a [`crate::PointCloudEngine`].
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine could not be started.
    #[error("Failed to launch engine: {0}")]
    Launch(#[source] std::io::Error),

    /// The engine ran and reported failure.
    #[error("Pipeline execution failed (exit status {status:?}): {log}")]
    Failed {
        /// Process exit code, if the process exited normally.
        status: Option<i32>,
        /// Engine log output.
        log: String,
    },

    /// The engine succeeded but its output could not be read.
    #[error("Unreadable engine output: {0}")]
    Output(String),
}
