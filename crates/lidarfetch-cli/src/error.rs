use lidarfetch_pipeline::PipelineError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors reported by the `lidarfetch` binary.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Failed to read config {path}: {source}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Config(#[from] serde_yaml::Error),

    /// Malformed `--bbox` or `--polygon` value.
    #[error("Invalid input geometry: {0}")]
    Input(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
