//! PDAL command-line engine.
//!
//! The bound pipeline is piped to `pdal pipeline --stdin` with a trailing
//! `writers.text` stage that dumps the surviving points as CSV into a scratch
//! directory. The CSV becomes the returned [`PointView`].

use crate::{EngineError, EngineOutput, PipelineDescription, PointCloudEngine, PointView};
use serde_json::{json, Value};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, info};

const POINTS_FILENAME: &str = "points.csv";
const METADATA_FILENAME: &str = "metadata.json";

/// Runs pipelines through the `pdal` executable.
#[derive(Debug, Clone)]
pub struct PdalCommand {
    executable: PathBuf,
    extra_dimensions: Vec<String>,
    precision: u32,
}

impl Default for PdalCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl PdalCommand {
    /// Use `pdal` from `PATH`, exporting X, Y and Z with 8 decimals.
    pub fn new() -> Self {
        Self {
            executable: PathBuf::from("pdal"),
            extra_dimensions: Vec::new(),
            precision: 8,
        }
    }

    /// Use a specific PDAL executable.
    pub fn with_executable<P: Into<PathBuf>>(mut self, executable: P) -> Self {
        self.executable = executable.into();
        self
    }

    /// Export additional dimensions (e.g. `Classification`) next to X, Y, Z.
    pub fn with_extra_dimensions<I, S>(mut self, dimensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_dimensions = dimensions.into_iter().map(Into::into).collect();
        self
    }

    /// Decimal places written for each value.
    pub fn with_precision(mut self, precision: u32) -> Self {
        self.precision = precision;
        self
    }

    /// Path of the `pdal` program to launch.
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// The full stage array sent to PDAL, including the CSV export stage.
    pub(crate) fn pipeline_json(&self, description: &PipelineDescription, csv_path: &Path) -> Value {
        let mut order = vec!["X".to_string(), "Y".to_string(), "Z".to_string()];
        for dimension in &self.extra_dimensions {
            if !order.contains(dimension) {
                order.push(dimension.clone());
            }
        }

        let mut stages = match description.to_value() {
            Value::Array(stages) => stages,
            _ => Vec::new(),
        };
        stages.push(json!({
            "type": "writers.text",
            "format": "csv",
            "order": order.join(","),
            "keep_unspecified": false,
            "precision": self.precision,
            "filename": csv_path.to_string_lossy(),
        }));

        Value::Array(stages)
    }
}

impl PointCloudEngine for PdalCommand {
    fn execute(&self, description: &PipelineDescription) -> Result<EngineOutput, EngineError> {
        let scratch = tempfile::tempdir().map_err(EngineError::Launch)?;
        let csv_path = scratch.path().join(POINTS_FILENAME);
        let metadata_path = scratch.path().join(METADATA_FILENAME);

        let pipeline = serde_json::to_vec(&self.pipeline_json(description, &csv_path))
            .map_err(|e| EngineError::Output(format!("Failed to encode pipeline: {}", e)))?;

        info!(
            executable = %self.executable.display(),
            stages = description.len() + 1,
            "Running PDAL pipeline"
        );

        let mut child = Command::new(&self.executable)
            .arg("pipeline")
            .arg("--stdin")
            .arg("--metadata")
            .arg(&metadata_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(EngineError::Launch)?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(&pipeline).map_err(EngineError::Launch)?;
        }

        let output = child.wait_with_output().map_err(EngineError::Launch)?;
        let log = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            return Err(EngineError::Failed {
                status: output.status.code(),
                log,
            });
        }

        let file = std::fs::File::open(&csv_path).map_err(|e| {
            EngineError::Output(format!("Failed to open {}: {}", csv_path.display(), e))
        })?;
        let view = read_points(file)?;
        let metadata = read_metadata(&metadata_path)?;

        debug!(points = view.len(), "PDAL pipeline finished");

        Ok(EngineOutput {
            views: vec![view],
            metadata,
            log,
        })
    }
}

/// Parse `writers.text` CSV output: a header of dimension names followed by
/// numeric rows.
fn read_points<R: Read>(reader: R) -> Result<PointView, EngineError> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let dimensions: Vec<String> = csv_reader
        .headers()
        .map_err(|e| EngineError::Output(format!("Failed to read CSV header: {}", e)))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for (index, record) in csv_reader.records().enumerate() {
        let record =
            record.map_err(|e| EngineError::Output(format!("Failed to read CSV row {}: {}", index, e)))?;
        let row = record
            .iter()
            .map(|field| {
                field.parse::<f64>().map_err(|e| {
                    EngineError::Output(format!("Invalid value '{}' in row {}: {}", field, index, e))
                })
            })
            .collect::<Result<Vec<f64>, EngineError>>()?;
        rows.push(row);
    }

    PointView::from_rows(dimensions.as_slice(), rows).map_err(|e| EngineError::Output(e.to_string()))
}

fn read_metadata(path: &Path) -> Result<Value, EngineError> {
    if !path.exists() {
        return Ok(Value::Null);
    }
    let content = std::fs::read_to_string(path)
        .map_err(|e| EngineError::Output(format!("Failed to read {}: {}", path.display(), e)))?;
    serde_json::from_str(&content)
        .map_err(|e| EngineError::Output(format!("Invalid PDAL metadata: {}", e)))
}
