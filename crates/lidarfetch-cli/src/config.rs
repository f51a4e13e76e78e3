//! CLI configuration file.

use crate::error::CliError;
use lidarfetch_geo::Crs;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Settings read from `--config <file.yaml>`. Command-line flags win over
/// anything set here.
///
/// ```yaml
/// template: pipelines/usgs.json
/// base_url: https://s3-us-west-2.amazonaws.com/usgs-lidar-public/
/// pdal: /opt/pdal/bin/pdal
/// source_crs: "4326"
/// output_crs: "EPSG:26915"
/// output_dir: out
/// extra_dimensions: [Classification]
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Template file; the built-in USGS template when unset.
    pub template: Option<PathBuf>,
    /// Archive base URL; the public USGS bucket when unset.
    pub base_url: Option<String>,
    /// PDAL executable.
    pub pdal: PathBuf,
    /// CRS of input coordinates.
    #[serde(deserialize_with = "deserialize_crs")]
    pub source_crs: Crs,
    /// CRS of returned points; the source CRS when unset.
    #[serde(deserialize_with = "deserialize_opt_crs")]
    pub output_crs: Option<Crs>,
    /// Directory for `.laz`/`.tif` outputs.
    pub output_dir: PathBuf,
    /// Dimensions exported next to X, Y and Z.
    pub extra_dimensions: Vec<String>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            template: None,
            base_url: None,
            pdal: PathBuf::from("pdal"),
            source_crs: Crs::WGS84,
            output_crs: None,
            output_dir: PathBuf::from("."),
            extra_dimensions: Vec::new(),
        }
    }
}

impl CliConfig {
    pub fn from_path(path: &Path) -> Result<Self, CliError> {
        let content = std::fs::read_to_string(path).map_err(|source| CliError::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_yaml::from_str(&content)?)
    }

    /// Load `path` if given, otherwise use defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, CliError> {
        match path {
            Some(path) => Self::from_path(path),
            None => Ok(Self::default()),
        }
    }
}

/// Accepts `4326`, `"4326"` and `"EPSG:4326"`.
#[derive(Deserialize)]
#[serde(untagged)]
enum CrsValue {
    Code(u16),
    Text(String),
}

impl CrsValue {
    fn into_crs<E: serde::de::Error>(self) -> Result<Crs, E> {
        match self {
            CrsValue::Code(code) => Ok(Crs::from_epsg(code)),
            CrsValue::Text(text) => text.parse().map_err(E::custom),
        }
    }
}

fn deserialize_crs<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<Crs, D::Error> {
    CrsValue::deserialize(deserializer)?.into_crs()
}

fn deserialize_opt_crs<'de, D: serde::Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Crs>, D::Error> {
    Option::<CrsValue>::deserialize(deserializer)?
        .map(CrsValue::into_crs)
        .transpose()
}
