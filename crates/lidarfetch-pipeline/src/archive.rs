//! USGS 3DEP public LiDAR archive addressing and metadata.
//!
//! Each region of the archive is an Entwine Point Tile dataset whose root
//! index lives at `{base}/{region}/ept.json`. The index carries the dataset's
//! cube bounds, point count, spatial reference and dimension schema.
//!
//! Source: https://s3-us-west-2.amazonaws.com/usgs-lidar-public/

use crate::{PipelineError, Result};
use lidarfetch_geo::{BoundingBox, Crs};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Base address of the public archive, including the trailing slash.
pub const USGS_LIDAR_BASE_URL: &str = "https://s3-us-west-2.amazonaws.com/usgs-lidar-public/";

/// Root index file of an EPT dataset.
pub const EPT_INDEX_FILENAME: &str = "ept.json";

/// Timeout for metadata requests.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Address of a region's EPT index: `<base><region>/ept.json`.
pub(crate) fn ept_url(base_url: &str, region: &str) -> String {
    format!("{}{}/{}", base_url, region, EPT_INDEX_FILENAME)
}

/// Normalize a base address so that it ends in exactly one `/`.
pub(crate) fn normalize_base_url(base_url: &str) -> String {
    format!("{}/", base_url.trim_end_matches('/'))
}

/// Reject region identifiers that cannot name an archive directory.
pub(crate) fn validate_region(region: &str) -> Result<()> {
    if region.is_empty() {
        return Err(PipelineError::Template("region must not be empty".to_string()));
    }
    if region.contains('/') || region.chars().any(char::is_whitespace) {
        return Err(PipelineError::Template(format!(
            "region '{}' must not contain '/' or whitespace",
            region
        )));
    }
    Ok(())
}

/// Spatial reference block of an EPT index.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EptSrs {
    /// Authority name, usually `EPSG`.
    pub authority: Option<String>,
    /// Horizontal code as a string, e.g. `"3857"`.
    pub horizontal: Option<String>,
    /// Vertical code as a string, e.g. `"5703"`.
    pub vertical: Option<String>,
}

/// One dimension of the EPT schema.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EptDimension {
    /// Dimension name, e.g. `Classification`.
    pub name: String,
    /// Storage type: `signed`, `unsigned` or `float`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Size in bytes.
    pub size: u8,
}

/// Parts of `ept.json` this crate uses.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EptMetadata {
    /// Cube bounds: `[xmin, ymin, zmin, xmax, ymax, zmax]`.
    pub bounds: [f64; 6],
    /// Total number of points.
    pub points: u64,
    /// Spatial reference, when declared.
    #[serde(default)]
    pub srs: Option<EptSrs>,
    /// Point dimensions.
    #[serde(default)]
    pub schema: Vec<EptDimension>,
}

impl EptMetadata {
    /// X/Y extent of the dataset.
    pub fn horizontal_bounds(&self) -> Result<BoundingBox> {
        let [min_x, min_y, _, max_x, max_y, _] = self.bounds;
        Ok(BoundingBox::new(min_x, max_x, min_y, max_y)?)
    }

    /// Horizontal CRS, if it is an EPSG code.
    pub fn horizontal_crs(&self) -> Option<Crs> {
        let srs = self.srs.as_ref()?;
        match srs.authority.as_deref() {
            Some(authority) if authority.eq_ignore_ascii_case("epsg") => {}
            _ => return None,
        }
        srs.horizontal.as_deref()?.parse().ok()
    }

    /// Names of all dimensions in the schema.
    pub fn dimension_names(&self) -> Vec<&str> {
        self.schema.iter().map(|d| d.name.as_str()).collect()
    }
}

/// Blocking client for archive metadata.
pub struct ArchiveClient {
    /// Base address ending in `/`.
    base_url: String,
    /// HTTP client for metadata requests.
    client: reqwest::blocking::Client,
}

impl std::fmt::Debug for ArchiveClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl ArchiveClient {
    /// Create a client for the public USGS archive.
    pub fn new() -> Result<Self> {
        Self::with_base_url(USGS_LIDAR_BASE_URL)
    }

    /// Create a client for a mirror of the archive.
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            base_url: normalize_base_url(base_url),
            client,
        })
    }

    /// Base address of the archive.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Address of a region's EPT index.
    pub fn ept_url(&self, region: &str) -> String {
        ept_url(&self.base_url, region)
    }

    /// Fetch and decode a region's `ept.json`.
    pub fn metadata(&self, region: &str) -> Result<EptMetadata> {
        validate_region(region)?;

        let url = self.ept_url(region);
        debug!(url = %url, "Fetching EPT metadata");

        let response = self.client.get(&url).send()?;
        if !response.status().is_success() {
            return Err(PipelineError::ArchiveStatus {
                region: region.to_string(),
                status: response.status().as_u16(),
            });
        }

        Ok(response.json::<EptMetadata>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IOWA_EPT: &str = r#"{
        "bounds": [-10796577, 4902908, -380163, -10015884, 5683601, 400530],
        "boundsConforming": [-10796577, 4902908, 18, -10015884, 5434989, 3020],
        "dataType": "laszip",
        "hierarchyType": "json",
        "points": 166130043685,
        "schema": [
            {"name": "X", "type": "signed", "size": 4, "scale": 0.01, "offset": -10405730},
            {"name": "Y", "type": "signed", "size": 4, "scale": 0.01, "offset": 5168852},
            {"name": "Z", "type": "signed", "size": 4, "scale": 0.01, "offset": 1417},
            {"name": "Classification", "type": "unsigned", "size": 1}
        ],
        "span": 256,
        "srs": {"authority": "EPSG", "horizontal": "3857", "vertical": "5703", "wkt": "PROJCS[...]"},
        "version": "1.0.0"
    }"#;

    #[test]
    fn test_ept_url() {
        assert_eq!(
            ept_url(USGS_LIDAR_BASE_URL, "IA_FullState"),
            "https://s3-us-west-2.amazonaws.com/usgs-lidar-public/IA_FullState/ept.json"
        );
    }

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(normalize_base_url("http://mirror/lidar"), "http://mirror/lidar/");
        assert_eq!(normalize_base_url("http://mirror/lidar/"), "http://mirror/lidar/");
        assert_eq!(normalize_base_url("http://mirror/lidar//"), "http://mirror/lidar/");
    }

    #[test]
    fn test_validate_region() {
        assert!(validate_region("IA_FullState").is_ok());
        assert!(validate_region("USGS_LPC_CO_SoPlatteRiver_Lot5_2013_LAS_2015").is_ok());
        assert!(validate_region("").is_err());
        assert!(validate_region("IA/FullState").is_err());
        assert!(validate_region("IA FullState").is_err());
    }

    #[test]
    fn test_parse_metadata() {
        let metadata: EptMetadata = serde_json::from_str(IOWA_EPT).unwrap();
        assert_eq!(metadata.points, 166_130_043_685);
        assert_eq!(metadata.horizontal_crs(), Some(Crs::WEB_MERCATOR));
        assert_eq!(metadata.dimension_names(), vec!["X", "Y", "Z", "Classification"]);

        let bounds = metadata.horizontal_bounds().unwrap();
        assert_eq!(bounds.min_x, -10796577.0);
        assert_eq!(bounds.max_x, -10015884.0);
        assert_eq!(bounds.min_y, 4902908.0);
        assert_eq!(bounds.max_y, 5683601.0);
    }

    #[test]
    fn test_metadata_without_srs() {
        let metadata: EptMetadata =
            serde_json::from_str(r#"{"bounds": [0, 0, 0, 1, 1, 1], "points": 10}"#).unwrap();
        assert!(metadata.horizontal_crs().is_none());
        assert!(metadata.schema.is_empty());
    }

    #[test]
    fn test_client_base_url() {
        let client = ArchiveClient::with_base_url("http://localhost:9/lidar").unwrap();
        assert_eq!(client.ept_url("X"), "http://localhost:9/lidar/X/ept.json");
    }

    #[test]
    fn test_metadata_rejects_bad_region_before_request() {
        let client = ArchiveClient::with_base_url("http://localhost:9/").unwrap();
        assert!(matches!(
            client.metadata("bad region"),
            Err(PipelineError::Template(_))
        ));
    }
}
