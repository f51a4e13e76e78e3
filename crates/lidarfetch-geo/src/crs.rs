//! Coordinate reference systems identified by EPSG code.

use crate::GeometryError;
use std::fmt;
use std::str::FromStr;

/// The CRS the archive indexes its datasets in. Query bounds and clip
/// geometry are always expressed in this system, whatever the caller uses.
pub const WORKING_CRS: Crs = Crs::WEB_MERCATOR;

/// A coordinate reference system named by its EPSG code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Crs(u16);

impl Crs {
    /// WGS 84 geographic longitude/latitude.
    pub const WGS84: Crs = Crs(4326);

    /// Web Mercator.
    pub const WEB_MERCATOR: Crs = Crs(3857);

    /// Create a CRS from an EPSG code.
    pub const fn from_epsg(code: u16) -> Self {
        Crs(code)
    }

    /// The numeric EPSG code.
    pub fn code(&self) -> u16 {
        self.0
    }

    /// The `EPSG:<code>` form used by the pipeline engine's `out_srs` fields.
    pub fn srs(&self) -> String {
        format!("EPSG:{}", self.0)
    }

    /// PROJ string for this code, if crs-definitions knows it.
    pub fn proj_string(&self) -> Option<&'static str> {
        crs_definitions::from_code(self.0).map(|def| def.proj4)
    }

    /// Whether the CRS uses longitude/latitude in degrees.
    pub fn is_geographic(&self) -> bool {
        match self.proj_string() {
            Some(proj) => proj.contains("+proj=longlat"),
            // Geographic codes mostly live in 4000..5000
            None => (4000..5000).contains(&self.0),
        }
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.0)
    }
}

impl FromStr for Crs {
    type Err = GeometryError;

    /// Accepts `4326`, `EPSG:4326` and `epsg:4326`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = match trimmed.split_once(':') {
            Some((authority, code)) if authority.eq_ignore_ascii_case("epsg") => code,
            Some(_) => return Err(GeometryError::InvalidCrs(s.to_string())),
            None => trimmed,
        };
        digits
            .trim()
            .parse::<u16>()
            .map(Crs)
            .map_err(|_| GeometryError::InvalidCrs(s.to_string()))
    }
}
