//! Stage roles and their canonical order.

use std::fmt;

/// The part a stage plays in an elevation pipeline.
///
/// Variants are declared in canonical processing order, so `Ord` follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StageRole {
    /// EPT reader querying the archive by bounds.
    Reader,
    /// Crop to the exact user polygon.
    Crop,
    /// Attribute range filter (e.g. drop noise classes).
    RangeFilter,
    /// Attribute assignment (e.g. reset classification).
    AssignFilter,
    /// Reprojection into the output CRS.
    Reprojection,
    /// Optional ground classification (`filters.smrf`).
    SmrFilter,
    /// Optional range filter keeping the ground class after classification.
    SmrRangeFilter,
    /// Compressed point-cloud writer.
    LazWriter,
    /// Raster writer.
    TifWriter,
}

impl StageRole {
    /// Every role, in canonical order.
    pub const ALL: [StageRole; 9] = [
        StageRole::Reader,
        StageRole::Crop,
        StageRole::RangeFilter,
        StageRole::AssignFilter,
        StageRole::Reprojection,
        StageRole::SmrFilter,
        StageRole::SmrRangeFilter,
        StageRole::LazWriter,
        StageRole::TifWriter,
    ];

    /// Key used for this role in template documents.
    pub fn key(&self) -> &'static str {
        match self {
            StageRole::Reader => "reader",
            StageRole::Crop => "crop_filter",
            StageRole::RangeFilter => "range_filter",
            StageRole::AssignFilter => "assign_filter",
            StageRole::Reprojection => "reprojection_filter",
            StageRole::SmrFilter => "smr_filter",
            StageRole::SmrRangeFilter => "smr_range_filter",
            StageRole::LazWriter => "laz_writer",
            StageRole::TifWriter => "tif_writer",
        }
    }

    /// Look up a role by template key. `cropping_filter` is accepted for the
    /// crop stage.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "cropping_filter" => Some(StageRole::Crop),
            _ => Self::ALL.into_iter().find(|role| role.key() == key),
        }
    }

    /// Whether every pipeline must contain this role.
    pub fn is_required(&self) -> bool {
        matches!(
            self,
            StageRole::Reader
                | StageRole::Crop
                | StageRole::RangeFilter
                | StageRole::AssignFilter
                | StageRole::Reprojection
        )
    }

    /// Whether the stage writes files.
    pub fn is_writer(&self) -> bool {
        matches!(self, StageRole::LazWriter | StageRole::TifWriter)
    }
}

impl fmt::Display for StageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
