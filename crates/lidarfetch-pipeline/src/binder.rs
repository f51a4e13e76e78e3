//! Binding request parameters into a template.

use crate::archive::{ept_url, normalize_base_url, validate_region, USGS_LIDAR_BASE_URL};
use crate::{PipelineDescription, PipelineError, PipelineTemplate, Result, Stage, StageRole};
use lidarfetch_geo::{Crs, QueryGeometry};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Settings overwritten on the raster writer stage.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterOptions {
    /// Cell size in output CRS units.
    pub resolution: f64,
    /// Neighbourhood used to fill empty cells.
    pub window_size: u32,
    /// Statistics to write, e.g. `["min", "max"]` or `["all"]`.
    pub output_type: Vec<String>,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            resolution: 1.0,
            window_size: 6,
            output_type: vec!["all".to_string()],
        }
    }
}

/// Files a pipeline should write.
///
/// A writer stage is bound only when its path is set; an empty value drops
/// the stage from the pipeline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputPaths {
    /// Compressed point-cloud output (`.laz`).
    pub laz: Option<PathBuf>,
    /// Raster output (`.tif`).
    pub tif: Option<PathBuf>,
    /// Raster writer settings, applied when `tif` is set.
    pub raster: Option<RasterOptions>,
}

impl OutputPaths {
    /// No file outputs; points are only returned in memory.
    pub fn none() -> Self {
        Self::default()
    }

    /// Both outputs named `<dir>/<stem>_<region>.laz` and `.tif`.
    pub fn from_stem<P: AsRef<Path>>(dir: P, stem: &str, region: &str) -> Self {
        let dir = dir.as_ref();
        Self {
            laz: Some(dir.join(format!("{}_{}.laz", stem, region))),
            tif: Some(dir.join(format!("{}_{}.tif", stem, region))),
            raster: None,
        }
    }

    /// Set the raster writer settings.
    pub fn with_raster(mut self, raster: RasterOptions) -> Self {
        self.raster = Some(raster);
        self
    }

    fn path_for(&self, role: StageRole) -> Option<&Path> {
        match role {
            StageRole::LazWriter => self.laz.as_deref(),
            StageRole::TifWriter => self.tif.as_deref(),
            _ => None,
        }
    }
}

/// Binds request parameters into a [`PipelineTemplate`].
///
/// Fragments are looked up by role and copied; the template itself is never
/// modified. Only request-specific fields are overwritten:
///
/// | Role                  | Field(s)                                       |
/// |-----------------------|------------------------------------------------|
/// | `reader`              | `filename` (archive URL), `bounds`             |
/// | `crop_filter`         | `polygon`                                      |
/// | `reprojection_filter` | `out_srs`                                      |
/// | `laz_writer`          | `filename`                                     |
/// | `tif_writer`          | `filename`, raster settings when given         |
#[derive(Debug, Clone)]
pub struct PipelineTemplateBinder {
    base_url: String,
}

impl Default for PipelineTemplateBinder {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineTemplateBinder {
    /// Create a binder for the public USGS archive.
    pub fn new() -> Self {
        Self {
            base_url: USGS_LIDAR_BASE_URL.to_string(),
        }
    }

    /// Create a binder for a mirror of the archive.
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            base_url: normalize_base_url(base_url),
        }
    }

    /// Base address of the archive.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Address of a region's EPT index.
    pub fn archive_url(&self, region: &str) -> String {
        ept_url(&self.base_url, region)
    }

    /// Bind a template into a pipeline for one request.
    ///
    /// Fails before producing anything if a required role is missing, the
    /// template's stages are out of canonical order, or a field the binder
    /// writes has the wrong shape.
    pub fn bind(
        &self,
        template: &PipelineTemplate,
        region: &str,
        query: &QueryGeometry,
        output_crs: Crs,
        outputs: &OutputPaths,
    ) -> Result<PipelineDescription> {
        validate_region(region)?;
        check_roles(template, outputs)?;

        let mut stages = Vec::with_capacity(StageRole::ALL.len());
        for role in StageRole::ALL {
            let Some(fragment) = template.fragment(role) else {
                continue;
            };

            if role.is_writer() && outputs.path_for(role).is_none() {
                debug!(role = %role, "No output path; dropping writer stage");
                continue;
            }

            let mut options = fragment.clone();
            require_string(&options, role, "type")?;

            match role {
                StageRole::Reader => {
                    set_string(&mut options, role, "filename", self.archive_url(region))?;
                    set_string(&mut options, role, "bounds", query.bounds.to_bounds_text())?;
                }
                StageRole::Crop => {
                    set_string(&mut options, role, "polygon", query.clip.to_string())?;
                }
                StageRole::Reprojection => {
                    set_string(&mut options, role, "out_srs", output_crs.srs())?;
                }
                StageRole::LazWriter | StageRole::TifWriter => {
                    if let Some(path) = outputs.path_for(role) {
                        set_string(&mut options, role, "filename", path_string(role, path)?)?;
                    }
                    if role == StageRole::TifWriter {
                        if let Some(raster) = &outputs.raster {
                            apply_raster(&mut options, raster);
                        }
                    }
                }
                StageRole::RangeFilter
                | StageRole::AssignFilter
                | StageRole::SmrFilter
                | StageRole::SmrRangeFilter => {}
            }

            stages.push(Stage::new(role, options));
        }

        let description = PipelineDescription::new(stages, output_crs);
        debug!(
            region = region,
            stages = ?description.roles(),
            "Bound pipeline"
        );
        Ok(description)
    }
}

/// Check required roles, writer availability and declared order.
fn check_roles(template: &PipelineTemplate, outputs: &OutputPaths) -> Result<()> {
    for role in StageRole::ALL {
        let wanted = role.is_required() || outputs.path_for(role).is_some();
        if wanted && !template.has_role(role) {
            return Err(PipelineError::MissingStage(role));
        }
    }

    let declared = template.declared_roles();
    if let Some(pair) = declared.windows(2).find(|pair| pair[0] > pair[1]) {
        return Err(PipelineError::Template(format!(
            "stage '{}' is declared after '{}'; expected order is {}",
            pair[1],
            pair[0],
            StageRole::ALL
                .iter()
                .map(StageRole::key)
                .collect::<Vec<_>>()
                .join(" -> ")
        )));
    }

    Ok(())
}

fn require_string(options: &Map<String, Value>, role: StageRole, field: &str) -> Result<()> {
    match options.get(field) {
        Some(Value::String(_)) => Ok(()),
        Some(_) => Err(PipelineError::Template(format!(
            "field '{}' of stage '{}' must be a string",
            field, role
        ))),
        None => Err(PipelineError::Template(format!(
            "stage '{}' has no '{}' field",
            role, field
        ))),
    }
}

/// Overwrite a string field, refusing to replace a value of another shape.
fn set_string(
    options: &mut Map<String, Value>,
    role: StageRole,
    field: &str,
    value: String,
) -> Result<()> {
    match options.get(field) {
        None | Some(Value::String(_)) | Some(Value::Null) => {
            options.insert(field.to_string(), Value::String(value));
            Ok(())
        }
        Some(_) => Err(PipelineError::Template(format!(
            "field '{}' of stage '{}' must be a string",
            field, role
        ))),
    }
}

fn path_string(role: StageRole, path: &Path) -> Result<String> {
    path.to_str().map(str::to_string).ok_or_else(|| {
        PipelineError::Template(format!(
            "output path for '{}' is not valid UTF-8: {}",
            role,
            path.display()
        ))
    })
}

fn apply_raster(options: &mut Map<String, Value>, raster: &RasterOptions) {
    options.insert("resolution".to_string(), Value::from(raster.resolution));
    options.insert("window_size".to_string(), Value::from(raster.window_size));
    options.insert(
        "output_type".to_string(),
        Value::String(raster.output_type.join(",")),
    );
}
