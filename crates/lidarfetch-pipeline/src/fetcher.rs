//! Request orchestration: project, bind, execute, materialize.

use crate::{
    ArchiveClient, ElevationTable, OutputPaths, PipelineDescription, PipelineTemplate,
    PipelineTemplateBinder, PointCloudEngine, Result, ResultMaterializer,
};
use lidarfetch_geo::{CoordinateProjector, Crs, Polygon, QueryGeometry};
use tracing::{debug, info, warn};

/// One elevation request.
#[derive(Debug, Clone, PartialEq)]
pub struct ElevationRequest {
    /// Area of interest.
    pub polygon: Polygon,
    /// CRS the polygon's coordinates are in.
    pub source_crs: Crs,
    /// Archive region identifier, e.g. `IA_FullState`.
    pub region: String,
    /// CRS of the returned points.
    pub output_crs: Crs,
    /// Files to write besides the in-memory result.
    pub outputs: OutputPaths,
}

impl ElevationRequest {
    /// A request returning points in the polygon's own CRS, with no files.
    pub fn new(polygon: Polygon, source_crs: Crs, region: impl Into<String>) -> Self {
        Self {
            polygon,
            source_crs,
            region: region.into(),
            output_crs: source_crs,
            outputs: OutputPaths::none(),
        }
    }

    /// Return points in `output_crs` instead of the source CRS.
    pub fn with_output_crs(mut self, output_crs: Crs) -> Self {
        self.output_crs = output_crs;
        self
    }

    /// Also write the given `.laz`/`.tif` files.
    pub fn with_outputs(mut self, outputs: OutputPaths) -> Self {
        self.outputs = outputs;
        self
    }
}

/// Runs [`ElevationRequest`]s against a template and an engine.
///
/// The template is loaded once and shared by every request.
#[derive(Debug)]
pub struct ElevationFetcher<E> {
    template: PipelineTemplate,
    engine: E,
    projector: CoordinateProjector,
    binder: PipelineTemplateBinder,
    archive: Option<ArchiveClient>,
}

impl<E: PointCloudEngine> ElevationFetcher<E> {
    /// Create a fetcher for the public USGS archive.
    pub fn new(template: PipelineTemplate, engine: E) -> Self {
        Self {
            template,
            engine,
            projector: CoordinateProjector::new(),
            binder: PipelineTemplateBinder::new(),
            archive: None,
        }
    }

    /// Replace the binder, e.g. to target an archive mirror.
    pub fn with_binder(mut self, binder: PipelineTemplateBinder) -> Self {
        self.binder = binder;
        self
    }

    /// Check each request's bounds against the region's published extent
    /// before running the engine.
    pub fn with_archive_check(mut self, archive: ArchiveClient) -> Self {
        self.archive = Some(archive);
        self
    }

    /// Template every request is bound from.
    pub fn template(&self) -> &PipelineTemplate {
        &self.template
    }

    /// Engine running the bound pipelines.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Project the polygon and bind the pipeline without running it.
    pub fn prepare(&self, request: &ElevationRequest) -> Result<PipelineDescription> {
        self.bind_request(request).map(|(_, description)| description)
    }

    /// Run a request end to end.
    pub fn fetch(&self, request: &ElevationRequest) -> Result<Vec<ElevationTable>> {
        info!(
            region = %request.region,
            source_crs = %request.source_crs,
            output_crs = %request.output_crs,
            vertices = request.polygon.len(),
            "Preparing elevation request"
        );
        let (query, description) = self.bind_request(request)?;

        if let Some(archive) = &self.archive {
            check_coverage(archive, &request.region, &query)?;
        }

        info!(stages = description.len(), "Executing pipeline");
        let output = self.engine.execute(&description)?;
        if !output.log.is_empty() {
            debug!(log = %output.log, "Engine log");
        }

        let tables = ResultMaterializer::from_output(&output, description.output_crs())?;
        info!(
            tables = tables.len(),
            points = tables.iter().map(ElevationTable::len).sum::<usize>(),
            "Elevation request complete"
        );
        Ok(tables)
    }

    fn bind_request(
        &self,
        request: &ElevationRequest,
    ) -> Result<(QueryGeometry, PipelineDescription)> {
        let query = self
            .projector
            .query_geometry(&request.polygon, request.source_crs)?;
        debug!(
            bounds = %query.bounds.to_bounds_text(),
            "Derived query bounds"
        );

        let description = self.binder.bind(
            &self.template,
            &request.region,
            &query,
            request.output_crs,
            &request.outputs,
        )?;
        Ok((query, description))
    }
}

/// Warn when the query bounds miss the region's published extent.
fn check_coverage(archive: &ArchiveClient, region: &str, query: &QueryGeometry) -> Result<()> {
    let metadata = archive.metadata(region)?;
    let extent = metadata.horizontal_bounds()?;

    if !extent.intersects(&query.bounds) {
        warn!(
            region = region,
            bounds = %query.bounds.to_bounds_text(),
            extent = %extent.to_bounds_text(),
            "Request bounds fall outside the region's extent; expect no points"
        );
    }
    Ok(())
}
