//! lidarfetch - Fetch USGS 3DEP elevation points for a polygon.
//!
//! ```text
//! lidarfetch plan  IA_FullState --bbox -93.756155,41.918015,-93.747334,41.921429
//! lidarfetch fetch IA_FullState --bbox ... --output-crs 26915 --stem farm -o farm.geojson
//! lidarfetch info  IA_FullState
//! ```

mod config;
mod error;
mod input;

use clap::{Args, Parser, Subcommand};
use config::CliConfig;
use error::CliError;
use lidarfetch_geo::{Crs, Polygon};
use lidarfetch_pipeline::{
    ArchiveClient, ElevationFetcher, ElevationRequest, OutputPaths, PdalCommand,
    PipelineTemplate, PipelineTemplateBinder, RasterOptions,
};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "lidarfetch",
    version,
    about = "Fetch elevation points for a polygon from the USGS 3DEP LiDAR archive"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// YAML config file; flags override its values
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the bound pipeline without running it
    Plan(RequestArgs),

    /// Run the pipeline through PDAL and write the points as GeoJSON
    Fetch {
        #[command(flatten)]
        request: RequestArgs,

        /// GeoJSON output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Warn when the polygon lies outside the region's published extent
        #[arg(long)]
        check_extent: bool,
    },

    /// Print archive metadata for a region
    Info {
        /// Region identifier, e.g. IA_FullState
        region: String,
    },
}

#[derive(Args)]
struct RequestArgs {
    /// Region identifier, e.g. IA_FullState
    region: String,

    /// Rectangle as minx,miny,maxx,maxy
    #[arg(
        long,
        allow_hyphen_values = true,
        conflicts_with = "polygon",
        required_unless_present = "polygon"
    )]
    bbox: Option<String>,

    /// Polygon as "x y, x y, ..."
    #[arg(long, allow_hyphen_values = true)]
    polygon: Option<String>,

    /// CRS of the input coordinates
    #[arg(long)]
    source_crs: Option<Crs>,

    /// CRS of the returned points (defaults to the source CRS)
    #[arg(long)]
    output_crs: Option<Crs>,

    /// Pipeline template file (JSON keyed by stage role)
    #[arg(long)]
    template: Option<PathBuf>,

    /// Write <output-dir>/<stem>_<region>.laz and .tif
    #[arg(long)]
    stem: Option<String>,

    /// Directory for --stem outputs
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Raster cell size in output CRS units
    #[arg(long)]
    resolution: Option<f64>,

    /// Raster fill window size
    #[arg(long)]
    window_size: Option<u32>,

    /// Raster statistics, comma separated (min,max,mean,idw,count,stdev,all)
    #[arg(long, value_delimiter = ',')]
    output_type: Vec<String>,
}

impl RequestArgs {
    fn polygon(&self) -> Result<Polygon, CliError> {
        match (&self.bbox, &self.polygon) {
            (Some(bbox), _) => input::parse_bbox(bbox),
            (None, Some(polygon)) => input::parse_polygon(polygon),
            (None, None) => Err(CliError::Input(
                "one of --bbox or --polygon is required".to_string(),
            )),
        }
    }

    fn raster(&self) -> Option<RasterOptions> {
        if self.resolution.is_none() && self.window_size.is_none() && self.output_type.is_empty() {
            return None;
        }
        let defaults = RasterOptions::default();
        Some(RasterOptions {
            resolution: self.resolution.unwrap_or(defaults.resolution),
            window_size: self.window_size.unwrap_or(defaults.window_size),
            output_type: if self.output_type.is_empty() {
                defaults.output_type
            } else {
                self.output_type.clone()
            },
        })
    }

    fn outputs(&self, config: &CliConfig) -> OutputPaths {
        let outputs = match &self.stem {
            Some(stem) => {
                let dir = self.output_dir.as_ref().unwrap_or(&config.output_dir);
                OutputPaths::from_stem(dir, stem, &self.region)
            }
            None => OutputPaths::none(),
        };
        match self.raster() {
            Some(raster) => outputs.with_raster(raster),
            None => outputs,
        }
    }

    fn request(&self, config: &CliConfig) -> Result<ElevationRequest, CliError> {
        let source_crs = self.source_crs.unwrap_or(config.source_crs);
        let output_crs = self.output_crs.or(config.output_crs).unwrap_or(source_crs);

        Ok(ElevationRequest::new(self.polygon()?, source_crs, self.region.as_str())
            .with_output_crs(output_crs)
            .with_outputs(self.outputs(config)))
    }

    fn template(&self, config: &CliConfig) -> Result<PipelineTemplate, CliError> {
        let template = match self.template.as_ref().or(config.template.as_ref()) {
            Some(path) => PipelineTemplate::from_path(path)?,
            None => PipelineTemplate::builtin()?,
        };
        Ok(template)
    }
}

fn binder(config: &CliConfig) -> PipelineTemplateBinder {
    match &config.base_url {
        Some(url) => PipelineTemplateBinder::with_base_url(url),
        None => PipelineTemplateBinder::new(),
    }
}

fn archive(config: &CliConfig) -> Result<ArchiveClient, CliError> {
    let client = match &config.base_url {
        Some(url) => ArchiveClient::with_base_url(url)?,
        None => ArchiveClient::new()?,
    };
    Ok(client)
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn plan(args: &RequestArgs, config: &CliConfig) -> Result<(), CliError> {
    let fetcher = ElevationFetcher::new(args.template(config)?, PdalCommand::new())
        .with_binder(binder(config));
    let description = fetcher.prepare(&args.request(config)?)?;

    println!("{}", description.to_json_pretty()?);
    Ok(())
}

fn fetch(
    args: &RequestArgs,
    output: Option<&PathBuf>,
    check_extent: bool,
    config: &CliConfig,
) -> Result<(), CliError> {
    let engine = PdalCommand::new()
        .with_executable(&config.pdal)
        .with_extra_dimensions(config.extra_dimensions.iter().cloned());

    let mut fetcher = ElevationFetcher::new(args.template(config)?, engine).with_binder(binder(config));
    if check_extent {
        fetcher = fetcher.with_archive_check(archive(config)?);
    }

    let tables = fetcher.fetch(&args.request(config)?)?;

    let collections: Vec<serde_json::Value> = tables.iter().map(|t| t.to_geojson()).collect();
    let document = match collections.len() {
        1 => collections.into_iter().next().unwrap_or_default(),
        _ => serde_json::Value::Array(collections),
    };
    let text = serde_json::to_string_pretty(&document)?;

    match output {
        Some(path) => {
            std::fs::write(path, text)?;
            info!(path = %path.display(), "Wrote GeoJSON");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", text)?;
        }
    }
    Ok(())
}

fn info(region: &str, config: &CliConfig) -> Result<(), CliError> {
    let client = archive(config)?;
    let metadata = client.metadata(region)?;
    let extent = metadata.horizontal_bounds()?;

    println!("Region:     {}", region);
    println!("Index:      {}", client.ept_url(region));
    println!("Points:     {}", metadata.points);
    match metadata.horizontal_crs() {
        Some(crs) => println!("CRS:        {}", crs),
        None => println!("CRS:        unknown"),
    }
    println!("Bounds:     {}", extent.to_bounds_text());
    println!("Dimensions: {}", metadata.dimension_names().join(", "));
    Ok(())
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = CliConfig::load(cli.config.as_deref())?;

    match &cli.command {
        Commands::Plan(args) => plan(args, &config),
        Commands::Fetch {
            request,
            output,
            check_extent,
        } => fetch(request, output.as_ref(), *check_extent, &config),
        Commands::Info { region } => info(region, &config),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(1)
        }
    }
}
