//! Example: Fetch elevation points for a lon/lat box from the USGS archive.
//!
//! Usage: cargo run --example fetch_elevation -- <region> <min_lon> <min_lat> <max_lon> <max_lat>

use lidarfetch_geo::{Crs, Polygon};
use lidarfetch_pipeline::{ElevationFetcher, ElevationRequest, PdalCommand, PipelineTemplate};
use std::env;
use std::time::Instant;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 6 {
        eprintln!("Usage: {} <region> <min_lon> <min_lat> <max_lon> <max_lat>", args[0]);
        eprintln!(
            "Example: {} IA_FullState -93.756155 41.918015 -93.747334 41.921429",
            args[0]
        );
        std::process::exit(1);
    }

    let region = &args[1];
    let coords: Vec<f64> = args[2..6]
        .iter()
        .map(|s| s.parse().expect("Invalid coordinate"))
        .collect();

    let template = PipelineTemplate::builtin().expect("Failed to load builtin template");
    let fetcher = ElevationFetcher::new(template, PdalCommand::new());

    let polygon = Polygon::from_bbox(coords[0], coords[1], coords[2], coords[3]);
    let request = ElevationRequest::new(polygon, Crs::WGS84, region.as_str());

    match fetcher.prepare(&request) {
        Ok(description) => println!(
            "Pipeline:\n{}",
            description.to_json_pretty().unwrap_or_default()
        ),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }

    println!("\nFetching points from {}...", region);
    let start = Instant::now();

    match fetcher.fetch(&request) {
        Ok(tables) => {
            for table in &tables {
                print!("{} points in {}", table.len(), table.crs());
                if let Some((lo, hi)) = table.elevation_range() {
                    print!(", elevation {:.2} to {:.2} meters", lo, hi);
                }
                println!();
            }
            println!("Done in {:.2}s", start.elapsed().as_secs_f64());
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
