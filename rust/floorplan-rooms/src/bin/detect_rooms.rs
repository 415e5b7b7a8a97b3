// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! CLI tool: extract rooms from floor plan images
//!
//! Usage:
//!   detect-rooms <path> [options]

use floorplan_rooms::batch::{process_file, process_folder};
use floorplan_rooms::{BatchConfig, Pipeline, PipelineConfig, Strategy};
use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

struct Options {
    path: PathBuf,
    strategy: Strategy,
    output_dir: Option<PathBuf>,
    config_file: Option<PathBuf>,
    clean: bool,
    visualize: bool,
    name_contains: Option<String>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() || args[0] == "--help" || args[0] == "-h" {
        print_usage();
        return ExitCode::SUCCESS;
    }

    let options = match parse_args(&args) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("Error: {message}");
            print_usage();
            return ExitCode::FAILURE;
        }
    };

    match run(&options) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn parse_args(args: &[String]) -> Result<Options, String> {
    let mut options = Options {
        path: PathBuf::from(&args[0]),
        strategy: Strategy::WallReconstruction,
        output_dir: None,
        config_file: None,
        clean: false,
        visualize: true,
        name_contains: None,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--strategy" => {
                i += 1;
                options.strategy = match args.get(i).map(String::as_str) {
                    Some("walls") => Strategy::WallReconstruction,
                    Some("seeds") => Strategy::SeedAnchored,
                    Some(other) => return Err(format!("Unknown strategy '{other}'")),
                    None => return Err("--strategy needs a value".into()),
                };
            }
            "--output" => {
                i += 1;
                let dir = args.get(i).ok_or("--output needs a directory")?;
                options.output_dir = Some(PathBuf::from(dir));
            }
            "--config" => {
                i += 1;
                let file = args.get(i).ok_or("--config needs a file")?;
                options.config_file = Some(PathBuf::from(file));
            }
            "--only" => {
                i += 1;
                let text = args.get(i).ok_or("--only needs a file-name fragment")?;
                options.name_contains = Some(text.clone());
            }
            "--clean" => options.clean = true,
            "--no-visualize" => options.visualize = false,
            other => return Err(format!("Unknown option: {other}")),
        }
        i += 1;
    }

    Ok(options)
}

fn run(options: &Options) -> floorplan_rooms::Result<ExitCode> {
    let config = match &options.config_file {
        Some(file) => PipelineConfig::from_json_file(file)?,
        None => PipelineConfig::for_strategy(options.strategy),
    };
    let pipeline = Pipeline::new(config)?;

    let mut batch = match &options.output_dir {
        Some(dir) => BatchConfig::new(dir),
        None => BatchConfig::from_env(),
    };
    batch.clean = options.clean;
    batch.visualize = options.visualize;
    batch.name_contains = options.name_contains.clone();

    if options.path.is_dir() {
        let report = process_folder(&pipeline, &options.path, &batch)?;
        println!(
            "Processed {} image(s): {} ok, {} failed, {} room(s) -> {}",
            report.items.len(),
            report.succeeded(),
            report.failed(),
            report.total_rooms(),
            batch.output_dir.display()
        );
        return Ok(if report.failed() == 0 {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    match process_file(&pipeline, &options.path, &batch) {
        Ok(processed) => {
            print_rooms(&options.path, &processed.set);
            println!("  Room data saved: {}", processed.files.rooms_json.display());
            if let Some(png) = &processed.files.visualization {
                println!("  Visualization saved: {}", png.display());
            }
            if let Some(svg) = &processed.files.svg_overlay {
                println!("  SVG overlay saved: {}", svg.display());
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            eprintln!("Error: {}: {e}", options.path.display());
            Ok(ExitCode::FAILURE)
        }
    }
}

fn print_rooms(path: &Path, set: &floorplan_rooms::RoomSet) {
    println!(
        "{}: {}x{} px, floor '{}', {} room(s)",
        path.display(),
        set.width,
        set.height,
        set.floor,
        set.rooms.len()
    );
    for room in &set.rooms {
        println!(
            "  {:<24} {:<11} x={:<5} y={:<5} {}x{} area={:.0}",
            room.name, room.room_type, room.bbox.x, room.bbox.y, room.bbox.w, room.bbox.h, room.area
        );
    }
}

fn print_usage() {
    println!(
        r#"Floor Plan Room Detector
========================

Extracts room polygons, bounding boxes and room types from floor plan images.

USAGE:
  detect-rooms <path> [OPTIONS]

ARGUMENTS:
  <path>                 Floor plan image (PNG, JPEG) or a folder of images

OPTIONS:
  --strategy <walls|seeds>
                         walls: reconstruct walls from line segments (default)
                         seeds: flood fill outward from room labels
  --output <dir>         Output directory (default: $FLOORPLAN_OUTPUT_DIR or ./room_detection)
  --config <file>        JSON pipeline configuration (overrides --strategy)
  --clean                Rotate to landscape, erase text, symbols and page margins first
  --only <text>          In a folder, only process files whose name contains <text>
  --no-visualize         Only write the JSON room data
  -h, --help             Show this help message

OUTPUT:
  <stem>_enhanced_rooms.json   (walls)  or  <stem>_rooms.json   (seeds)
  <stem>_visualization.png     tinted room overlay
  <stem>_overlay.svg           overlay with room_A, room_B, ... tags

ENVIRONMENT:
  RUST_LOG               Log filter (default: info)

EXAMPLES:
  detect-rooms plans/ --strategy seeds --clean
  detect-rooms ground_floor.png --output out/ --no-visualize
"#
    );
}
