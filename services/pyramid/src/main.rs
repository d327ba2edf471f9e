//! Tile pyramid command line tool.
//!
//! `resolve` prints the execution plan of a job description; `build` converts
//! a single raster into a tile pyramid job and hands it to the dry-run
//! engine.

mod engine;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use engine::DryRunEngine;
use process_config::{
    raster_to_pyramid, ConfigResolver, OutputFormat, Overrides, PyramidOptions, Resampling,
    ScaleMode,
};
use raster_io::GeoTiffOpener;
use tile_common::PyramidType;

#[derive(Parser, Debug)]
#[command(name = "pyramid")]
#[command(about = "Resolve tile pyramid jobs and convert rasters into tile pyramids")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG", global = true)]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Pretty-print the plan
    #[arg(long, global = true)]
    pretty: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve a job description and print its plan
    Resolve {
        /// Job description file
        job: PathBuf,

        /// One or two zoom levels
        #[arg(short, long, num_args = 1..=2)]
        zoom: Vec<i64>,

        /// Process bounds: minx miny maxx maxy
        #[arg(short, long, num_args = 1.., allow_negative_numbers = true)]
        bounds: Option<Vec<f64>>,

        /// Override the output path
        #[arg(long)]
        output_path: Option<PathBuf>,

        /// Override the output format
        #[arg(long)]
        output_format: Option<OutputFormat>,
    },

    /// Convert a raster into a tile pyramid
    Build {
        /// Input raster (GeoTIFF)
        input: PathBuf,

        /// Output directory
        output_dir: PathBuf,

        /// Tile grid
        #[arg(long, default_value = "geodetic", env = "PYRAMID_TYPE")]
        pyramid_type: PyramidType,

        /// Output format
        #[arg(long, default_value = "GTiff", env = "PYRAMID_OUTPUT_FORMAT")]
        output_format: OutputFormat,

        /// Resampling method
        #[arg(long, default_value = "nearest", env = "PYRAMID_RESAMPLING")]
        resampling: Resampling,

        /// Scale method: none, dtype_scale, minmax_scale, crop
        #[arg(long, default_value = "none", env = "PYRAMID_SCALE_METHOD")]
        scale_method: ScaleMode,

        /// One or two zoom levels; defaults to 1 up to the best zoom
        #[arg(short, long, num_args = 1..=2)]
        zoom: Vec<i64>,

        /// Process bounds: minx miny maxx maxy
        #[arg(short, long, num_args = 1.., allow_negative_numbers = true)]
        bounds: Option<Vec<f64>>,

        /// Replace existing output tiles
        #[arg(long)]
        overwrite: bool,
    },
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(&args.log_level, args.json);

    let engine = DryRunEngine::new(std::io::stdout(), args.pretty);

    match args.command {
        Command::Resolve {
            job,
            zoom,
            bounds,
            output_path,
            output_format,
        } => {
            let overrides = Overrides {
                zoom,
                bounds,
                output_path,
                output_format,
            };
            let resolved = ConfigResolver::new(&GeoTiffOpener)
                .resolve_file(&job, &overrides)
                .with_context(|| format!("failed to resolve {}", job.display()))?;

            let plan = if args.pretty {
                serde_json::to_string_pretty(&resolved)?
            } else {
                serde_json::to_string(&resolved)?
            };
            println!("{}", plan);
        }
        Command::Build {
            input,
            output_dir,
            pyramid_type,
            output_format,
            resampling,
            scale_method,
            zoom,
            bounds,
            overwrite,
        } => {
            let options = PyramidOptions {
                pyramid_type,
                scale_method,
                output_format,
                resampling,
                zoom,
                bounds,
                overwrite,
            };
            info!(input = %input.display(), output = %output_dir.display(), "Starting pyramid build");
            let resolved = raster_to_pyramid(&GeoTiffOpener, &engine, &input, &output_dir, &options)
                .with_context(|| format!("failed to build pyramid from {}", input.display()))?;
            info!(zoom_levels = ?resolved.zoom_levels, "Pyramid job finished");
        }
    }

    Ok(())
}

fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    // stdout carries the plan
    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
