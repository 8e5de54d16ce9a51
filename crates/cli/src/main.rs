//! svcarea CLI - buffer-zone service-area analysis

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use svcarea_algorithms::vector::{
    bounds, buffer, reproject, total_area, union, AttributePolicy, BufferParams, DEFAULT_SEGMENTS,
};
use svcarea_core::io::{read_vector, write_vector};
use svcarea_core::{Feature, FeatureCollection, CRS};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "svcarea")]
#[command(author, version, about = "Buffer-zone service-area analysis", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a vector layer
    Info {
        /// Input Shapefile (.shp) or GeoJSON file
        input: PathBuf,
    },
    /// Transform a layer into another CRS
    Reproject {
        /// Input layer
        input: PathBuf,
        /// Output layer (.shp or .geojson)
        output: PathBuf,
        /// Target CRS: EPSG:<n>, a bare code, an OGC URN or WKT
        #[arg(long)]
        crs: String,
    },
    /// Buffer every point of a layer
    Buffer {
        /// Input point layer (projected CRS)
        input: PathBuf,
        /// Output polygon layer
        output: PathBuf,
        /// Buffer radius in CRS units
        #[arg(short, long)]
        distance: f64,
        /// Vertices per buffer ring (minimum 32)
        #[arg(long, default_value_t = DEFAULT_SEGMENTS)]
        segments: usize,
        /// Do not copy point attributes onto the buffers
        #[arg(long)]
        drop_attributes: bool,
    },
    /// Dissolve all polygons of a layer into one feature
    Union {
        /// Input polygon layer
        input: PathBuf,
        /// Output layer with a single feature
        output: PathBuf,
    },
    /// Full pipeline: reproject, buffer and dissolve a point layer
    ServiceArea {
        /// Input point layer
        points: PathBuf,
        /// Output service-area layer
        output: PathBuf,
        /// Projected CRS to buffer in
        #[arg(long)]
        crs: String,
        /// Buffer radius in units of --crs
        #[arg(short, long)]
        distance: f64,
        /// Vertices per buffer ring (minimum 32)
        #[arg(long, default_value_t = DEFAULT_SEGMENTS)]
        segments: usize,
        /// Also write the individual buffers to this path
        #[arg(long)]
        buffers: Option<PathBuf>,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber failed")
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn read_layer(path: &Path) -> Result<FeatureCollection> {
    let pb = spinner("Reading layer...");
    let layer = read_vector(path).with_context(|| format!("Failed to read {}", path.display()));
    pb.finish_and_clear();
    let layer = layer?;
    info!("Input: {} features, CRS {}", layer.len(), layer.crs());
    Ok(layer)
}

fn write_layer(layer: &FeatureCollection, path: &Path) -> Result<()> {
    let pb = spinner("Writing output...");
    let result = write_vector(layer, path).with_context(|| format!("Failed to write {}", path.display()));
    pb.finish_and_clear();
    result
}

fn parse_crs(text: &str) -> Result<CRS> {
    let crs = CRS::parse(text).with_context(|| format!("Invalid CRS: {}", text))?;
    crs.definition()
        .with_context(|| format!("Unsupported CRS: {}", text))?;
    Ok(crs)
}

fn done(name: &str, path: &Path, elapsed: std::time::Duration) {
    println!("{} saved to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

fn dissolved_layer(layer: &FeatureCollection) -> Result<FeatureCollection> {
    let merged = union(layer).context("Failed to dissolve polygons")?;
    Ok(FeatureCollection::new(layer.crs().clone(), vec![Feature::new(merged)]))
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    match cli.command {
        // ── Info ─────────────────────────────────────────────────────
        Commands::Info { input } => {
            let layer = read_layer(&input)?;
            let kinds: Vec<&str> = layer.geometry_kinds().iter().map(|k| k.name()).collect();

            println!("File: {}", input.display());
            println!("Features: {}", layer.len());
            println!("Geometry: {}", kinds.join(", "));
            println!("CRS: {}", layer.crs().identifier());
            match layer.crs().definition() {
                Ok(def) => {
                    println!("  Canonical: {}", def);
                    println!("  Unit: {}", def.unit);
                }
                Err(e) => println!("  Unresolved: {}", e),
            }
            if let Some(rect) = bounds(&layer) {
                println!(
                    "Bounds: ({:.6}, {:.6}) - ({:.6}, {:.6})",
                    rect.min().x,
                    rect.min().y,
                    rect.max().x,
                    rect.max().y
                );
            }
            let area = total_area(&layer);
            if area > 0.0 {
                println!("Polygon area: {:.2}", area);
            }
            let fields = layer.attribute_names();
            if !fields.is_empty() {
                println!("Fields: {}", fields.join(", "));
            }
        }

        // ── Reproject ────────────────────────────────────────────────
        Commands::Reproject { input, output, crs } => {
            let target = parse_crs(&crs)?;
            let layer = read_layer(&input)?;
            let start = Instant::now();
            let result = reproject(&layer, &target).context("Failed to reproject")?;
            let elapsed = start.elapsed();
            write_layer(&result, &output)?;
            done("Reprojected layer", &output, elapsed);
        }

        // ── Buffer ───────────────────────────────────────────────────
        Commands::Buffer {
            input,
            output,
            distance,
            segments,
            drop_attributes,
        } => {
            let layer = read_layer(&input)?;
            let params = BufferParams {
                distance,
                segments,
                attributes: if drop_attributes {
                    AttributePolicy::Drop
                } else {
                    AttributePolicy::Inherit
                },
            };
            let start = Instant::now();
            let result = buffer(&layer, &params).context("Failed to buffer points")?;
            let elapsed = start.elapsed();
            write_layer(&result, &output)?;
            done("Buffers", &output, elapsed);
        }

        // ── Union ────────────────────────────────────────────────────
        Commands::Union { input, output } => {
            let layer = read_layer(&input)?;
            let start = Instant::now();
            let result = dissolved_layer(&layer)?;
            let elapsed = start.elapsed();
            write_layer(&result, &output)?;
            done("Union", &output, elapsed);
        }

        // ── Service area ─────────────────────────────────────────────
        Commands::ServiceArea {
            points,
            output,
            crs,
            distance,
            segments,
            buffers,
        } => {
            let target = parse_crs(&crs)?;
            let layer = read_layer(&points)?;
            let start = Instant::now();

            let projected = reproject(&layer, &target).context("Failed to reproject points")?;
            let params = BufferParams {
                distance,
                segments,
                ..Default::default()
            };
            let zones = buffer(&projected, &params).context("Failed to buffer points")?;
            let area = dissolved_layer(&zones)?;
            let elapsed = start.elapsed();

            if let Some(path) = &buffers {
                write_layer(&zones, path)?;
                println!("Buffers saved to: {}", path.display());
            }
            write_layer(&area, &output)?;
            println!("Covered area: {:.2} {}²", total_area(&area), target.definition()?.unit);
            done("Service area", &output, elapsed);
        }
    }

    Ok(())
}
