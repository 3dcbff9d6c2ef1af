//! Urban / rural classification of population rasters.
//!
//! Reads a population grid (PopulationGrid JSON or GeoTIFF), optionally
//! sum-aggregates it to coarser cells, classifies it by contiguity and
//! writes the output raster plus summary figures as JSON.
mod raster;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;
use urbanmask_core::{
    aggregate_sum, classify_parallel, ClassificationSummary, ClassifyParams, ClusterInfo,
    ConnectivityMode, PopulationGrid,
};

// ── CLI ──────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "urbanmask", about = "Classify population rasters into urban and rural cells")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify a grid and write the output raster as JSON.
    Classify {
        #[command(flatten)]
        input: InputArgs,

        /// Output JSON file.
        #[arg(short, long, default_value = "urban.json")]
        output: PathBuf,

        /// Include per-cluster diagnostics in the output.
        #[arg(long)]
        clusters: bool,
    },
    /// Classify a grid and print the summary only.
    Summary {
        #[command(flatten)]
        input: InputArgs,
    },
}

#[derive(ClapArgs, Debug)]
struct InputArgs {
    /// Population grid (.json PopulationGrid, .tif or .tiff).
    #[arg(short, long)]
    input: PathBuf,

    /// JSON file with ClassifyParams; flags below override it.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Population per cell a candidate must exceed.
    #[arg(long)]
    density_cutoff: Option<f64>,

    /// Minimum aggregate population of an urban cluster.
    #[arg(long)]
    min_cluster_population: Option<f64>,

    /// Neighbour rule: 4 or 8.
    #[arg(long)]
    connectivity: Option<ConnectivityMode>,

    /// Write 1 / 0 urban-rural codes instead of the population mask.
    #[arg(long)]
    categorical: bool,

    /// Sum-aggregate N×N input cells before classifying.
    #[arg(long, default_value = "1")]
    aggregate: usize,

    /// Treat this input value as no data.
    #[arg(long)]
    nodata: Option<f32>,

    /// Worker threads for band labelling (0 = rayon default).
    #[arg(long, default_value = "0")]
    threads: usize,
}

// ── Output schema ────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct Output<'a> {
    params: &'a ClassifyParams,
    summary: &'a ClassificationSummary,
    width: usize,
    height: usize,
    /// Row-major output cells; `null` marks no data.
    raster: Vec<Option<f32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    clusters: Option<&'a [ClusterInfo]>,
}

// ── Setup ────────────────────────────────────────────────────────────────────

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_params(args: &InputArgs) -> Result<ClassifyParams> {
    let mut params = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Cannot read config {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("Invalid config JSON in {}", path.display()))?
        }
        None => ClassifyParams::default(),
    };

    if let Some(v) = args.density_cutoff {
        params.density_cutoff = v;
    }
    if let Some(v) = args.min_cluster_population {
        params.min_cluster_population = v;
    }
    if let Some(v) = args.connectivity {
        params.connectivity = v;
    }
    if args.categorical {
        params.mask_mode = false;
    }
    params.validate()?;
    Ok(params)
}

#[cfg(feature = "threading")]
fn band_count(threads: usize) -> Result<usize> {
    if threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("Cannot configure the rayon thread pool")?;
    }
    Ok(rayon::current_num_threads())
}

#[cfg(not(feature = "threading"))]
fn band_count(_threads: usize) -> Result<usize> {
    Ok(1)
}

fn load(args: &InputArgs) -> Result<PopulationGrid> {
    let grid = raster::load_grid(&args.input, args.nodata)?;
    info!(
        width = grid.width,
        height = grid.height,
        valid = grid.valid_cells(),
        "loaded {}",
        args.input.display()
    );
    if args.aggregate > 1 {
        let agg = aggregate_sum(&grid, args.aggregate)?;
        info!(factor = args.aggregate, width = agg.width, height = agg.height, "aggregated grid");
        Ok(agg)
    } else {
        Ok(grid)
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Cannot create {}", parent.display()))?;
    }
    let json = serde_json::to_string(value)?;
    fs::write(path, json).with_context(|| format!("Write failed: {}", path.display()))
}

// ── Main ─────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Command::Classify { input, output, clusters } => {
            let params = resolve_params(&input)?;
            let bands = band_count(input.threads)?;
            let grid = load(&input)?;

            let result = classify_parallel(&grid, &params, bands)?;
            let summary = ClassificationSummary::from_result(&grid, &result);
            info!(
                urban_cells = summary.urban_cells,
                urban_clusters = summary.urban_clusters,
                urban_share = summary.urban_share,
                "classification complete"
            );

            let raster = result
                .raster()
                .into_iter()
                .map(|v| if v.is_nan() { None } else { Some(v) })
                .collect();
            let out = Output {
                params: &params,
                summary: &summary,
                width: result.width,
                height: result.height,
                raster,
                clusters: clusters.then_some(result.clusters.as_slice()),
            };
            write_json(&output, &out)?;
            info!("wrote {}", output.display());
        }
        Command::Summary { input } => {
            let params = resolve_params(&input)?;
            let bands = band_count(input.threads)?;
            let grid = load(&input)?;

            let result = classify_parallel(&grid, &params, bands)?;
            let summary = ClassificationSummary::from_result(&grid, &result);
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    Ok(())
}
