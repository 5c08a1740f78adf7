use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use polysimp::geom::{FeatureRecord, Geometry, ShapeKind};
use polysimp::pipeline::{self, OutputPaths, PipelineCfg};
use polysimp::{coords, shp, simplify};
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::fmt::SubscriberBuilder;

mod config;
mod input;
mod provenance;

use config::{FileConfig, Overrides};

#[derive(Parser)]
#[command(name = "cli")]
#[command(about = "Boundary to polygon shapefiles, simplified, and back to coordinates")]
struct Cmd {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand)]
enum Action {
    /// Run the full pipeline on a `longitude,latitude` text file
    Run {
        #[arg(long)]
        input: PathBuf,
        /// Output directory (default: the input's directory)
        #[arg(long)]
        out_dir: Option<PathBuf>,
        /// Output file stem (default: the input's file stem)
        #[arg(long)]
        stem: Option<String>,
        /// Simplification tolerance in input units (default 0.001)
        #[arg(long)]
        tolerance: Option<f64>,
        /// Opaque CRS tag written to every `.prj` (default: WGS 84)
        #[arg(long, conflicts_with = "crs_file")]
        crs: Option<String>,
        /// Read the CRS tag from a file (e.g. an existing `.prj`)
        #[arg(long)]
        crs_file: Option<PathBuf>,
        /// Write the layers without a `.prj`
        #[arg(long, conflicts_with_all = ["crs", "crs_file"])]
        no_crs: bool,
        /// JSON config; flags take precedence
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Re-simplify every polygon of an existing polygon layer
    Simplify {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        out: PathBuf,
        #[arg(long)]
        tolerance: f64,
    },
    /// Print the records of a layer as JSON, or the first ring as coordinate text
    Dump {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        coords: bool,
    },
    /// Print a small provenance JSON block
    Report,
}

fn main() -> Result<()> {
    let cmd = Cmd::parse();
    let level = if cmd.verbose { Level::DEBUG } else { Level::INFO };
    SubscriberBuilder::default()
        .with_target(false)
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
    match cmd.action {
        Action::Run {
            input,
            out_dir,
            stem,
            tolerance,
            crs,
            crs_file,
            no_crs,
            config,
        } => {
            let file = match config {
                Some(path) => FileConfig::load(&path)?,
                None => FileConfig::default(),
            };
            let overrides = Overrides {
                tolerance,
                crs,
                crs_file,
                no_crs,
                out_dir,
                stem,
            };
            run(&input, overrides, file)
        }
        Action::Simplify {
            input,
            out,
            tolerance,
        } => resimplify(&input, &out, tolerance),
        Action::Dump { input, coords } => dump(&input, coords),
        Action::Report => report(),
    }
}

fn run(input: &Path, overrides: Overrides, file: FileConfig) -> Result<()> {
    let settings = config::resolve(input, overrides, file)?;
    tracing::info!(
        input = %input.display(),
        out_dir = %settings.out_dir.display(),
        stem = %settings.stem,
        tolerance = settings.tolerance,
        crs = settings.crs.is_some(),
        "run"
    );
    let points = input::read_points(input)?;
    let cfg = PipelineCfg {
        tolerance: settings.tolerance,
        crs: settings.crs.clone(),
        outputs: OutputPaths::from_stem(&settings.out_dir, &settings.stem),
    };
    let report = pipeline::run(&points, &cfg)?;

    let o = &report.outputs;
    let outputs = vec![
        o.points_shp.clone(),
        o.polygon_shp.clone(),
        o.simplified_shp.clone(),
        o.coords_txt.clone(),
    ];
    let params = json!({
        "input": input.to_string_lossy(),
        "tolerance": settings.tolerance,
        "crs": settings.crs,
        "input_points": report.input_points,
        "ring_points": report.ring_points,
        "simplified_points": report.simplified_points
    });
    let prov = provenance::write_sidecar(
        &o.coords_txt,
        provenance::Payload::new(params.clone()).with_outputs(outputs.clone()),
    )?;
    tracing::info!(path = %prov.display(), "provenance");

    let summary = json!({
        "params": params,
        "outputs": outputs.iter().map(|p| p.to_string_lossy()).collect::<Vec<_>>()
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn resimplify(input: &Path, out: &Path, tolerance: f64) -> Result<()> {
    let records = shp::read(input).with_context(|| format!("reading {}", input.display()))?;
    let mut simplified = Vec::with_capacity(records.len());
    for (i, rec) in records.into_iter().enumerate() {
        let Geometry::Polygon(poly) = &rec.geometry else {
            bail!("{}: record {} is not a polygon", input.display(), i + 1);
        };
        let ring = simplify::simplify(&poly.exterior, tolerance)?;
        tracing::debug!(record = i + 1, before = poly.exterior.len(), after = ring.len(), "simplified");
        simplified.push(FeatureRecord {
            feature: rec.feature,
            ..FeatureRecord::polygon(ring, rec.crs.clone())
        });
    }
    shp::write(out, &simplified, ShapeKind::Polygon)
        .with_context(|| format!("writing {}", out.display()))?;
    tracing::info!(path = %out.display(), records = simplified.len(), tolerance, "done");
    Ok(())
}

fn dump(input: &Path, as_coords: bool) -> Result<()> {
    if as_coords {
        let points = pipeline::read_first_ring(input)?;
        print!("{}", coords::format_coords(&points));
        return Ok(());
    }
    let records = shp::read(input).with_context(|| format!("reading {}", input.display()))?;
    let docs: Vec<_> = records
        .iter()
        .map(|rec| {
            let bb = rec.geometry.bbox();
            let points: Vec<[f64; 2]> = match &rec.geometry {
                Geometry::Point(p) => vec![[p.x, p.y]],
                Geometry::Polygon(poly) => {
                    poly.exterior.points().iter().map(|p| [p.x, p.y]).collect()
                }
            };
            json!({
                "feature": rec.feature,
                "kind": rec.geometry.shape_kind().to_string(),
                "bbox": [bb.xmin, bb.ymin, bb.xmax, bb.ymax],
                "crs": rec.crs,
                "points": points
            })
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&docs)?);
    Ok(())
}

fn report() -> Result<()> {
    let obj = json!({
        "code_rev": provenance::current_git_rev(),
        "version": polysimp::VERSION,
        "params": {},
        "outputs": []
    });
    println!("{}", serde_json::to_string_pretty(&obj)?);
    Ok(())
}
