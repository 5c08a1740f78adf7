//! Pipeline: raw points → point layer → ring → polygon layer → simplified
//! polygon layer → decoded coordinates → coordinate text.
//!
//! Every stage finishes its artifact and re-reads it before the next stage
//! starts. The first failure stops the run and names its stage; artifacts
//! already on disk are left in place and must be treated as stale.

use std::path::{Path, PathBuf};

use crate::coords::write_coords;
use crate::error::Error;
use crate::geom::{make_ring, FeatureRecord, Geometry, Point, ShapeKind};
use crate::shp;
use crate::simplify::simplify;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Configure,
    WritePoints,
    BuildRing,
    WritePolygon,
    Simplify,
    WriteSimplified,
    ReadBack,
    ExportCoords,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Stage::Configure => "configure",
            Stage::WritePoints => "write-points",
            Stage::BuildRing => "build-ring",
            Stage::WritePolygon => "write-polygon",
            Stage::Simplify => "simplify",
            Stage::WriteSimplified => "write-simplified",
            Stage::ReadBack => "read-back",
            Stage::ExportCoords => "export-coords",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A stage failure: where it happened and what went wrong.
#[derive(thiserror::Error, Debug)]
#[error("stage {stage} failed: {source}")]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub source: Error,
}

impl PipelineError {
    /// Originating error kind (`DegenerateGeometry`, `IoError`, ...).
    pub fn kind(&self) -> &'static str {
        self.source.kind()
    }
}

trait AtStage<T> {
    fn at(self, stage: Stage) -> Result<T, PipelineError>;
}

impl<T> AtStage<T> for crate::error::Result<T> {
    fn at(self, stage: Stage) -> Result<T, PipelineError> {
        self.map_err(|source| PipelineError { stage, source })
    }
}

/// Artifact locations; companions (`.shx`, `.dbf`, `.prj`) sit next to each `.shp`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputPaths {
    pub points_shp: PathBuf,
    pub polygon_shp: PathBuf,
    pub simplified_shp: PathBuf,
    pub coords_txt: PathBuf,
}

impl OutputPaths {
    /// `<dir>/<stem>_shape_with_points.shp`, `..._polygon.shp`, `..._polygon_simp.{shp,asc}`.
    pub fn from_stem(dir: &Path, stem: &str) -> Self {
        let simp = dir.join(format!("{stem}_shape_with_polygon_simp.shp"));
        Self {
            points_shp: dir.join(format!("{stem}_shape_with_points.shp")),
            polygon_shp: dir.join(format!("{stem}_shape_with_polygon.shp")),
            coords_txt: simp.with_extension("asc"),
            simplified_shp: simp,
        }
    }
}

#[derive(Clone, Debug)]
pub struct PipelineCfg {
    /// Douglas–Peucker tolerance, in input coordinate units.
    pub tolerance: f64,
    /// Opaque CRS tag written to every `.prj`.
    pub crs: Option<String>,
    pub outputs: OutputPaths,
}

#[derive(Clone, Debug)]
pub struct PipelineReport {
    pub input_points: usize,
    pub ring_points: usize,
    pub simplified_points: usize,
    pub outputs: OutputPaths,
    /// Coordinates decoded from the simplified layer, in file order.
    pub coords: Vec<Point>,
}

/// Run all stages in order.
pub fn run(points: &[Point], cfg: &PipelineCfg) -> Result<PipelineReport, PipelineError> {
    if !(cfg.tolerance.is_finite() && cfg.tolerance > 0.0) {
        return Err(PipelineError {
            stage: Stage::Configure,
            source: Error::InvalidTolerance(cfg.tolerance),
        });
    }
    let out = &cfg.outputs;

    let point_records: Vec<FeatureRecord> = points
        .iter()
        .map(|p| FeatureRecord::point(*p, cfg.crs.clone()))
        .collect();
    write_verified(&out.points_shp, &point_records, ShapeKind::Point).at(Stage::WritePoints)?;

    let ring = make_ring(points).at(Stage::BuildRing)?;
    let ring_points = ring.len();
    tracing::info!(points = points.len(), ring_points, "built ring");

    let polygon = [FeatureRecord::polygon(ring.clone(), cfg.crs.clone())];
    write_verified(&out.polygon_shp, &polygon, ShapeKind::Polygon).at(Stage::WritePolygon)?;

    let simplified = simplify(&ring, cfg.tolerance).at(Stage::Simplify)?;
    tracing::info!(
        tolerance = cfg.tolerance,
        before = ring_points,
        after = simplified.len(),
        "simplified ring"
    );

    let simp_record = [FeatureRecord::polygon(simplified, cfg.crs.clone())];
    write_verified(&out.simplified_shp, &simp_record, ShapeKind::Polygon)
        .at(Stage::WriteSimplified)?;

    let coords = read_first_ring(&out.simplified_shp).at(Stage::ReadBack)?;
    write_coords(&out.coords_txt, &coords).at(Stage::ExportCoords)?;
    tracing::info!(path = %out.coords_txt.display(), points = coords.len(), "done");

    Ok(PipelineReport {
        input_points: points.len(),
        ring_points,
        simplified_points: coords.len(),
        outputs: out.clone(),
        coords,
    })
}

/// Write a layer, then re-read it so the next stage only starts on a readable artifact.
fn write_verified(
    path: &Path,
    records: &[FeatureRecord],
    kind: ShapeKind,
) -> crate::error::Result<()> {
    shp::write(path, records, kind)?;
    let back = shp::read(path)?;
    if back.len() != records.len() {
        return Err(Error::record(
            back.len().min(records.len()) + 1,
            format!("wrote {} records, read back {}", records.len(), back.len()),
        ));
    }
    tracing::info!(path = %path.display(), records = records.len(), %kind, "done");
    Ok(())
}

/// Points of the first polygon in a layer.
pub fn read_first_ring(path: &Path) -> crate::error::Result<Vec<Point>> {
    let records = shp::read(path)?;
    match records.into_iter().next().map(|r| r.geometry) {
        Some(Geometry::Polygon(poly)) => Ok(poly.exterior.into_points()),
        Some(Geometry::Point(_)) => Err(Error::InvalidInput(format!(
            "{} holds points, expected a polygon",
            path.display()
        ))),
        None => Err(Error::InvalidInput(format!("{} holds no records", path.display()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::vector;
    use tempfile::tempdir;

    fn wiggle() -> Vec<Point> {
        vec![
            vector![0.0, 0.0],
            vector![1.0, 0.01],
            vector![2.0, -0.01],
            vector![3.0, 0.0],
        ]
    }

    #[test]
    fn produces_all_artifacts() {
        let dir = tempdir().unwrap();
        let cfg = PipelineCfg {
            tolerance: 0.05,
            crs: Some("EPSG:4326".into()),
            outputs: OutputPaths::from_stem(dir.path(), "basin"),
        };
        let report = run(&wiggle(), &cfg).unwrap();
        assert_eq!(report.input_points, 4);
        assert_eq!(report.ring_points, 5);
        assert_eq!(report.simplified_points, 3);
        assert_eq!(
            report.coords,
            vec![vector![0.0, 0.0], vector![3.0, 0.0], vector![0.0, 0.0]]
        );
        let o = &cfg.outputs;
        for shp_path in [&o.points_shp, &o.polygon_shp, &o.simplified_shp] {
            for ext in ["shp", "shx", "dbf", "prj"] {
                assert!(shp_path.with_extension(ext).exists());
            }
        }
        assert_eq!(
            std::fs::read_to_string(&o.coords_txt).unwrap(),
            "0.000000000,0.000000000\n3.000000000,0.000000000\n0.000000000,0.000000000\n"
        );
        assert_eq!(shp::read(&o.points_shp).unwrap().len(), 4);
        assert!(o
            .coords_txt
            .ends_with("basin_shape_with_polygon_simp.asc"));
    }

    #[test]
    fn bad_tolerance_fails_before_any_write() {
        let dir = tempdir().unwrap();
        let cfg = PipelineCfg {
            tolerance: 0.0,
            crs: None,
            outputs: OutputPaths::from_stem(dir.path(), "x"),
        };
        let err = run(&wiggle(), &cfg).unwrap_err();
        assert_eq!(err.stage, Stage::Configure);
        assert_eq!(err.kind(), "InvalidTolerance");
        assert!(!cfg.outputs.points_shp.exists());
    }

    #[test]
    fn degenerate_input_names_build_stage() {
        let dir = tempdir().unwrap();
        let cfg = PipelineCfg {
            tolerance: 0.001,
            crs: None,
            outputs: OutputPaths::from_stem(dir.path(), "x"),
        };
        let p = vector![1.0, 1.0];
        let err = run(&[p, p], &cfg).unwrap_err();
        assert_eq!(err.stage, Stage::BuildRing);
        assert!(matches!(err.source, Error::DegenerateGeometry(_)));
        assert!(err.to_string().starts_with("stage build-ring failed"));
        // The point layer was already written; it stays on disk.
        assert!(cfg.outputs.points_shp.exists());
        assert!(!cfg.outputs.polygon_shp.exists());
    }

    #[test]
    fn missing_output_dir_is_io_error() {
        let dir = tempdir().unwrap();
        let cfg = PipelineCfg {
            tolerance: 0.001,
            crs: None,
            outputs: OutputPaths::from_stem(&dir.path().join("absent"), "x"),
        };
        let err = run(&wiggle(), &cfg).unwrap_err();
        assert_eq!(err.stage, Stage::WritePoints);
        assert_eq!(err.kind(), "IoError");
    }
}
