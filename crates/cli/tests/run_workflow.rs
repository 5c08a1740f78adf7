//! End-to-end runs of the `cli` binary against temporary directories.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use polysimp::geom::Geometry;
use polysimp::shp;
use tempfile::TempDir;

const WIGGLE: &str = "0.0,0.0\n1.0,0.01\n2.0,-0.01\n3.0,0.0\n";

fn cli(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_cli"))
        .args(args)
        .output()
        .expect("spawn cli")
}

fn write_input(dir: &Path) -> String {
    let input = dir.join("wiggle.asc");
    fs::write(&input, WIGGLE).unwrap();
    input.to_string_lossy().into_owned()
}

#[test]
fn run_writes_every_artifact() {
    let tmp = TempDir::new().unwrap();
    let input = write_input(tmp.path());
    let out = cli(&["run", "--input", &input, "--tolerance", "0.05"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let dir = tmp.path();
    for name in [
        "wiggle_shape_with_points",
        "wiggle_shape_with_polygon",
        "wiggle_shape_with_polygon_simp",
    ] {
        for ext in ["shp", "shx", "dbf", "prj"] {
            assert!(dir.join(format!("{name}.{ext}")).exists(), "{name}.{ext}");
        }
        let prj = fs::read_to_string(dir.join(format!("{name}.prj"))).unwrap();
        assert!(prj.starts_with("GEOGCS[\"GCS_WGS_1984\""), "{prj}");
    }
    assert_eq!(
        fs::read_to_string(dir.join("wiggle_shape_with_polygon_simp.asc")).unwrap(),
        "0.000000000,0.000000000\n3.000000000,0.000000000\n0.000000000,0.000000000\n"
    );
    assert!(dir
        .join("wiggle_shape_with_polygon_simp.provenance.json")
        .exists());

    let summary: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(summary["params"]["simplified_points"], 3);
}

#[test]
fn simplify_and_dump_existing_layer() {
    let tmp = TempDir::new().unwrap();
    let input = write_input(tmp.path());
    let out = cli(&["run", "--input", &input, "--tolerance", "0.001"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let polygon = tmp.path().join("wiggle_shape_with_polygon.shp");
    let resimp = tmp.path().join("resimp.shp");
    let out = cli(&[
        "simplify",
        "--input",
        &polygon.to_string_lossy(),
        "--out",
        &resimp.to_string_lossy(),
        "--tolerance",
        "0.05",
    ]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let recs = shp::read(&resimp).unwrap();
    match &recs[0].geometry {
        Geometry::Polygon(poly) => assert_eq!(poly.exterior.len(), 3),
        other => panic!("expected polygon, got {other:?}"),
    }

    let out = cli(&["dump", "--input", &resimp.to_string_lossy(), "--coords"]);
    assert!(out.status.success());
    assert_eq!(
        String::from_utf8_lossy(&out.stdout),
        "0.000000000,0.000000000\n3.000000000,0.000000000\n0.000000000,0.000000000\n"
    );
}

#[test]
fn no_crs_skips_projection_files() {
    let tmp = TempDir::new().unwrap();
    let input = write_input(tmp.path());
    let out = cli(&["run", "--input", &input, "--no-crs"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert!(tmp.path().join("wiggle_shape_with_polygon.shp").exists());
    assert!(!tmp.path().join("wiggle_shape_with_polygon.prj").exists());
    let recs = shp::read(&tmp.path().join("wiggle_shape_with_polygon_simp.shp")).unwrap();
    assert_eq!(recs[0].crs, None);
}

#[test]
fn degenerate_input_fails_with_stage() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("dup.asc");
    fs::write(&input, "1.0,1.0\n1.0,1.0\n").unwrap();
    let out = cli(&["run", "--input", &input.to_string_lossy()]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("build-ring"), "{stderr}");
}
