use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Tolerance used when neither flag nor config file sets one (input units).
pub const DEFAULT_TOLERANCE: f64 = 0.001;

/// CRS tag written when neither flag nor config file sets one: WGS 84 in the
/// ESRI WKT form GIS tools write to `.prj` for EPSG:4326.
pub const DEFAULT_CRS: &str = "GEOGCS[\"GCS_WGS_1984\",DATUM[\"D_WGS_1984\",\
SPHEROID[\"WGS_84\",6378137.0,298.257223563]],PRIMEM[\"Greenwich\",0.0],\
UNIT[\"Degree\",0.0174532925199433]]";

/// Optional JSON config for `run`. CLI flags take precedence over every field.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub tolerance: Option<f64>,
    pub crs: Option<String>,
    pub crs_file: Option<PathBuf>,
    /// Write layers without a `.prj`.
    pub no_crs: bool,
    pub out_dir: Option<PathBuf>,
    pub stem: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
    }
}

/// Values given on the command line for `run`.
#[derive(Debug, Default)]
pub struct Overrides {
    pub tolerance: Option<f64>,
    pub crs: Option<String>,
    pub crs_file: Option<PathBuf>,
    pub no_crs: bool,
    pub out_dir: Option<PathBuf>,
    pub stem: Option<String>,
}

/// Fully resolved settings for one pipeline run.
#[derive(Debug, PartialEq)]
pub struct RunSettings {
    pub tolerance: f64,
    pub crs: Option<String>,
    pub out_dir: PathBuf,
    pub stem: String,
}

pub fn resolve(input: &Path, cli: Overrides, file: FileConfig) -> Result<RunSettings> {
    let tolerance = cli
        .tolerance
        .or(file.tolerance)
        .unwrap_or(DEFAULT_TOLERANCE);

    // Flags beat the file. Within a level: opt-out, then inline tag, then tag file.
    let crs = if cli.no_crs {
        None
    } else if let Some(tag) = cli.crs {
        Some(tag)
    } else if let Some(p) = cli.crs_file {
        Some(read_crs_file(&p)?)
    } else if file.no_crs {
        None
    } else if let Some(tag) = file.crs {
        Some(tag)
    } else if let Some(p) = file.crs_file {
        Some(read_crs_file(&p)?)
    } else {
        Some(DEFAULT_CRS.to_string())
    };

    let out_dir = match cli.out_dir.or(file.out_dir) {
        Some(dir) => dir,
        None => match input.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        },
    };

    let stem = match cli.stem.or(file.stem) {
        Some(stem) => stem,
        None => match input.file_stem() {
            Some(s) => s.to_string_lossy().into_owned(),
            None => bail!("cannot derive an output stem from {}", input.display()),
        },
    };

    Ok(RunSettings {
        tolerance,
        crs,
        out_dir,
        stem,
    })
}

fn read_crs_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading CRS tag {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_follow_the_input_path() {
        let s = resolve(
            Path::new("/data/1_acarau_mirim.asc"),
            Overrides::default(),
            FileConfig::default(),
        )
        .unwrap();
        assert_eq!(
            s,
            RunSettings {
                tolerance: DEFAULT_TOLERANCE,
                crs: Some(DEFAULT_CRS.to_string()),
                out_dir: PathBuf::from("/data"),
                stem: "1_acarau_mirim".into(),
            }
        );
        let bare = resolve(Path::new("pts.asc"), Overrides::default(), FileConfig::default())
            .unwrap();
        assert_eq!(bare.out_dir, PathBuf::from("."));
    }

    #[test]
    fn flags_override_file() {
        let dir = tempdir().unwrap();
        let cfg_path = dir.path().join("run.json");
        fs::write(
            &cfg_path,
            r#"{"tolerance": 0.01, "crs": "EPSG:4326", "stem": "basin"}"#,
        )
        .unwrap();
        let file = FileConfig::load(&cfg_path).unwrap();
        let s = resolve(
            Path::new("in.asc"),
            Overrides {
                tolerance: Some(0.5),
                ..Overrides::default()
            },
            file,
        )
        .unwrap();
        assert_eq!(s.tolerance, 0.5);
        assert_eq!(s.crs.as_deref(), Some("EPSG:4326"));
        assert_eq!(s.stem, "basin");
    }

    #[test]
    fn crs_file_is_read_verbatim() {
        let dir = tempdir().unwrap();
        let prj = dir.path().join("wgs84.prj");
        fs::write(&prj, "GEOGCS[\"WGS 84\"]").unwrap();
        let s = resolve(
            Path::new("in.asc"),
            Overrides {
                crs_file: Some(prj),
                ..Overrides::default()
            },
            FileConfig::default(),
        )
        .unwrap();
        assert_eq!(s.crs.as_deref(), Some("GEOGCS[\"WGS 84\"]"));
    }

    #[test]
    fn crs_can_be_switched_off() {
        let by_flag = resolve(
            Path::new("in.asc"),
            Overrides {
                no_crs: true,
                ..Overrides::default()
            },
            FileConfig {
                crs: Some("EPSG:4326".into()),
                ..FileConfig::default()
            },
        )
        .unwrap();
        assert_eq!(by_flag.crs, None);

        let dir = tempdir().unwrap();
        let cfg_path = dir.path().join("run.json");
        fs::write(&cfg_path, r#"{"no_crs": true}"#).unwrap();
        let file = FileConfig::load(&cfg_path).unwrap();
        let by_file = resolve(Path::new("in.asc"), Overrides::default(), file).unwrap();
        assert_eq!(by_file.crs, None);

        let flag_wins = resolve(
            Path::new("in.asc"),
            Overrides {
                crs: Some("EPSG:32724".into()),
                ..Overrides::default()
            },
            FileConfig {
                no_crs: true,
                ..FileConfig::default()
            },
        )
        .unwrap();
        assert_eq!(flag_wins.crs.as_deref(), Some("EPSG:32724"));
    }

    #[test]
    fn unknown_keys_rejected() {
        let dir = tempdir().unwrap();
        let cfg_path = dir.path().join("run.json");
        fs::write(&cfg_path, r#"{"tolerence": 0.01}"#).unwrap();
        assert!(FileConfig::load(&cfg_path).is_err());
    }
}
