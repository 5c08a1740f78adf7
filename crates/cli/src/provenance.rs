use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::fs;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Run parameters and produced artifacts recorded in a provenance sidecar.
pub struct Payload {
    pub params: Value,
    pub outputs: Vec<PathBuf>,
}

impl Payload {
    pub fn new(params: Value) -> Self {
        Self {
            params,
            outputs: Vec::new(),
        }
    }

    pub fn with_outputs<I: IntoIterator<Item = PathBuf>>(mut self, outputs: I) -> Self {
        self.outputs.extend(outputs);
        self
    }
}

/// Write `<artifact>.provenance.json` containing the git commit, callsite, params, and outputs.
#[track_caller]
pub fn write_sidecar<P: AsRef<Path>>(artifact: P, payload: Payload) -> Result<PathBuf> {
    let artifact = artifact.as_ref();
    let provenance_path = provenance_path(artifact);
    let callsite = Location::caller();
    let mut outputs: Vec<String> = payload
        .outputs
        .iter()
        .map(|p| p.to_string_lossy().into_owned())
        .collect();
    if outputs.is_empty() {
        outputs.push(artifact.to_string_lossy().into_owned());
    }
    let doc = json!({
        "code_rev": current_git_rev(),
        "version": polysimp::VERSION,
        "callsite": {
            "file": callsite.file(),
            "line": callsite.line()
        },
        "params": payload.params,
        "outputs": outputs
    });
    fs::write(&provenance_path, serde_json::to_vec_pretty(&doc)?)
        .with_context(|| format!("writing {}", provenance_path.display()))?;
    Ok(provenance_path)
}

/// `<dir>/<stem>.asc` -> `<dir>/<stem>.provenance.json`.
fn provenance_path(artifact: &Path) -> PathBuf {
    artifact.with_extension("provenance.json")
}

/// Commit the run came from: `GIT_COMMIT` baked in at build time, then from the
/// environment, then `git rev-parse`; `"unknown"` outside a checkout.
pub fn current_git_rev() -> String {
    let baked = option_env!("GIT_COMMIT")
        .filter(|rev| !rev.is_empty())
        .map(str::to_owned);
    let from_env = || std::env::var("GIT_COMMIT").ok().filter(|rev| !rev.is_empty());
    baked
        .or_else(from_env)
        .or_else(git_head)
        .unwrap_or_else(|| "unknown".to_owned())
}

fn git_head() -> Option<String> {
    let out = Command::new("git").args(["rev-parse", "HEAD"]).output().ok()?;
    if !out.status.success() {
        return None;
    }
    let rev = String::from_utf8(out.stdout).ok()?;
    Some(rev.trim().to_owned()).filter(|rev| !rev.is_empty())
}
