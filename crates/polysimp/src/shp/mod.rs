//! Shapefile-family codec for point and single-ring polygon layers.
//!
//! Purpose
//! - Persist `FeatureRecord`s as main stream (`.shp`), positional index
//!   (`.shx`), feature table (`.dbf`) and opaque CRS sidecar (`.prj`), readable
//!   by other tools of the same ecosystem.
//!
//! Byte order
//! - Coordinates and bounding boxes: f64 LE.
//! - File header and record header integers: i32 BE.
//! - Record content integers (kind, counts, part starts): i32 LE.
//!
//! Reads follow the length-prefixed framing of the main stream; the index is
//! only used for random access (`read_record_at`).
//!
//! Code cross-refs: `geom::{FeatureRecord, Geometry, ShapeKind}`, `pipeline::run`

mod dbf;
mod header;
mod index;
mod read;
mod write;

use std::path::{Path, PathBuf};

pub use header::{FileHeader, FILE_CODE, HEADER_LEN, RECORD_HEADER_LEN, VERSION};
pub use index::{decode_index, read_index, read_record_at, IndexEntry};
pub use read::{decode, read};
pub use write::{content_len, encode, write, Encoded};

/// Companion file of `path` with extension `ext` (`shx`, `dbf`, `prj`).
pub fn sidecar_path(path: &Path, ext: &str) -> PathBuf {
    path.with_extension(ext)
}
