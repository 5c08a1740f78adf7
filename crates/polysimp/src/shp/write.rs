//! Write path: main stream, index stream, feature table, CRS sidecar.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use byteorder::{BigEndian, LittleEndian, WriteBytesExt};

use super::dbf;
use super::header::{FileHeader, HEADER_LEN, RECORD_HEADER_LEN};
use super::index::IndexEntry;
use super::sidecar_path;
use crate::error::{Error, Result};
use crate::geom::{BoundingBox, FeatureRecord, Geometry, Point, ShapeKind};

/// Encoded streams for one write, ready to hit disk.
#[derive(Clone, Debug, PartialEq)]
pub struct Encoded {
    pub shp: Vec<u8>,
    pub shx: Vec<u8>,
    pub dbf: Vec<u8>,
    pub crs: Option<String>,
}

/// Record content size in bytes (record header excluded).
pub fn content_len(geometry: &Geometry) -> usize {
    match geometry {
        Geometry::Point(_) => 4 + 16,
        // kind + bbox + part count + point count + one part index + points
        Geometry::Polygon(poly) => 4 + 32 + 4 + 4 + 4 + 16 * poly.exterior.len(),
    }
}

/// Check records against the declared kind and agree on a single CRS tag.
fn validate(records: &[FeatureRecord], kind: ShapeKind) -> Result<Option<String>> {
    let mut crs: Option<&String> = None;
    for (i, rec) in records.iter().enumerate() {
        let got = rec.geometry.shape_kind();
        if got != kind {
            return Err(Error::InvalidInput(format!(
                "record {} is a {got} but the file shape kind is {kind}",
                i + 1
            )));
        }
        if let Some(tag) = rec.crs.as_ref() {
            match crs {
                Some(prev) if prev != tag => {
                    return Err(Error::InvalidInput(format!(
                        "record {} carries a different CRS tag than earlier records",
                        i + 1
                    )))
                }
                _ => crs = Some(tag),
            }
        }
    }
    Ok(crs.cloned())
}

/// Total stream length in words, rejecting files the 32-bit length field cannot describe.
fn stream_words(records: &[FeatureRecord]) -> Result<i32> {
    let total: usize = HEADER_LEN
        + records
            .iter()
            .map(|r| RECORD_HEADER_LEN + content_len(&r.geometry))
            .sum::<usize>();
    i32::try_from(total / 2).map_err(|_| {
        Error::InvalidInput(format!("{total} bytes exceed the format's 32-bit length"))
    })
}

fn in_memory(e: io::Error) -> Error {
    Error::io("<memory>", e)
}

/// Encode all streams in memory.
pub fn encode(records: &[FeatureRecord], kind: ShapeKind) -> Result<Encoded> {
    let crs = validate(records, kind)?;
    let total_words = stream_words(records)?;
    let mut shp = Vec::with_capacity(total_words as usize * 2);
    let shx = encode_streams(records, kind, total_words, &mut shp).map_err(in_memory)?;
    let features: Vec<i32> = records.iter().map(|r| r.feature).collect();
    let mut dbf_bytes = Vec::new();
    dbf::encode(&features, &mut dbf_bytes).map_err(in_memory)?;
    Ok(Encoded {
        shp,
        shx,
        dbf: dbf_bytes,
        crs,
    })
}

/// Stream records into `shp` and return the matching index stream.
///
/// Index entries are produced from the same running offset as the record
/// framing, so the two streams cannot drift apart. Offsets fit in `i32`
/// because `total_words` was already checked.
fn encode_streams<W: Write>(
    records: &[FeatureRecord],
    kind: ShapeKind,
    total_words: i32,
    shp: &mut W,
) -> io::Result<Vec<u8>> {
    let bbox = records
        .iter()
        .map(|r| r.geometry.bbox())
        .reduce(|a, b| a.union(&b));
    let header = FileHeader {
        file_length_words: total_words,
        shape_kind: kind,
        bbox,
    };
    let shx_len = HEADER_LEN + 8 * records.len();
    let mut shx = Vec::with_capacity(shx_len);
    FileHeader {
        file_length_words: (shx_len / 2) as i32,
        ..header
    }
    .write_to(&mut shx)?;

    header.write_to(shp)?;
    let mut offset = HEADER_LEN;
    for (i, rec) in records.iter().enumerate() {
        let len = content_len(&rec.geometry);
        let entry = IndexEntry {
            offset_words: (offset / 2) as i32,
            content_words: (len / 2) as i32,
        };
        write_record(shp, i + 1, entry.content_words, &rec.geometry)?;
        entry.write_to(&mut shx)?;
        offset += RECORD_HEADER_LEN + len;
    }
    debug_assert_eq!(offset, total_words as usize * 2);
    tracing::debug!(records = records.len(), words = total_words, %kind, "encoded shapes");
    Ok(shx)
}

fn write_record<W: Write>(
    w: &mut W,
    number: usize,
    content_words: i32,
    geometry: &Geometry,
) -> io::Result<()> {
    w.write_i32::<BigEndian>(number as i32)?;
    w.write_i32::<BigEndian>(content_words)?;
    w.write_i32::<LittleEndian>(geometry.shape_kind().code())?;
    match geometry {
        Geometry::Point(p) => write_point(w, *p),
        Geometry::Polygon(poly) => {
            let ring = poly.exterior.points();
            write_bbox(w, &poly.bbox())?;
            w.write_i32::<LittleEndian>(1)?;
            w.write_i32::<LittleEndian>(ring.len() as i32)?;
            w.write_i32::<LittleEndian>(0)?;
            for p in ring {
                write_point(w, *p)?;
            }
            Ok(())
        }
    }
}

#[inline]
fn write_point<W: Write>(w: &mut W, p: Point) -> io::Result<()> {
    w.write_f64::<LittleEndian>(p.x)?;
    w.write_f64::<LittleEndian>(p.y)
}

fn write_bbox<W: Write>(w: &mut W, bb: &BoundingBox) -> io::Result<()> {
    for v in [bb.xmin, bb.ymin, bb.xmax, bb.ymax] {
        w.write_f64::<LittleEndian>(v)?;
    }
    Ok(())
}

/// Write `records` to `path` (`.shp`) plus `.shx`, `.dbf` and, when tagged, `.prj`.
///
/// Every companion is regenerated; a `.prj` left by an earlier write is removed
/// when the records carry no CRS tag. A failed write leaves partial files behind.
pub fn write(path: &Path, records: &[FeatureRecord], kind: ShapeKind) -> Result<()> {
    let crs = validate(records, kind)?;
    let total_words = stream_words(records)?;

    let file = File::create(path).map_err(|e| Error::io(path, e))?;
    let mut shp = BufWriter::new(file);
    let shx = encode_streams(records, kind, total_words, &mut shp).map_err(|e| Error::io(path, e))?;
    shp.flush().map_err(|e| Error::io(path, e))?;

    let shx_path = sidecar_path(path, "shx");
    fs::write(&shx_path, &shx).map_err(|e| Error::io(&shx_path, e))?;

    let dbf_path = sidecar_path(path, "dbf");
    let features: Vec<i32> = records.iter().map(|r| r.feature).collect();
    let mut dbf_out = BufWriter::new(File::create(&dbf_path).map_err(|e| Error::io(&dbf_path, e))?);
    dbf::encode(&features, &mut dbf_out)
        .and_then(|_| dbf_out.flush())
        .map_err(|e| Error::io(&dbf_path, e))?;

    let prj_path = sidecar_path(path, "prj");
    match crs {
        Some(tag) => fs::write(&prj_path, tag.as_bytes()).map_err(|e| Error::io(&prj_path, e))?,
        None => match fs::remove_file(&prj_path) {
            Ok(()) => tracing::debug!(path = %prj_path.display(), "removed stale CRS sidecar"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(Error::io(&prj_path, e)),
        },
    }
    tracing::debug!(path = %path.display(), records = records.len(), "wrote shapes");
    Ok(())
}
