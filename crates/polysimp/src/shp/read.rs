//! Read path: record framing, content decoding, companion streams.

use std::fs;
use std::io;
use std::path::Path;

use byteorder::{BigEndian, LittleEndian, ReadBytesExt};

use super::dbf;
use super::header::{FileHeader, HEADER_LEN, RECORD_HEADER_LEN};
use super::sidecar_path;
use crate::error::{Error, Result};
use crate::geom::{BoundingBox, FeatureRecord, Geometry, Point, Polygon, Ring, ShapeKind};

/// Decode a main stream into its header and geometries, in file order.
///
/// Records are found by following their length prefixes. A stream shorter
/// than declared is still walked, so a cut inside a record reports that record.
pub fn decode(bytes: &[u8]) -> Result<(FileHeader, Vec<Geometry>)> {
    let header = FileHeader::parse(bytes)?;
    let declared = header.file_length_bytes();
    if bytes.len() > declared {
        return Err(length_mismatch(declared, bytes.len()));
    }

    let mut out = Vec::new();
    let mut pos = HEADER_LEN;
    while pos < bytes.len() {
        let number = out.len() + 1;
        let rest = &bytes[pos..];
        if rest.len() < RECORD_HEADER_LEN {
            return Err(Error::record(
                number,
                format!("record header needs {RECORD_HEADER_LEN} bytes, {} remain", rest.len()),
            ));
        }
        let mut c = &rest[..RECORD_HEADER_LEN];
        let got_number = c.read_i32::<BigEndian>().map_err(truncated(number))?;
        let content_words = c.read_i32::<BigEndian>().map_err(truncated(number))?;
        if got_number != number as i32 {
            return Err(Error::record(
                number,
                format!("record number {got_number} out of sequence"),
            ));
        }
        let len = usize::try_from(content_words)
            .map_err(|_| Error::record(number, format!("negative content length {content_words}")))?
            * 2;
        let remaining = rest.len() - RECORD_HEADER_LEN;
        if len > remaining {
            return Err(Error::record(
                number,
                format!("content declares {len} bytes, {remaining} remain"),
            ));
        }
        let content = &rest[RECORD_HEADER_LEN..RECORD_HEADER_LEN + len];
        out.push(decode_content(number, header.shape_kind, content)?);
        pos += RECORD_HEADER_LEN + len;
    }
    if bytes.len() != declared {
        return Err(length_mismatch(declared, bytes.len()));
    }

    if let Some(stored) = header.bbox {
        let actual = out.iter().map(Geometry::bbox).reduce(|a, b| a.union(&b));
        if actual != Some(stored) {
            tracing::warn!(?stored, ?actual, "file bounding box disagrees with records");
        }
    }
    tracing::debug!(records = out.len(), kind = %header.shape_kind, "decoded shapes");
    Ok((header, out))
}

fn length_mismatch(declared: usize, actual: usize) -> Error {
    Error::CorruptHeader(format!(
        "header declares {declared} bytes, stream has {actual}"
    ))
}

fn truncated(number: usize) -> impl Fn(io::Error) -> Error {
    move |_| Error::record(number, "content shorter than its fields")
}

/// Decode one record's content (record header already stripped).
pub(crate) fn decode_content(number: usize, kind: ShapeKind, content: &[u8]) -> Result<Geometry> {
    let mut c = content;
    let code = c.read_i32::<LittleEndian>().map_err(truncated(number))?;
    let got = ShapeKind::from_code(code)
        .ok_or_else(|| Error::record(number, format!("unsupported shape kind {code}")))?;
    if got != kind {
        return Err(Error::record(
            number,
            format!("{got} record in a {kind} file"),
        ));
    }
    match kind {
        ShapeKind::Point => {
            if content.len() != 20 {
                return Err(Error::record(
                    number,
                    format!("point content is {} bytes, expected 20", content.len()),
                ));
            }
            Ok(Geometry::Point(read_point(&mut c).map_err(truncated(number))?))
        }
        ShapeKind::Polygon => decode_polygon(number, content.len(), &mut c).map(Geometry::Polygon),
    }
}

fn decode_polygon(number: usize, len: usize, c: &mut &[u8]) -> Result<Polygon> {
    let err = |reason: String| Error::record(number, reason);
    let mut v = [0.0f64; 4];
    for slot in v.iter_mut() {
        *slot = c.read_f64::<LittleEndian>().map_err(truncated(number))?;
    }
    let stored = BoundingBox {
        xmin: v[0],
        ymin: v[1],
        xmax: v[2],
        ymax: v[3],
    };
    let num_parts = c.read_i32::<LittleEndian>().map_err(truncated(number))?;
    let num_points = c.read_i32::<LittleEndian>().map_err(truncated(number))?;
    let (parts, points) = match (usize::try_from(num_parts), usize::try_from(num_points)) {
        (Ok(p), Ok(n)) => (p, n),
        _ => return Err(err(format!("negative counts ({num_parts} rings, {num_points} points)"))),
    };
    let expected = parts
        .checked_mul(4)
        .and_then(|b| points.checked_mul(16).and_then(|p| b.checked_add(p)))
        .and_then(|b| b.checked_add(44));
    if expected != Some(len) {
        return Err(err(format!(
            "{parts} rings of {points} points do not fit {len} content bytes"
        )));
    }
    if parts != 1 {
        return Err(err(format!("expected a single ring, found {parts}")));
    }
    let first_index = c.read_i32::<LittleEndian>().map_err(truncated(number))?;
    if first_index != 0 {
        return Err(err(format!("ring starts at point {first_index}, expected 0")));
    }
    if points < 2 {
        return Err(err(format!("ring has {points} points")));
    }
    let mut pts = Vec::with_capacity(points);
    for _ in 0..points {
        pts.push(read_point(c).map_err(truncated(number))?);
    }
    if pts.first() != pts.last() {
        return Err(err("ring is not closed".to_string()));
    }
    let ring = Ring::from_vec_unchecked(pts);
    let actual = ring.bbox();
    if actual != stored {
        tracing::warn!(record = number, ?stored, ?actual, "record bounding box disagrees with ring");
    }
    Ok(Polygon::new(ring))
}

#[inline]
fn read_point(c: &mut &[u8]) -> io::Result<Point> {
    let x = c.read_f64::<LittleEndian>()?;
    let y = c.read_f64::<LittleEndian>()?;
    Ok(Point::new(x, y))
}

/// Read `path` (`.shp`) with its optional `.dbf` and `.prj` companions.
///
/// Feature markers come from the `.dbf` when present (0 otherwise); every record
/// carries the `.prj` contents, verbatim, as its CRS tag.
pub fn read(path: &Path) -> Result<Vec<FeatureRecord>> {
    let bytes = fs::read(path).map_err(|e| Error::io(path, e))?;
    let (_, geometries) = decode(&bytes)?;

    let dbf_path = sidecar_path(path, "dbf");
    let features = match fs::read(&dbf_path) {
        Ok(table) => {
            let features = dbf::decode(&table)?;
            if features.len() != geometries.len() {
                return Err(Error::record(
                    features.len().min(geometries.len()) + 1,
                    format!(
                        "feature table has {} rows for {} shapes",
                        features.len(),
                        geometries.len()
                    ),
                ));
            }
            features
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(path = %dbf_path.display(), "no feature table, markers default to 0");
            vec![0; geometries.len()]
        }
        Err(e) => return Err(Error::io(&dbf_path, e)),
    };

    let prj_path = sidecar_path(path, "prj");
    let crs = match fs::read_to_string(&prj_path) {
        Ok(tag) => Some(tag),
        Err(e) if e.kind() == io::ErrorKind::NotFound => None,
        Err(e) => return Err(Error::io(&prj_path, e)),
    };

    Ok(geometries
        .into_iter()
        .zip(features)
        .map(|(geometry, feature)| FeatureRecord {
            geometry,
            feature,
            crs: crs.clone(),
        })
        .collect())
}
