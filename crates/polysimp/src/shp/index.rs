//! Index stream (`.shx`): one `(offset, length)` pair per record, both BE words.
//!
//! The index is derived data, regenerated on every write. Sequential reads never
//! consult it; it only serves `read_record_at`.

use std::fs::{self, File};
use std::io::{self, BufReader, Read, Seek, SeekFrom, Write};
use std::path::Path;

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use super::header::{FileHeader, HEADER_LEN, RECORD_HEADER_LEN};
use super::read::decode_content;
use super::sidecar_path;
use crate::error::{Error, Result};
use crate::geom::Geometry;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IndexEntry {
    /// Offset of the record header in the main stream, in words.
    pub offset_words: i32,
    /// Content length (record header excluded), in words.
    pub content_words: i32,
}

impl IndexEntry {
    #[inline]
    pub fn offset_bytes(&self) -> u64 {
        self.offset_words as u64 * 2
    }

    #[inline]
    pub fn content_bytes(&self) -> usize {
        self.content_words as usize * 2
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_i32::<BigEndian>(self.offset_words)?;
        w.write_i32::<BigEndian>(self.content_words)
    }
}

/// Parse an index stream.
pub fn decode_index(bytes: &[u8]) -> Result<Vec<IndexEntry>> {
    let header = FileHeader::parse(bytes)?;
    if header.file_length_bytes() != bytes.len() {
        return Err(Error::CorruptHeader(format!(
            "index declares {} bytes, stream has {}",
            header.file_length_bytes(),
            bytes.len()
        )));
    }
    let body = &bytes[HEADER_LEN..];
    if body.len() % 8 != 0 {
        return Err(Error::record(body.len() / 8 + 1, "index entry truncated"));
    }
    let mut c = body;
    let mut out = Vec::with_capacity(body.len() / 8);
    for i in 0..body.len() / 8 {
        let truncated = |_: io::Error| Error::record(i + 1, "index entry truncated");
        let offset_words = c.read_i32::<BigEndian>().map_err(truncated)?;
        let content_words = c.read_i32::<BigEndian>().map_err(truncated)?;
        if offset_words < (HEADER_LEN / 2) as i32 || content_words < 0 {
            return Err(Error::record(
                i + 1,
                format!("index entry ({offset_words}, {content_words}) out of range"),
            ));
        }
        out.push(IndexEntry {
            offset_words,
            content_words,
        });
    }
    Ok(out)
}

/// Read the index stream next to `shp_path` (or `shp_path` itself if it is the `.shx`).
pub fn read_index(shp_path: &Path) -> Result<Vec<IndexEntry>> {
    let shx_path = sidecar_path(shp_path, "shx");
    let bytes = fs::read(&shx_path).map_err(|e| Error::io(&shx_path, e))?;
    decode_index(&bytes)
}

/// Fetch record `n` (0-based) by seeking through the index.
///
/// The record's own framing is re-checked against the index entry, so a stale
/// index surfaces as `CorruptRecord` rather than as wrong geometry.
pub fn read_record_at(shp_path: &Path, n: usize) -> Result<Geometry> {
    let entries = read_index(shp_path)?;
    let entry = *entries.get(n).ok_or_else(|| {
        Error::InvalidInput(format!(
            "record {n} requested, file has {} records",
            entries.len()
        ))
    })?;
    let file = File::open(shp_path).map_err(|e| Error::io(shp_path, e))?;
    let file_len = file.metadata().map_err(|e| Error::io(shp_path, e))?.len();
    let record_end = entry.offset_bytes() + (RECORD_HEADER_LEN + entry.content_bytes()) as u64;
    if record_end > file_len {
        return Err(Error::record(
            n + 1,
            format!("index entry ends at byte {record_end}, main stream has {file_len}"),
        ));
    }
    let mut r = BufReader::new(file);

    let mut head = [0u8; HEADER_LEN];
    r.read_exact(&mut head).map_err(|e| Error::io(shp_path, e))?;
    let header = FileHeader::parse(&head)?;

    let number = n + 1;
    let overrun =
        |_: io::Error| Error::record(number, "index points past the end of the main stream");
    r.seek(SeekFrom::Start(entry.offset_bytes()))
        .map_err(|e| Error::io(shp_path, e))?;
    let mut rec_head = [0u8; RECORD_HEADER_LEN];
    r.read_exact(&mut rec_head).map_err(overrun)?;
    let mut c = &rec_head[..];
    let got_number = c.read_i32::<BigEndian>().map_err(overrun)?;
    let got_words = c.read_i32::<BigEndian>().map_err(overrun)?;
    if got_number != number as i32 || got_words != entry.content_words {
        return Err(Error::record(
            number,
            format!(
                "index entry disagrees with record header (number {got_number}, {got_words} words)"
            ),
        ));
    }
    let mut content = vec![0u8; entry.content_bytes()];
    r.read_exact(&mut content).map_err(overrun)?;
    decode_content(number, header.shape_kind, &content)
}
