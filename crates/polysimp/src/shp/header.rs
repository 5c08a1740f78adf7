//! Fixed 100-byte file header shared by the main and index streams.
//!
//! Layout (byte offset: field, order)
//! - 0: file code 9994, BE
//! - 4..24: five unused words, BE
//! - 24: file length in 16-bit words, BE
//! - 28: version 1000, LE
//! - 32: shape kind, LE
//! - 36..68: xmin, ymin, xmax, ymax, LE f64
//! - 68..100: z and m ranges, LE f64 (always zero here)

use std::io::{self, Write};

use byteorder::{BigEndian, LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{Error, Result};
use crate::geom::{BoundingBox, ShapeKind};

pub const FILE_CODE: i32 = 9994;
pub const VERSION: i32 = 1000;
pub const HEADER_LEN: usize = 100;
pub const RECORD_HEADER_LEN: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FileHeader {
    /// Total stream length, header included, in 16-bit words.
    pub file_length_words: i32,
    pub shape_kind: ShapeKind,
    /// `None` for a file without records (written as all zeros).
    pub bbox: Option<BoundingBox>,
}

impl FileHeader {
    #[inline]
    pub fn file_length_bytes(&self) -> usize {
        self.file_length_words as usize * 2
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_i32::<BigEndian>(FILE_CODE)?;
        for _ in 0..5 {
            w.write_i32::<BigEndian>(0)?;
        }
        w.write_i32::<BigEndian>(self.file_length_words)?;
        w.write_i32::<LittleEndian>(VERSION)?;
        w.write_i32::<LittleEndian>(self.shape_kind.code())?;
        let bb = self.bbox.unwrap_or(BoundingBox {
            xmin: 0.0,
            ymin: 0.0,
            xmax: 0.0,
            ymax: 0.0,
        });
        for v in [bb.xmin, bb.ymin, bb.xmax, bb.ymax, 0.0, 0.0, 0.0, 0.0] {
            w.write_f64::<LittleEndian>(v)?;
        }
        Ok(())
    }

    /// Parse and validate the first 100 bytes of a stream.
    ///
    /// An all-zero bbox is reported as `None`; callers that need the stored value
    /// of an empty-extent file can still rebuild it from the records.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(Error::CorruptHeader(format!(
                "stream has {} bytes, header needs {HEADER_LEN}",
                bytes.len()
            )));
        }
        let mut c = &bytes[..HEADER_LEN];
        let code = c.read_i32::<BigEndian>().map_err(short_header)?;
        if code != FILE_CODE {
            return Err(Error::CorruptHeader(format!("unrecognized file code {code}")));
        }
        for _ in 0..5 {
            c.read_i32::<BigEndian>().map_err(short_header)?;
        }
        let file_length_words = c.read_i32::<BigEndian>().map_err(short_header)?;
        if file_length_words < (HEADER_LEN / 2) as i32 {
            return Err(Error::CorruptHeader(format!(
                "declared length {file_length_words} words is shorter than the header"
            )));
        }
        let version = c.read_i32::<LittleEndian>().map_err(short_header)?;
        if version != VERSION {
            return Err(Error::CorruptHeader(format!("unsupported version {version}")));
        }
        let kind_code = c.read_i32::<LittleEndian>().map_err(short_header)?;
        let shape_kind = ShapeKind::from_code(kind_code).ok_or_else(|| {
            Error::CorruptHeader(format!("unsupported shape kind {kind_code}"))
        })?;
        let mut v = [0.0f64; 4];
        for slot in v.iter_mut() {
            *slot = c.read_f64::<LittleEndian>().map_err(short_header)?;
        }
        let bbox = if v.iter().all(|x| *x == 0.0) {
            None
        } else {
            Some(BoundingBox {
                xmin: v[0],
                ymin: v[1],
                xmax: v[2],
                ymax: v[3],
            })
        };
        Ok(Self {
            file_length_words,
            shape_kind,
            bbox,
        })
    }
}

fn short_header(_: io::Error) -> Error {
    Error::CorruptHeader("header truncated".into())
}
