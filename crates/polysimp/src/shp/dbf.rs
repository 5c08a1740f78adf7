//! Minimal dBASE III table carrying one numeric `feature` column.
//!
//! Other tools refuse a main stream without its table, so one is always written.
//! Nothing beyond the feature marker is modelled.

use std::io::{self, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{Error, Result};

const FIELD_NAME: &str = "feature";
/// Wide enough for `i32::MIN`.
const FIELD_WIDTH: u8 = 11;
/// Header date (YY since 1900, MM, DD). Fixed so repeated writes are byte-identical.
const HEADER_DATE: [u8; 3] = [124, 10, 1];
const TERMINATOR: u8 = 0x0D;
const EOF_MARKER: u8 = 0x1A;

pub fn encode<W: Write>(features: &[i32], w: &mut W) -> io::Result<()> {
    let header_len: u16 = 32 + 32 + 1;
    let record_len: u16 = 1 + FIELD_WIDTH as u16;

    w.write_u8(0x03)?;
    w.write_all(&HEADER_DATE)?;
    w.write_u32::<LittleEndian>(features.len() as u32)?;
    w.write_u16::<LittleEndian>(header_len)?;
    w.write_u16::<LittleEndian>(record_len)?;
    w.write_all(&[0u8; 20])?;

    let mut name = [0u8; 11];
    name[..FIELD_NAME.len()].copy_from_slice(FIELD_NAME.as_bytes());
    w.write_all(&name)?;
    w.write_u8(b'N')?;
    w.write_all(&[0u8; 4])?;
    w.write_u8(FIELD_WIDTH)?;
    w.write_u8(0)?;
    w.write_all(&[0u8; 14])?;
    w.write_u8(TERMINATOR)?;

    for f in features {
        w.write_u8(b' ')?;
        write!(w, "{:>width$}", f, width = FIELD_WIDTH as usize)?;
    }
    w.write_u8(EOF_MARKER)
}

fn corrupt(reason: impl Into<String>) -> Error {
    Error::CorruptHeader(format!("feature table: {}", reason.into()))
}

/// Feature markers in row order. A table without a `feature` column yields zeros.
pub fn decode(bytes: &[u8]) -> Result<Vec<i32>> {
    if bytes.len() < 32 {
        return Err(corrupt("header truncated"));
    }
    let mut c = &bytes[4..12];
    let short = |_: io::Error| corrupt("header truncated");
    let rows = c.read_u32::<LittleEndian>().map_err(short)? as usize;
    let header_len = c.read_u16::<LittleEndian>().map_err(short)? as usize;
    let record_len = c.read_u16::<LittleEndian>().map_err(short)? as usize;
    if header_len < 33 || header_len > bytes.len() || record_len == 0 {
        return Err(corrupt(format!(
            "header length {header_len}, record length {record_len}"
        )));
    }

    // Field descriptors run from byte 32 to the 0x0D terminator.
    let mut column: Option<(usize, usize)> = None;
    let mut field_offset = 1; // deletion flag
    let mut pos = 32;
    while pos + 32 <= header_len && bytes[pos] != TERMINATOR {
        let desc = &bytes[pos..pos + 32];
        let name_end = desc[..11].iter().position(|b| *b == 0).unwrap_or(11);
        let name = String::from_utf8_lossy(&desc[..name_end]);
        let width = desc[16] as usize;
        if name.eq_ignore_ascii_case(FIELD_NAME) && column.is_none() {
            column = Some((field_offset, width));
        }
        field_offset += width;
        pos += 32;
    }
    if field_offset > record_len {
        return Err(corrupt(format!(
            "fields span {field_offset} bytes, records hold {record_len}"
        )));
    }

    let body = &bytes[header_len..];
    let needed = rows.checked_mul(record_len).unwrap_or(usize::MAX);
    if body.len() < needed {
        return Err(Error::record(
            body.len() / record_len + 1,
            "feature table row truncated",
        ));
    }
    let Some((offset, width)) = column else {
        tracing::debug!(rows, "feature table has no feature column");
        return Ok(vec![0; rows]);
    };
    (0..rows)
        .map(|i| {
            let row = &body[i * record_len..(i + 1) * record_len];
            let raw = String::from_utf8_lossy(&row[offset..offset + width]);
            let text = raw.trim();
            if text.is_empty() {
                return Ok(0);
            }
            parse_marker(text).ok_or_else(|| {
                Error::record(i + 1, format!("feature value {text:?} is not an i32 integer"))
            })
        })
        .collect()
}

/// Numeric columns written by other tools may carry a zero decimal part (`"0.0"`).
/// Fractional or out-of-range values are rejected, never rounded or clamped.
fn parse_marker(text: &str) -> Option<i32> {
    if let Ok(v) = text.parse::<i32>() {
        return Some(v);
    }
    let v = text.parse::<f64>().ok()?;
    let in_range = v >= i32::MIN as f64 && v <= i32::MAX as f64;
    (v.is_finite() && v.fract() == 0.0 && in_range).then_some(v as i32)
}
