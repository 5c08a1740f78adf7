//! Coordinate text export: one `x,y` pair per line, 9 decimal places.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{Error, Result};
use crate::geom::Point;

/// Decimal places used for exported coordinates.
pub const DECIMALS: usize = 9;

pub fn format_coords(points: &[Point]) -> String {
    let mut out = String::with_capacity(points.len() * 28);
    for p in points {
        out.push_str(&format!("{:.prec$},{:.prec$}\n", p.x, p.y, prec = DECIMALS));
    }
    out
}

pub fn write_coords(path: &Path, points: &[Point]) -> Result<()> {
    let file = File::create(path).map_err(|e| Error::io(path, e))?;
    let mut w = BufWriter::new(file);
    for p in points {
        writeln!(w, "{:.prec$},{:.prec$}", p.x, p.y, prec = DECIMALS)
            .map_err(|e| Error::io(path, e))?;
    }
    w.flush().map_err(|e| Error::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::vector;
    use tempfile::tempdir;

    #[test]
    fn nine_decimals_like_the_input() {
        let pts = vec![vector![-40.41476086, -3.60903645], vector![0.0, 1.5]];
        assert_eq!(
            format_coords(&pts),
            "-40.414760860,-3.609036450\n0.000000000,1.500000000\n"
        );
    }

    #[test]
    fn file_matches_in_memory_text() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.asc");
        let pts = vec![vector![-40.415868360, -3.609312790]];
        write_coords(&path, &pts).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), format_coords(&pts));
    }
}
