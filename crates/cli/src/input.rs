use anyhow::{bail, Context, Result};
use polars::prelude::*;
use polysimp::geom::Point;
use std::path::Path;

/// Read a headerless `longitude,latitude` text file into ordered points.
pub fn read_points(path: &Path) -> Result<Vec<Point>> {
    let df = LazyCsvReader::new(path)
        .with_has_header(false)
        .with_infer_schema_length(None)
        .finish()
        .with_context(|| format!("opening {}", path.display()))?
        .collect()
        .with_context(|| format!("parsing {}", path.display()))?;
    tracing::debug!(rows = df.height(), cols = df.width(), "input_shape");

    let cols = df.get_columns();
    if cols.len() < 2 {
        bail!(
            "{}: expected 2 columns (longitude,latitude), found {}",
            path.display(),
            cols.len()
        );
    }
    let xs = cols[0].cast(&DataType::Float64)?;
    let ys = cols[1].cast(&DataType::Float64)?;
    let mut points = Vec::with_capacity(df.height());
    for (row, (x, y)) in xs.f64()?.into_iter().zip(ys.f64()?.into_iter()).enumerate() {
        match (x, y) {
            (Some(x), Some(y)) => points.push(Point::new(x, y)),
            _ => bail!("{}: row {} is missing a coordinate", path.display(), row + 1),
        }
    }
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn reads_headerless_pairs_in_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("basin.asc");
        fs::write(
            &path,
            "-40.414760860,-3.609036450\n-40.415868360,-3.609312790\n-40.416145550,-3.609590420\n",
        )
        .unwrap();
        let pts = read_points(&path).unwrap();
        assert_eq!(pts.len(), 3);
        assert_eq!(pts[0], Point::new(-40.41476086, -3.60903645));
        assert_eq!(pts[2], Point::new(-40.41614555, -3.60959042));
    }

    #[test]
    fn missing_value_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.asc");
        fs::write(&path, "1.5,2.5\n3.5,\n").unwrap();
        assert!(read_points(&path).is_err());
    }
}
