//! Douglas–Peucker simplification of rings and polylines.
//!
//! Purpose
//! - Drop vertices that lie within `tolerance` (perpendicular, planar distance)
//!   of the chord they would be replaced by.
//!
//! Model
//! - Explicit work stack of `(start, end)` index ranges instead of recursion, so
//!   long nearly-collinear inputs cannot exhaust the call stack.
//! - The scan uses a strict `>`, so the lowest index wins among equally distant
//!   candidates; output is deterministic, idempotent at a fixed tolerance, and
//!   monotone in the tolerance.
//! - The outermost segment of a closed ring has equal endpoints; distances to it
//!   are plain Euclidean distances to the anchor, so the anchor is never dropped.
//!
//! Code cross-refs: `geom::Ring`, `pipeline::run`

use crate::error::{Error, Result};
use crate::geom::{Point, Ring};

/// Simplify a ring; the result is a subsequence of `ring` with the same endpoints.
pub fn simplify(ring: &Ring, tolerance: f64) -> Result<Ring> {
    let kept = simplify_points(ring.points(), tolerance)?;
    Ok(Ring::from_vec_unchecked(kept))
}

/// Simplify an arbitrary polyline. Inputs with fewer than 3 points come back unchanged.
pub fn simplify_points(points: &[Point], tolerance: f64) -> Result<Vec<Point>> {
    let idx = retained_indices(points, tolerance)?;
    Ok(idx.into_iter().map(|i| points[i]).collect())
}

/// Indices of the points kept by Douglas–Peucker, ascending.
pub fn retained_indices(points: &[Point], tolerance: f64) -> Result<Vec<usize>> {
    check_tolerance(tolerance)?;
    let n = points.len();
    if n < 3 {
        return Ok((0..n).collect());
    }
    let mut kept = vec![false; n];
    kept[0] = true;
    kept[n - 1] = true;

    let mut stack: Vec<(usize, usize)> = vec![(0, n - 1)];
    while let Some((start, end)) = stack.pop() {
        if end <= start + 1 {
            continue;
        }
        let (a, b) = (points[start], points[end]);
        let mut max_dist = -1.0;
        let mut max_idx = start;
        for (i, p) in points.iter().enumerate().take(end).skip(start + 1) {
            let d = perpendicular_distance(*p, a, b);
            if d > max_dist {
                max_dist = d;
                max_idx = i;
            }
        }
        if max_dist > tolerance {
            kept[max_idx] = true;
            stack.push((max_idx, end));
            stack.push((start, max_idx));
        }
    }
    Ok(kept
        .iter()
        .enumerate()
        .filter_map(|(i, k)| k.then_some(i))
        .collect())
}

#[inline]
fn check_tolerance(tolerance: f64) -> Result<()> {
    if tolerance.is_finite() && tolerance > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidTolerance(tolerance))
    }
}

/// Distance from `p` to the line through `a` and `b`; to `a` itself when `a == b`.
#[inline]
pub fn perpendicular_distance(p: Point, a: Point, b: Point) -> f64 {
    let ab = b - a;
    let ap = p - a;
    let len = ab.norm();
    if len == 0.0 {
        return ap.norm();
    }
    (ab.x * ap.y - ab.y * ap.x).abs() / len
}
