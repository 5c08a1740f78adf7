use nalgebra::Vector2;

use super::bbox::BoundingBox;
use crate::error::{Error, Result};

/// Planar point: `x` = longitude, `y` = latitude. Values are opaque reals.
pub type Point = Vector2<f64>;

/// Shape kind codes of the exchange format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Point,
    Polygon,
}

impl ShapeKind {
    #[inline]
    pub fn code(self) -> i32 {
        match self {
            ShapeKind::Point => 1,
            ShapeKind::Polygon => 5,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(ShapeKind::Point),
            5 => Some(ShapeKind::Polygon),
            _ => None,
        }
    }
}

impl std::fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShapeKind::Point => f.write_str("Point"),
            ShapeKind::Polygon => f.write_str("Polygon"),
        }
    }
}

/// Ordered polygon boundary.
///
/// Invariants:
/// - Never empty.
/// - Rings from `make_ring` are closed and hold at least 3 distinct points.
/// - Rings derived from a closed ring (simplified, decoded) stay closed but may
///   hold fewer distinct points.
#[derive(Clone, Debug, PartialEq)]
pub struct Ring {
    points: Vec<Point>,
}

/// Build a closed ring from an ordered point list.
///
/// Appends the first point when the last one differs. Fails with
/// `DegenerateGeometry` for non-finite coordinates or fewer than 3 distinct points.
pub fn make_ring(points: &[Point]) -> Result<Ring> {
    if let Some(i) = points
        .iter()
        .position(|p| !(p.x.is_finite() && p.y.is_finite()))
    {
        return Err(Error::DegenerateGeometry(format!(
            "point {i} has a non-finite coordinate"
        )));
    }
    let distinct = distinct_count(points);
    if distinct < 3 {
        return Err(Error::DegenerateGeometry(format!(
            "ring needs at least 3 distinct points, got {distinct}"
        )));
    }
    let mut pts = points.to_vec();
    if pts.first() != pts.last() {
        pts.push(pts[0]);
    }
    Ok(Ring { points: pts })
}

fn distinct_count(points: &[Point]) -> usize {
    let mut keys: Vec<(f64, f64)> = points.iter().map(|p| (p.x, p.y)).collect();
    keys.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));
    // -0.0 and 0.0 sort apart but compare equal, so dedup on `==`.
    keys.dedup_by(|a, b| a.0 == b.0 && a.1 == b.1);
    keys.len()
}

impl Ring {
    /// Wrap points that already satisfy the ring's shape (non-empty); no closure is added.
    pub(crate) fn from_vec_unchecked(points: Vec<Point>) -> Self {
        debug_assert!(!points.is_empty());
        Self { points }
    }

    #[inline]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.points.len() >= 2 && self.points.first() == self.points.last()
    }

    pub fn bbox(&self) -> BoundingBox {
        let first = BoundingBox::of_point(self.points[0]);
        self.points[1..].iter().fold(first, |acc, p| acc.include(*p))
    }

    pub fn into_points(self) -> Vec<Point> {
        self.points
    }
}

/// Polygon with a single outer ring (no holes).
#[derive(Clone, Debug, PartialEq)]
pub struct Polygon {
    pub exterior: Ring,
}

impl Polygon {
    #[inline]
    pub fn new(exterior: Ring) -> Self {
        Self { exterior }
    }

    #[inline]
    pub fn bbox(&self) -> BoundingBox {
        self.exterior.bbox()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Geometry {
    Point(Point),
    Polygon(Polygon),
}

impl Geometry {
    #[inline]
    pub fn shape_kind(&self) -> ShapeKind {
        match self {
            Geometry::Point(_) => ShapeKind::Point,
            Geometry::Polygon(_) => ShapeKind::Polygon,
        }
    }

    pub fn bbox(&self) -> BoundingBox {
        match self {
            Geometry::Point(p) => BoundingBox::of_point(*p),
            Geometry::Polygon(poly) => poly.bbox(),
        }
    }

    pub fn as_polygon(&self) -> Option<&Polygon> {
        match self {
            Geometry::Polygon(poly) => Some(poly),
            Geometry::Point(_) => None,
        }
    }
}

/// A geometry plus its feature marker and an opaque CRS tag.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureRecord {
    pub geometry: Geometry,
    pub feature: i32,
    pub crs: Option<String>,
}

impl FeatureRecord {
    /// Record with feature marker 0.
    pub fn new(geometry: Geometry, crs: Option<String>) -> Self {
        Self {
            geometry,
            feature: 0,
            crs,
        }
    }

    pub fn point(p: Point, crs: Option<String>) -> Self {
        Self::new(Geometry::Point(p), crs)
    }

    pub fn polygon(ring: Ring, crs: Option<String>) -> Self {
        Self::new(Geometry::Polygon(Polygon::new(ring)), crs)
    }
}
