use super::types::{Geometry, Point};

/// Axis-aligned bounds `[xmin, xmax] × [ymin, ymax]`.
///
/// Invariant: `xmin <= xmax` and `ymin <= ymax`; a single point gives equal bounds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl BoundingBox {
    #[inline]
    pub fn of_point(p: Point) -> Self {
        Self {
            xmin: p.x,
            ymin: p.y,
            xmax: p.x,
            ymax: p.y,
        }
    }

    /// O(n) scan; `None` for an empty slice.
    pub fn from_points(points: &[Point]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        Some(
            rest.iter()
                .fold(Self::of_point(*first), |acc, p| acc.include(*p)),
        )
    }

    #[inline]
    pub fn include(self, p: Point) -> Self {
        Self {
            xmin: self.xmin.min(p.x),
            ymin: self.ymin.min(p.y),
            xmax: self.xmax.max(p.x),
            ymax: self.ymax.max(p.y),
        }
    }

    #[inline]
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            xmin: self.xmin.min(other.xmin),
            ymin: self.ymin.min(other.ymin),
            xmax: self.xmax.max(other.xmax),
            ymax: self.ymax.max(other.ymax),
        }
    }

    #[inline]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.xmin && p.x <= self.xmax && p.y >= self.ymin && p.y <= self.ymax
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }
}

/// Bounds of a point (degenerate box) or of a polygon's ring.
pub fn bounding_box(geometry: &Geometry) -> BoundingBox {
    geometry.bbox()
}
