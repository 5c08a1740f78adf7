//! Planar geometry model (points, closed rings, single-ring polygons).
//!
//! Purpose
//! - Hold the boundary handed over by the caller in a form the codec and the
//!   simplifier agree on: ordered points, closure explicit, bounds derived.
//! - Keep construction strict (`make_ring`) and everything else plain data.
//!
//! Invariants
//! - A closed ring repeats its first point as its last (exact equality).
//! - Bounding boxes are never stored next to geometry; they are recomputed.
//!
//! Code cross-refs: `simplify::simplify`, `shp::{write, read}`

mod bbox;
mod types;

pub use bbox::{bounding_box, BoundingBox};
pub use types::{make_ring, FeatureRecord, Geometry, Point, Polygon, Ring, ShapeKind};
