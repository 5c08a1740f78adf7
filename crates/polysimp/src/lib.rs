//! Polygon boundary simplification and shapefile-family persistence.
//!
//! Modules, leaf-first:
//! - `geom`: points, closed rings, single-ring polygons, bounding boxes.
//! - `simplify`: Douglas–Peucker over rings (explicit work stack).
//! - `shp`: `.shp`/`.shx`/`.dbf`/`.prj` reader and writer.
//! - `coords`: coordinate text export.
//! - `pipeline`: the staged run from raw points to simplified coordinates.
//! - `rand`: reproducible jagged rings for benches and tests.

pub mod coords;
pub mod error;
pub mod geom;
pub mod pipeline;
pub mod rand;
pub mod shp;
pub mod simplify;

pub use error::{Error, Result};

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common exports for quick imports in callers.
pub mod prelude {
    pub use crate::coords::{format_coords, write_coords};
    pub use crate::error::{Error, Result};
    pub use crate::geom::{
        bounding_box, make_ring, BoundingBox, FeatureRecord, Geometry, Point, Polygon, Ring,
        ShapeKind,
    };
    pub use crate::pipeline::{run, OutputPaths, PipelineCfg, PipelineError, PipelineReport, Stage};
    pub use crate::simplify::simplify;
}
