//! Planar and geographic geometry behind the `GeometryOps` capability.
//!
//! Purpose
//! - Provide the operations placement consumes: buffer, difference,
//!   point-in-polygon, bounding box, random point in a bounding box.
//! - Keep it small: buffers and differences stay implicit (`Region`) and are
//!   evaluated pointwise by exact distance to polygon edges. No clipping.
//!
//! Conventions
//! - Points are `Vector2<f64>`; rings are open; holes use even-odd rules.
//! - Distances follow the `Metric`: length units for `Planar`, meters for
//!   `Geographic` (`[lon, lat]` degrees).

mod metric;
mod ops;
mod types;
mod util;

pub use metric::{Metric, EARTH_RADIUS_M};
pub use ops::{Geometry, GeometryOps};
pub use types::{BBox, Point, Polygon, Region};
