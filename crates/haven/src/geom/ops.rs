//! The geometry capability consumed by placement.
//!
//! `GeometryOps` is the seam: placement only calls through it. `Geometry` is
//! the shipped implementation, parameterized by a `Metric`.

use nalgebra::Vector2;
use rand::{Rng, RngCore};

use super::metric::Metric;
use super::types::{BBox, Point, Polygon, Region};
use super::util;

/// Geometry operations used by candidate placement.
pub trait GeometryOps {
    /// Distance model distances and radii are measured in.
    fn metric(&self) -> Metric;

    /// Region within `distance` of `polygon`. Degenerate input yields `Region::Empty`.
    fn buffer(&self, polygon: &Polygon, distance: f64) -> Region;

    /// Points of `a` not in `b`; `Region::Empty` when provably empty.
    fn difference(&self, a: Region, b: Region) -> Region;

    fn point_in_polygon(&self, p: Point, polygon: &Polygon) -> bool;

    fn contains(&self, region: &Region, p: Point) -> bool;

    /// `None` for an empty region.
    fn bounding_box(&self, region: &Region) -> Option<BBox>;

    fn random_point_in_bbox(&self, bbox: &BBox, rng: &mut dyn RngCore) -> Point;

    /// Zero inside the polygon, else distance to its boundary.
    fn distance_to_polygon(&self, p: Point, polygon: &Polygon) -> f64;

    /// Polygon approximation of a circle with `steps` vertices.
    fn circle(&self, center: Point, radius: f64, steps: usize) -> Polygon;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Geometry {
    pub metric: Metric,
}

impl Geometry {
    pub fn new(metric: Metric) -> Self {
        Self { metric }
    }

    pub fn planar() -> Self {
        Self::new(Metric::Planar)
    }

    pub fn geographic() -> Self {
        Self::new(Metric::Geographic)
    }
}

impl GeometryOps for Geometry {
    fn metric(&self) -> Metric {
        self.metric
    }

    fn buffer(&self, polygon: &Polygon, distance: f64) -> Region {
        if polygon.is_degenerate() || !distance.is_finite() {
            return Region::Empty;
        }
        if distance == 0.0 {
            return Region::Polygon(polygon.clone());
        }
        Region::Buffer {
            base: polygon.clone(),
            distance,
        }
    }

    fn difference(&self, a: Region, b: Region) -> Region {
        if a.is_empty() {
            return Region::Empty;
        }
        if b.is_empty() {
            return a;
        }
        // Same base with `b` reaching at least as far as `a`.
        let covered = match (&a, &b) {
            (Region::Polygon(pa), Region::Polygon(pb)) => pa == pb,
            (
                Region::Buffer {
                    base: pa,
                    distance: da,
                },
                Region::Buffer {
                    base: pb,
                    distance: db,
                },
            ) => pa == pb && db >= da,
            (Region::Polygon(pa), Region::Buffer { base: pb, distance }) => {
                pa == pb && *distance >= 0.0
            }
            _ => false,
        };
        if covered {
            Region::Empty
        } else {
            Region::Difference(Box::new(a), Box::new(b))
        }
    }

    fn point_in_polygon(&self, p: Point, polygon: &Polygon) -> bool {
        util::point_in_polygon(p, polygon)
    }

    fn contains(&self, region: &Region, p: Point) -> bool {
        match region {
            Region::Empty => false,
            Region::Polygon(poly) => util::point_in_polygon(p, poly),
            Region::Buffer { base, distance } => {
                let inside = util::point_in_polygon(p, base);
                if *distance >= 0.0 {
                    inside || util::distance_to_boundary(self.metric, p, base) <= *distance
                } else {
                    inside && util::distance_to_boundary(self.metric, p, base) >= -*distance
                }
            }
            Region::Difference(a, b) => self.contains(a, p) && !self.contains(b, p),
        }
    }

    fn bounding_box(&self, region: &Region) -> Option<BBox> {
        match region {
            Region::Empty => None,
            Region::Polygon(poly) => poly.bbox(),
            Region::Buffer { base, distance } => {
                let bb = base.bbox()?;
                if *distance <= 0.0 {
                    return Some(bb);
                }
                let (dx, dy) = self.metric.span(*distance, bb.min.y, bb.max.y);
                Some(bb.expand(dx, dy))
            }
            Region::Difference(a, _) => self.bounding_box(a),
        }
    }

    fn random_point_in_bbox(&self, bbox: &BBox, rng: &mut dyn RngCore) -> Point {
        Vector2::new(
            rng.gen_range(bbox.min.x..=bbox.max.x),
            rng.gen_range(bbox.min.y..=bbox.max.y),
        )
    }

    fn distance_to_polygon(&self, p: Point, polygon: &Polygon) -> f64 {
        if util::point_in_polygon(p, polygon) {
            0.0
        } else {
            util::distance_to_boundary(self.metric, p, polygon)
        }
    }

    fn circle(&self, center: Point, radius: f64, steps: usize) -> Polygon {
        util::circle(self.metric, center, radius, steps)
    }
}
