//! Basic planar types: points, polygons, bounding boxes, implicit regions.
//!
//! - `Point`: `Vector2<f64>`; `x` is easting/longitude, `y` northing/latitude.
//! - `Polygon`: exterior ring plus holes, rings stored open.
//! - `BBox`: axis-aligned box in coordinate space.
//! - `Region`: result of buffer/difference, evaluated by membership only.

use nalgebra::Vector2;

/// A position in coordinate space.
pub type Point = Vector2<f64>;

/// Simple polygon with optional holes.
///
/// Invariants:
/// - Rings are open: the closing vertex is never repeated.
/// - Orientation is not normalized; predicates use even-odd crossing.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Polygon {
    pub exterior: Vec<Point>,
    pub holes: Vec<Vec<Point>>,
}

impl Polygon {
    /// Polygon without holes. A repeated closing vertex is dropped.
    pub fn new(exterior: Vec<Point>) -> Self {
        Self {
            exterior: open_ring(exterior),
            holes: Vec::new(),
        }
    }

    pub fn with_holes(exterior: Vec<Point>, holes: Vec<Vec<Point>>) -> Self {
        Self {
            exterior: open_ring(exterior),
            holes: holes.into_iter().map(open_ring).collect(),
        }
    }

    /// Axis-aligned rectangle from two opposite corners.
    pub fn rect(a: Point, b: Point) -> Self {
        let (lo, hi) = (a.inf(&b), a.sup(&b));
        Self::new(vec![
            lo,
            Vector2::new(hi.x, lo.y),
            hi,
            Vector2::new(lo.x, hi.y),
        ])
    }

    /// Exterior first, then holes.
    pub fn rings(&self) -> impl Iterator<Item = &[Point]> {
        std::iter::once(self.exterior.as_slice()).chain(self.holes.iter().map(|h| h.as_slice()))
    }

    /// Iterate all ring edges `(a, b)`, wrapping each ring.
    pub fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        self.rings().flat_map(|ring| {
            let n = ring.len();
            (0..n).map(move |i| (ring[i], ring[(i + 1) % n]))
        })
    }

    /// Shoelace area of the exterior ring (positive for CCW).
    pub fn signed_area(&self) -> f64 {
        let r = &self.exterior;
        let n = r.len();
        if n < 3 {
            return 0.0;
        }
        let mut a = 0.0;
        for i in 0..n {
            let p = r[i];
            let q = r[(i + 1) % n];
            a += p.x * q.y - q.x * p.y;
        }
        0.5 * a
    }

    /// Fewer than three vertices, non-finite coordinates, or zero exterior area.
    pub fn is_degenerate(&self) -> bool {
        if self.exterior.len() < 3 {
            return true;
        }
        if self
            .rings()
            .flatten()
            .any(|p| !(p.x.is_finite() && p.y.is_finite()))
        {
            return true;
        }
        self.signed_area().abs() < 1e-18
    }

    pub fn bbox(&self) -> Option<BBox> {
        BBox::of_points(self.exterior.iter().copied())
    }
}

fn open_ring(mut ring: Vec<Point>) -> Vec<Point> {
    if ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }
    ring
}

/// Closed axis-aligned box `[min, max]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BBox {
    pub min: Point,
    pub max: Point,
}

impl BBox {
    pub fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    pub fn of_points<I: IntoIterator<Item = Point>>(points: I) -> Option<BBox> {
        let mut it = points.into_iter();
        let first = it.next()?;
        let (lo, hi) = it.fold((first, first), |(lo, hi), p| (lo.inf(&p), hi.sup(&p)));
        Some(BBox::new(lo, hi))
    }

    /// Grow by `dx` horizontally and `dy` vertically on both sides.
    #[inline]
    pub fn expand(&self, dx: f64, dy: f64) -> BBox {
        let d = Vector2::new(dx, dy);
        BBox::new(self.min - d, self.max + d)
    }

    #[inline]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }
}

/// Implicit region produced by geometry operations.
///
/// No boolean polygon clipping happens: membership is evaluated from the
/// operands, so a buffer is exact (round joins) at any distance.
#[derive(Clone, Debug, PartialEq)]
pub enum Region {
    Empty,
    Polygon(Polygon),
    /// Points within `distance` of `base` (negative distance erodes).
    Buffer { base: Polygon, distance: f64 },
    /// Points of the first region not in the second.
    Difference(Box<Region>, Box<Region>),
}

impl Region {
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, Region::Empty)
    }
}
