//! Distance model for coordinates.
//!
//! `Planar` treats coordinates as length units. `Geographic` treats them as
//! `[lon, lat]` degrees and measures in meters through a local equirectangular
//! frame centered on the query point, which is accurate at the kilometer
//! scale buffers operate on.

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use super::types::Point;

/// Mean Earth radius (meters).
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

const METERS_PER_DEGREE: f64 = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;

/// Latitude clamp for longitude scaling near the poles.
const MAX_ABS_LAT: f64 = 89.9;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    #[default]
    Planar,
    Geographic,
}

impl Metric {
    /// Fixed-width tag hashed into cache fingerprints.
    pub(crate) fn tag(self) -> &'static [u8] {
        match self {
            Metric::Planar => b"planar",
            Metric::Geographic => b"geogra",
        }
    }

    /// Offset of `p` relative to `origin`, in metric units.
    #[inline]
    pub fn to_local(self, origin: Point, p: Point) -> Vector2<f64> {
        match self {
            Metric::Planar => p - origin,
            Metric::Geographic => {
                let k = lon_scale(origin.y);
                Vector2::new(
                    (p.x - origin.x) * METERS_PER_DEGREE * k,
                    (p.y - origin.y) * METERS_PER_DEGREE,
                )
            }
        }
    }

    /// Inverse of `to_local`.
    #[inline]
    pub fn from_local(self, origin: Point, v: Vector2<f64>) -> Point {
        match self {
            Metric::Planar => origin + v,
            Metric::Geographic => {
                let k = lon_scale(origin.y);
                Vector2::new(
                    origin.x + v.x / (METERS_PER_DEGREE * k),
                    origin.y + v.y / METERS_PER_DEGREE,
                )
            }
        }
    }

    #[inline]
    pub fn distance(self, a: Point, b: Point) -> f64 {
        self.to_local(a, b).norm()
    }

    /// Distance from `p` to the closed segment `[a, b]`.
    pub fn distance_to_segment(self, p: Point, a: Point, b: Point) -> f64 {
        let a = self.to_local(p, a);
        let b = self.to_local(p, b);
        let ab = b - a;
        let len_sq = ab.norm_squared();
        if len_sq == 0.0 {
            return a.norm();
        }
        let t = (-a.dot(&ab) / len_sq).clamp(0.0, 1.0);
        (a + ab * t).norm()
    }

    /// Coordinate extents `(dx, dy)` covering `distance` anywhere in the
    /// latitude band `[lat_lo, lat_hi]`. Over-covers rather than under-covers.
    pub fn span(self, distance: f64, lat_lo: f64, lat_hi: f64) -> (f64, f64) {
        match self {
            Metric::Planar => (distance, distance),
            Metric::Geographic => {
                let dy = distance / METERS_PER_DEGREE;
                let extreme = (lat_lo - dy).abs().max((lat_hi + dy).abs());
                let dx = distance / (METERS_PER_DEGREE * lon_scale(extreme));
                (dx, dy)
            }
        }
    }
}

#[inline]
fn lon_scale(lat: f64) -> f64 {
    lat.clamp(-MAX_ABS_LAT, MAX_ABS_LAT).to_radians().cos()
}
