use super::metric::Metric;
use super::types::{Point, Polygon};

/// Even-odd ray crossing over all rings (holes included).
pub(crate) fn point_in_polygon(p: Point, poly: &Polygon) -> bool {
    let mut inside = false;
    for ring in poly.rings() {
        let n = ring.len();
        if n < 3 {
            continue;
        }
        let mut j = n - 1;
        for i in 0..n {
            let (a, b) = (ring[i], ring[j]);
            if (a.y > p.y) != (b.y > p.y) {
                let x_cross = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
                if p.x < x_cross {
                    inside = !inside;
                }
            }
            j = i;
        }
    }
    inside
}

/// Distance from `p` to the nearest ring edge of `poly`.
pub(crate) fn distance_to_boundary(metric: Metric, p: Point, poly: &Polygon) -> f64 {
    poly.edges()
        .map(|(a, b)| metric.distance_to_segment(p, a, b))
        .fold(f64::INFINITY, f64::min)
}

/// Regular `steps`-gon of circumradius `radius` around `center`, CCW from east.
pub(crate) fn circle(metric: Metric, center: Point, radius: f64, steps: usize) -> Polygon {
    let steps = steps.max(3);
    let delta = std::f64::consts::TAU / steps as f64;
    let ring = (0..steps)
        .map(|k| {
            let th = delta * k as f64;
            metric.from_local(center, nalgebra::Vector2::new(th.cos(), th.sin()) * radius)
        })
        .collect();
    Polygon::new(ring)
}
