//! Content fingerprint of placement inputs, stored next to a cached set so a
//! changed hazard set, parameter, or exclusion layer invalidates the cache.

use std::fmt;

use crate::geom::Metric;
use crate::placement::{HazardPolygon, PlacementParams};

/// Hex-encoded BLAKE3 digest.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Fingerprint(pub String);

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Digest over hazards (ids and every ring coordinate, in order), params,
/// metric, and the exclusion layer key (see `ExclusionProbe::layer_key`).
pub fn fingerprint(
    hazards: &[HazardPolygon],
    params: &PlacementParams,
    metric: Metric,
    layer: &[u8],
) -> Fingerprint {
    let mut hasher = blake3::Hasher::new();
    hasher.update(b"haven-candidates-v1:");

    hasher.update(&params.inner_radius.to_le_bytes());
    hasher.update(&params.outer_radius.to_le_bytes());
    hasher.update(&params.attempt_budget.to_le_bytes());
    hasher.update(&params.marker_radius.to_le_bytes());
    hasher.update(&(params.circle_steps as u64).to_le_bytes());
    hasher.update(&params.seed.to_le_bytes());
    hasher.update(metric.tag());

    hasher.update(&(hazards.len() as u64).to_le_bytes());
    for h in hazards {
        hasher.update(&(h.id.0.len() as u64).to_le_bytes());
        hasher.update(h.id.0.as_bytes());
        hasher.update(&(h.geometry.holes.len() as u64).to_le_bytes());
        for ring in h.geometry.rings() {
            hasher.update(&(ring.len() as u64).to_le_bytes());
            for p in ring {
                hasher.update(&p.x.to_le_bytes());
                hasher.update(&p.y.to_le_bytes());
            }
        }
    }

    hasher.update(&(layer.len() as u64).to_le_bytes());
    hasher.update(layer);
    Fingerprint(hasher.finalize().to_hex().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Polygon;
    use nalgebra::vector;

    fn hazards() -> Vec<HazardPolygon> {
        vec![
            HazardPolygon::new("a", Polygon::rect(vector![0.0, 0.0], vector![1.0, 1.0])),
            HazardPolygon::new("b", Polygon::rect(vector![5.0, 5.0], vector![6.0, 7.0])),
        ]
    }

    #[test]
    fn stable_for_equal_inputs() {
        let p = PlacementParams::default();
        let a = fingerprint(&hazards(), &p, Metric::Planar, b"none");
        let b = fingerprint(&hazards(), &p, Metric::Planar, b"none");
        assert_eq!(a, b);
        assert_eq!(a.0.len(), 64);
    }

    #[test]
    fn changes_with_any_input() {
        let p = PlacementParams::default();
        let base = fingerprint(&hazards(), &p, Metric::Planar, b"none");

        let mut moved = hazards();
        moved[1].geometry.exterior[0].x += 1e-9;
        assert_ne!(base, fingerprint(&moved, &p, Metric::Planar, b"none"));

        let mut renamed = hazards();
        renamed[0].id = "z".into();
        assert_ne!(base, fingerprint(&renamed, &p, Metric::Planar, b"none"));

        let fewer = &hazards()[..1];
        assert_ne!(base, fingerprint(fewer, &p, Metric::Planar, b"none"));

        let wider = PlacementParams {
            outer_radius: 1200.0,
            ..p.clone()
        };
        assert_ne!(base, fingerprint(&hazards(), &wider, Metric::Planar, b"none"));
        assert_ne!(base, fingerprint(&hazards(), &p, Metric::Geographic, b"none"));
        assert_ne!(base, fingerprint(&hazards(), &p, Metric::Planar, b"lines:planar"));
    }
}
