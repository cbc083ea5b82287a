//! Exclusion probes: "does this point conflict with the exclusion layer?"
//!
//! A probe backed by a layer that has not been materialized yet reports
//! `is_ready() == false`; placement refuses to sample against it, since an
//! unready layer would report zero conflicts.

use crate::geom::{BBox, Metric, Point};

pub trait ExclusionProbe {
    fn conflicts(&self, p: Point) -> bool;

    fn is_ready(&self) -> bool {
        true
    }

    /// Stable bytes identifying the layer's content, folded into the cache
    /// fingerprint. `None` means the layer cannot be identified and a cached
    /// set must not be reused against it.
    fn layer_key(&self) -> Option<Vec<u8>> {
        None
    }
}

/// Probe that never reports a conflict.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoExclusion;

impl ExclusionProbe for NoExclusion {
    fn conflicts(&self, _p: Point) -> bool {
        false
    }

    fn layer_key(&self) -> Option<Vec<u8>> {
        Some(b"none".to_vec())
    }
}

impl<F> ExclusionProbe for F
where
    F: Fn(Point) -> bool,
{
    fn conflicts(&self, p: Point) -> bool {
        self(p)
    }
}

/// Polyline network (e.g. roads): a point conflicts when it lies within
/// `tolerance` of any segment.
#[derive(Clone, Debug)]
pub struct LineNetworkProbe {
    metric: Metric,
    tolerance: f64,
    lines: Vec<Vec<Point>>,
    bounds: Vec<BBox>,
    ready: bool,
}

impl LineNetworkProbe {
    pub fn new(lines: Vec<Vec<Point>>, tolerance: f64, metric: Metric) -> Self {
        let mut probe = Self::pending(tolerance, metric);
        probe.materialize(lines);
        probe
    }

    /// Probe whose layer is not loaded yet.
    pub fn pending(tolerance: f64, metric: Metric) -> Self {
        Self {
            metric,
            tolerance: tolerance.max(0.0),
            lines: Vec::new(),
            bounds: Vec::new(),
            ready: false,
        }
    }

    /// Install the layer features and mark the probe ready.
    pub fn materialize(&mut self, lines: Vec<Vec<Point>>) {
        let lines: Vec<Vec<Point>> = lines.into_iter().filter(|l| !l.is_empty()).collect();
        self.bounds = lines
            .iter()
            .filter_map(|l| {
                let bb = BBox::of_points(l.iter().copied())?;
                let (dx, dy) = self.metric.span(self.tolerance, bb.min.y, bb.max.y);
                Some(bb.expand(dx, dy))
            })
            .collect();
        self.lines = lines;
        self.ready = true;
        tracing::debug!(
            lines = self.lines.len(),
            tolerance = self.tolerance,
            "exclusion layer materialized"
        );
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }
}

impl ExclusionProbe for LineNetworkProbe {
    fn conflicts(&self, p: Point) -> bool {
        self.lines.iter().zip(&self.bounds).any(|(line, bb)| {
            if !bb.contains(p) {
                return false;
            }
            if line.len() == 1 {
                return self.metric.distance(p, line[0]) <= self.tolerance;
            }
            line.windows(2)
                .any(|w| self.metric.distance_to_segment(p, w[0], w[1]) <= self.tolerance)
        })
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn layer_key(&self) -> Option<Vec<u8>> {
        if !self.ready {
            return None;
        }
        let mut key = b"lines:".to_vec();
        key.extend_from_slice(self.metric.tag());
        key.extend_from_slice(&self.tolerance.to_le_bytes());
        key.extend_from_slice(&(self.lines.len() as u64).to_le_bytes());
        for line in &self.lines {
            key.extend_from_slice(&(line.len() as u64).to_le_bytes());
            for p in line {
                key.extend_from_slice(&p.x.to_le_bytes());
                key.extend_from_slice(&p.y.to_le_bytes());
            }
        }
        Some(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::vector;

    #[test]
    fn closures_are_probes() {
        let left_half = |p: Point| p.x < 0.0;
        assert!(left_half.conflicts(vector![-1.0, 0.0]));
        assert!(!left_half.conflicts(vector![1.0, 0.0]));
        assert!(left_half.is_ready());
        assert!(!NoExclusion.conflicts(vector![0.0, 0.0]));
    }

    #[test]
    fn line_network_uses_tolerance() {
        let road = vec![vector![0.0, 0.0], vector![100.0, 0.0], vector![100.0, 100.0]];
        let probe = LineNetworkProbe::new(vec![road], 5.0, Metric::Planar);
        assert!(probe.is_ready());
        assert!(probe.conflicts(vector![50.0, 4.0]));
        assert!(probe.conflicts(vector![104.0, 50.0]));
        assert!(!probe.conflicts(vector![50.0, 6.0]));
        assert!(!probe.conflicts(vector![50.0, 50.0]));
    }

    #[test]
    fn pending_probe_is_not_ready_until_materialized() {
        let mut probe = LineNetworkProbe::pending(3.0, Metric::Planar);
        assert!(!probe.is_ready());
        assert!(!probe.conflicts(vector![0.0, 0.0]));
        probe.materialize(vec![vec![vector![-1.0, 0.0], vector![1.0, 0.0]]]);
        assert!(probe.is_ready());
        assert!(probe.conflicts(vector![0.0, 0.0]));
    }

    #[test]
    fn layer_key_tracks_layer_content() {
        let road = || vec![vec![vector![0.0, 0.0], vector![10.0, 0.0]]];
        let base = LineNetworkProbe::new(road(), 5.0, Metric::Planar).layer_key();
        assert!(base.is_some());
        assert_eq!(base, LineNetworkProbe::new(road(), 5.0, Metric::Planar).layer_key());
        assert_ne!(base, LineNetworkProbe::new(road(), 6.0, Metric::Planar).layer_key());
        assert_ne!(base, LineNetworkProbe::new(road(), 5.0, Metric::Geographic).layer_key());
        let mut bent = road();
        bent[0].push(vector![10.0, 10.0]);
        assert_ne!(base, LineNetworkProbe::new(bent, 5.0, Metric::Planar).layer_key());
        assert_ne!(base, NoExclusion.layer_key());

        assert!(LineNetworkProbe::pending(5.0, Metric::Planar).layer_key().is_none());
        let closure = |_: Point| true;
        assert!(closure.layer_key().is_none());
    }
}
