//! Candidate placement by rejection sampling in a hazard's annulus.
//!
//! Purpose
//! - For each hazard, find one point between `inner_radius` and `outer_radius`
//!   of its boundary, outside the hazard, clear of the exclusion layer, and
//!   emit a small circle there.
//!
//! Model
//! - `annulus = buffer(h, outer) \ buffer(h, inner)`; sample uniformly in its
//!   bounding box and accept on the first point passing all three tests.
//! - At most `attempt_budget` draws per hazard. Failure to place is an
//!   omission (counted in `PlacementReport`), never an error.
//! - Each hazard owns an RNG derived from `(seed, hazard index)`, so a hazard's
//!   candidate is reproducible on its own (`CandidateGenerator::regenerate`).

mod types;

pub use types::{Candidate, CandidateSet, HazardId, HazardPolygon};

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::classify::classify;
use crate::geom::{GeometryOps, Region};
use crate::probe::ExclusionProbe;

/// Marker circle radius (metric units).
pub const MARKER_RADIUS: f64 = 15.0;

/// Vertex count of the marker circle.
pub const CIRCLE_STEPS: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum PlacementError {
    #[error("invalid placement params: {reason}")]
    InvalidParams { reason: String },
    #[error("exclusion layer is not ready; sampling now would ignore every conflict")]
    ProbeNotReady,
}

impl PlacementError {
    fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidParams {
            reason: reason.into(),
        }
    }
}

/// Placement parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementParams {
    pub inner_radius: f64,
    pub outer_radius: f64,
    /// Draws per hazard before giving up.
    pub attempt_budget: u32,
    pub marker_radius: f64,
    pub circle_steps: usize,
    pub seed: u64,
}

impl Default for PlacementParams {
    fn default() -> Self {
        Self {
            inner_radius: 500.0,
            outer_radius: 1000.0,
            attempt_budget: 32,
            marker_radius: MARKER_RADIUS,
            circle_steps: CIRCLE_STEPS,
            seed: 0,
        }
    }
}

impl PlacementParams {
    pub fn validate(&self) -> Result<(), PlacementError> {
        if !(self.inner_radius.is_finite() && self.outer_radius.is_finite()) {
            return Err(PlacementError::invalid("radii must be finite"));
        }
        if self.inner_radius < 0.0 {
            return Err(PlacementError::invalid("inner_radius must be >= 0"));
        }
        if self.outer_radius <= self.inner_radius {
            return Err(PlacementError::invalid(
                "outer_radius must exceed inner_radius",
            ));
        }
        if self.attempt_budget == 0 {
            return Err(PlacementError::invalid("attempt_budget must be > 0"));
        }
        if !self.marker_radius.is_finite() || self.marker_radius <= 0.0 {
            return Err(PlacementError::invalid(
                "marker_radius must be finite and positive",
            ));
        }
        if self.circle_steps < 3 {
            return Err(PlacementError::invalid("circle_steps must be >= 3"));
        }
        Ok(())
    }
}

/// Why a hazard produced no candidate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Omission {
    /// Degenerate hazard geometry; nothing to sample.
    EmptyAnnulus,
    /// Every draw in the budget was rejected.
    AttemptsExhausted,
}

/// Per-run counts; omissions are silent to callers but visible here.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlacementReport {
    pub hazards: usize,
    pub placed: usize,
    pub empty_annulus: Vec<HazardId>,
    pub exhausted: Vec<HazardId>,
    pub draws: u64,
}

impl PlacementReport {
    pub fn omitted(&self) -> usize {
        self.empty_annulus.len() + self.exhausted.len()
    }
}

/// Generated set plus its report.
#[derive(Clone, Debug, PartialEq)]
pub struct Placement {
    pub candidates: CandidateSet,
    pub report: PlacementReport,
}

/// Replay token: `(seed, hazard index)` mixed into one RNG.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReplayToken {
    pub seed: u64,
    pub index: u64,
}

impl ReplayToken {
    #[inline]
    fn to_std_rng(self) -> StdRng {
        // SplitMix64-style mixing, cheap and stable.
        fn mix(mut x: u64) -> u64 {
            x ^= x >> 30;
            x = x.wrapping_mul(0xbf58476d1ce4e5b9);
            x ^= x >> 27;
            x = x.wrapping_mul(0x94d049bb133111eb);
            x ^ (x >> 31)
        }
        let k = mix(self.seed ^ mix(self.index.wrapping_add(0x9e3779b97f4a7c15)));
        StdRng::seed_from_u64(k)
    }
}

/// Places candidates for a hazard sequence against one geometry and probe.
pub struct CandidateGenerator<'a, G: ?Sized, P: ?Sized> {
    params: PlacementParams,
    geometry: &'a G,
    probe: &'a P,
}

impl<'a, G, P> CandidateGenerator<'a, G, P>
where
    G: GeometryOps + ?Sized,
    P: ExclusionProbe + ?Sized,
{
    pub fn new(
        params: PlacementParams,
        geometry: &'a G,
        probe: &'a P,
    ) -> Result<Self, PlacementError> {
        params.validate()?;
        Ok(Self {
            params,
            geometry,
            probe,
        })
    }

    pub fn params(&self) -> &PlacementParams {
        &self.params
    }

    /// One pass over `hazards` in order.
    pub fn generate(&self, hazards: &[HazardPolygon]) -> Result<Placement, PlacementError> {
        if !self.probe.is_ready() {
            return Err(PlacementError::ProbeNotReady);
        }
        let mut candidates = CandidateSet::default();
        let mut report = PlacementReport {
            hazards: hazards.len(),
            ..Default::default()
        };
        for (index, hazard) in hazards.iter().enumerate() {
            let (outcome, draws) = self.place(index, hazard);
            report.draws += u64::from(draws);
            match outcome {
                Ok(c) => {
                    report.placed += 1;
                    candidates.push(c);
                }
                Err(Omission::EmptyAnnulus) => {
                    tracing::debug!(hazard = %hazard.id, index, "empty annulus; skipped");
                    report.empty_annulus.push(hazard.id.clone());
                }
                Err(Omission::AttemptsExhausted) => {
                    tracing::debug!(
                        hazard = %hazard.id,
                        index,
                        attempts = self.params.attempt_budget,
                        "no valid sample within budget; skipped"
                    );
                    report.exhausted.push(hazard.id.clone());
                }
            }
        }
        tracing::info!(
            hazards = report.hazards,
            placed = report.placed,
            empty_annulus = report.empty_annulus.len(),
            exhausted = report.exhausted.len(),
            draws = report.draws,
            "candidate placement finished"
        );
        Ok(Placement { candidates, report })
    }

    /// Re-run placement for the hazard at `index` (same draws as `generate`).
    pub fn regenerate(&self, index: usize, hazard: &HazardPolygon) -> Result<Candidate, Omission> {
        self.place(index, hazard).0
    }

    fn place(&self, index: usize, hazard: &HazardPolygon) -> (Result<Candidate, Omission>, u32) {
        let g = self.geometry;
        let annulus = g.difference(
            g.buffer(&hazard.geometry, self.params.outer_radius),
            g.buffer(&hazard.geometry, self.params.inner_radius),
        );
        let bbox = match (&annulus, g.bounding_box(&annulus)) {
            (Region::Empty, _) | (_, None) => return (Err(Omission::EmptyAnnulus), 0),
            (_, Some(bb)) => bb,
        };
        let mut rng = ReplayToken {
            seed: self.params.seed,
            index: index as u64,
        }
        .to_std_rng();
        for attempt in 1..=self.params.attempt_budget {
            let p = g.random_point_in_bbox(&bbox, &mut rng);
            if !g.contains(&annulus, p) {
                continue;
            }
            if g.point_in_polygon(p, &hazard.geometry) {
                continue;
            }
            if self.probe.conflicts(p) {
                continue;
            }
            let candidate = Candidate {
                source_hazard_id: hazard.id.clone(),
                center: p,
                radius: self.params.marker_radius,
                group: classify(index),
                geometry: g.circle(p, self.params.marker_radius, self.params.circle_steps),
            };
            return (Ok(candidate), attempt);
        }
        (Err(Omission::AttemptsExhausted), self.params.attempt_budget)
    }
}

/// Convenience wrapper: validate, then generate.
pub fn generate<G, P>(
    hazards: &[HazardPolygon],
    params: &PlacementParams,
    geometry: &G,
    probe: &P,
) -> Result<Placement, PlacementError>
where
    G: GeometryOps + ?Sized,
    P: ExclusionProbe + ?Sized,
{
    CandidateGenerator::new(params.clone(), geometry, probe)?.generate(hazards)
}
