//! Explicit map-session context: the store, the presenter, and the route
//! overlay travel together instead of living in globals.

use crate::fingerprint::{fingerprint, Fingerprint};
use crate::geom::GeometryOps;
use crate::placement::{
    CandidateGenerator, CandidateSet, HazardPolygon, PlacementError, PlacementParams,
    PlacementReport,
};
use crate::present::{CandidateGroup, LayerPresenter};
use crate::probe::ExclusionProbe;
use crate::route::PathOverlay;
use crate::store::{CandidateStore, KeyValueStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Placement(#[from] PlacementError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Where the session's candidate set came from.
#[derive(Clone, Debug, PartialEq)]
pub enum SetOrigin {
    Cached,
    Generated(PlacementReport),
}

pub struct Session<S> {
    store: CandidateStore<S>,
    presenter: LayerPresenter,
    overlay: PathOverlay,
    candidates: Option<CandidateSet>,
}

impl<S: KeyValueStore> Session<S> {
    pub fn new(backend: S) -> Self {
        Self {
            store: CandidateStore::new(backend),
            presenter: LayerPresenter::new(),
            overlay: PathOverlay::new(),
            candidates: None,
        }
    }

    /// Reuse the cached set when its fingerprint matches these inputs;
    /// otherwise generate, cache with the new fingerprint, and use that.
    /// An exclusion layer without a `layer_key` always regenerates.
    pub fn load_or_generate<G, P>(
        &mut self,
        hazards: &[HazardPolygon],
        params: &PlacementParams,
        geometry: &G,
        probe: &P,
    ) -> Result<(&CandidateSet, SetOrigin), SessionError>
    where
        G: GeometryOps + ?Sized,
        P: ExclusionProbe + ?Sized,
    {
        let generator = CandidateGenerator::new(params.clone(), geometry, probe)?;
        let fp = input_fingerprint(hazards, params, geometry, probe);
        match &fp {
            Some(fp) => {
                if let Some(set) = self.store.load_fresh(fp) {
                    tracing::info!(
                        candidates = set.len(),
                        fingerprint = %fp,
                        "using cached candidates"
                    );
                    let set: &CandidateSet = self.candidates.insert(set);
                    return Ok((set, SetOrigin::Cached));
                }
            }
            None => tracing::debug!("exclusion layer has no content key; not reusing the cache"),
        }
        let placement = generator.generate(hazards)?;
        self.write_cache(&placement.candidates, fp.as_ref())?;
        let set: &CandidateSet = self.candidates.insert(placement.candidates);
        Ok((set, SetOrigin::Generated(placement.report)))
    }

    /// Generate unconditionally and overwrite the cache.
    pub fn regenerate<G, P>(
        &mut self,
        hazards: &[HazardPolygon],
        params: &PlacementParams,
        geometry: &G,
        probe: &P,
    ) -> Result<PlacementReport, SessionError>
    where
        G: GeometryOps + ?Sized,
        P: ExclusionProbe + ?Sized,
    {
        let placement = CandidateGenerator::new(params.clone(), geometry, probe)?.generate(hazards)?;
        let fp = input_fingerprint(hazards, params, geometry, probe);
        self.write_cache(&placement.candidates, fp.as_ref())?;
        self.candidates = Some(placement.candidates);
        Ok(placement.report)
    }

    pub fn candidates(&self) -> Option<&CandidateSet> {
        self.candidates.as_ref()
    }

    /// Visible candidate groups; empty before any set is loaded.
    pub fn layers(&self) -> Vec<CandidateGroup<'_>> {
        match &self.candidates {
            Some(set) => self.presenter.visible_layers(set),
            None => Vec::new(),
        }
    }

    pub fn presenter(&self) -> &LayerPresenter {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut LayerPresenter {
        &mut self.presenter
    }

    pub fn overlay(&self) -> &PathOverlay {
        &self.overlay
    }

    pub fn overlay_mut(&mut self) -> &mut PathOverlay {
        &mut self.overlay
    }

    pub fn store(&self) -> &CandidateStore<S> {
        &self.store
    }

    /// Drop the cached and in-memory sets.
    pub fn clear(&mut self) -> Result<(), StoreError> {
        self.candidates = None;
        self.store.clear()
    }

    /// Without a fingerprint the stored set is never treated as fresh.
    fn write_cache(
        &mut self,
        set: &CandidateSet,
        fp: Option<&Fingerprint>,
    ) -> Result<(), StoreError> {
        match fp {
            Some(fp) => self.store.cache_with_fingerprint(set, fp),
            None => self.store.cache(set),
        }
    }
}

fn input_fingerprint<G, P>(
    hazards: &[HazardPolygon],
    params: &PlacementParams,
    geometry: &G,
    probe: &P,
) -> Option<Fingerprint>
where
    G: GeometryOps + ?Sized,
    P: ExclusionProbe + ?Sized,
{
    let layer = probe.layer_key()?;
    Some(fingerprint(hazards, params, geometry.metric(), &layer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{Geometry, Polygon};
    use crate::geom::Point;
    use crate::probe::{LineNetworkProbe, NoExclusion};
    use crate::store::MemoryStore;
    use nalgebra::vector;

    fn hazards(n: usize) -> Vec<HazardPolygon> {
        (0..n)
            .map(|i| {
                let x = i as f64 * 2500.0;
                HazardPolygon::new(
                    format!("h{i}"),
                    Polygon::rect(vector![x, 0.0], vector![x + 30.0, 30.0]),
                )
            })
            .collect()
    }

    fn params() -> PlacementParams {
        PlacementParams {
            attempt_budget: 64,
            seed: 5,
            ..Default::default()
        }
    }

    #[test]
    fn second_load_hits_the_cache() {
        let g = Geometry::planar();
        let mut session = Session::new(MemoryStore::new());
        let (first, origin) = session
            .load_or_generate(&hazards(3), &params(), &g, &NoExclusion)
            .unwrap();
        let first = first.clone();
        assert!(matches!(origin, SetOrigin::Generated(ref r) if r.placed == 3));

        let (second, origin) = session
            .load_or_generate(&hazards(3), &params(), &g, &NoExclusion)
            .unwrap();
        assert_eq!(origin, SetOrigin::Cached);
        assert_eq!(second, &first);
    }

    #[test]
    fn changed_hazards_force_regeneration() {
        let g = Geometry::planar();
        let mut session = Session::new(MemoryStore::new());
        session
            .load_or_generate(&hazards(3), &params(), &g, &NoExclusion)
            .unwrap();
        let (set, origin) = session
            .load_or_generate(&hazards(4), &params(), &g, &NoExclusion)
            .unwrap();
        assert_eq!(set.len(), 4);
        assert!(matches!(origin, SetOrigin::Generated(_)));
    }

    #[test]
    fn added_road_layer_invalidates_the_cache() {
        let g = Geometry::planar();
        let mut session = Session::new(MemoryStore::new());
        let (first, _) = session
            .load_or_generate(&hazards(3), &params(), &g, &NoExclusion)
            .unwrap();
        let through_centers: Vec<Vec<Point>> = first.iter().map(|c| vec![c.center]).collect();
        let roads = LineNetworkProbe::new(through_centers, 1.0, g.metric());
        assert!(first.iter().all(|c| roads.conflicts(c.center)));

        let (set, origin) = session
            .load_or_generate(&hazards(3), &params(), &g, &roads)
            .unwrap();
        assert!(matches!(origin, SetOrigin::Generated(_)));
        assert!(set.iter().all(|c| !roads.conflicts(c.center)));

        let (_, origin) = session
            .load_or_generate(&hazards(3), &params(), &g, &roads)
            .unwrap();
        assert_eq!(origin, SetOrigin::Cached);
    }

    #[test]
    fn unkeyed_layer_never_reuses_the_cache() {
        let g = Geometry::planar();
        let mut session = Session::new(MemoryStore::new());
        session
            .load_or_generate(&hazards(1), &params(), &g, &NoExclusion)
            .unwrap();
        let everywhere = |_: Point| true;
        let (set, origin) = session
            .load_or_generate(&hazards(1), &params(), &g, &everywhere)
            .unwrap();
        assert!(matches!(origin, SetOrigin::Generated(ref r) if r.exhausted.len() == 1));
        assert!(set.is_empty());
        assert!(session.store().stored_fingerprint().is_none());

        let nowhere = |_: Point| false;
        let (_, origin) = session
            .load_or_generate(&hazards(1), &params(), &g, &nowhere)
            .unwrap();
        assert!(matches!(origin, SetOrigin::Generated(_)));
        let (_, origin) = session
            .load_or_generate(&hazards(1), &params(), &g, &NoExclusion)
            .unwrap();
        assert!(matches!(origin, SetOrigin::Generated(_)));
    }

    #[test]
    fn corrupt_cache_regenerates() {
        let g = Geometry::planar();
        let mut session = Session::new(MemoryStore::new());
        session
            .load_or_generate(&hazards(2), &params(), &g, &NoExclusion)
            .unwrap();
        let mut backend = session.store().backend().clone();
        backend.set(crate::store::CANDIDATES_KEY, "{broken").unwrap();
        let mut session = Session::new(backend);
        let (set, origin) = session
            .load_or_generate(&hazards(2), &params(), &g, &NoExclusion)
            .unwrap();
        assert_eq!(set.len(), 2);
        assert!(matches!(origin, SetOrigin::Generated(_)));
    }

    #[test]
    fn layers_follow_presenter_toggles() {
        let g = Geometry::planar();
        let mut session = Session::new(MemoryStore::new());
        assert!(session.layers().is_empty());
        session
            .load_or_generate(&hazards(4), &params(), &g, &NoExclusion)
            .unwrap();
        assert!(session.layers().is_empty());
        session.presenter_mut().toggle(0);
        let layers = session.layers();
        assert_eq!(layers.len(), 1);
        assert_eq!(layers[0].len(), 2);
        session.clear().unwrap();
        assert!(session.candidates().is_none());
        assert!(session.store().load().is_none());
    }
}
