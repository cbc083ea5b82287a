//! Persisted candidate set under a single well-known key.
//!
//! - `cache` overwrites unconditionally (last write wins).
//! - `load` never fails: absent, unreadable, or malformed data is `None`, so
//!   the caller regenerates instead of crashing.
//! - A fingerprint may be stored alongside; `load_fresh` only returns a set
//!   whose stored fingerprint matches.

mod backend;

pub use backend::{FileStore, KeyValueStore, MemoryStore};

use std::path::PathBuf;

use crate::fingerprint::Fingerprint;
use crate::geojson::CandidateFeature;
use crate::placement::CandidateSet;

/// Key holding the serialized candidate array.
pub const CANDIDATES_KEY: &str = "circles";

/// Key holding the fingerprint of the inputs the cached set came from.
pub const FINGERPRINT_KEY: &str = "circles.fingerprint";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode candidate set: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("invalid store key {0:?}")]
    InvalidKey(String),
}

pub struct CandidateStore<S> {
    backend: S,
}

impl<S: KeyValueStore> CandidateStore<S> {
    pub fn new(backend: S) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    pub fn into_backend(self) -> S {
        self.backend
    }

    /// Overwrite the stored set. Any stored fingerprint is dropped, since it
    /// no longer describes the stored set.
    pub fn cache(&mut self, set: &CandidateSet) -> Result<(), StoreError> {
        let encoded = encode(set)?;
        self.backend.remove(FINGERPRINT_KEY)?;
        self.backend.set(CANDIDATES_KEY, &encoded)?;
        tracing::debug!(candidates = set.len(), "candidate set cached");
        Ok(())
    }

    /// Overwrite the stored set and record the fingerprint of its inputs.
    pub fn cache_with_fingerprint(
        &mut self,
        set: &CandidateSet,
        fp: &Fingerprint,
    ) -> Result<(), StoreError> {
        self.cache(set)?;
        self.backend.set(FINGERPRINT_KEY, &fp.0)?;
        Ok(())
    }

    pub fn load(&self) -> Option<CandidateSet> {
        let raw = match self.backend.get(CANDIDATES_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                tracing::warn!(error = %err, "candidate cache unreadable; treating as absent");
                return None;
            }
        };
        let set = decode(&raw);
        if set.is_none() {
            tracing::warn!(bytes = raw.len(), "candidate cache malformed; treating as absent");
        }
        set
    }

    pub fn stored_fingerprint(&self) -> Option<Fingerprint> {
        match self.backend.get(FINGERPRINT_KEY) {
            Ok(v) => v.map(|s| Fingerprint(s.trim().to_string())),
            Err(err) => {
                tracing::warn!(error = %err, "fingerprint unreadable");
                None
            }
        }
    }

    /// The stored set, only if it was cached for inputs hashing to `fp`.
    pub fn load_fresh(&self, fp: &Fingerprint) -> Option<CandidateSet> {
        match self.stored_fingerprint() {
            Some(stored) if &stored == fp => self.load(),
            Some(stored) => {
                tracing::info!(stored = %stored, expected = %fp, "candidate cache is stale");
                None
            }
            None => None,
        }
    }

    pub fn clear(&mut self) -> Result<(), StoreError> {
        self.backend.remove(CANDIDATES_KEY)?;
        self.backend.remove(FINGERPRINT_KEY)?;
        Ok(())
    }
}

fn encode(set: &CandidateSet) -> Result<String, serde_json::Error> {
    let features: Vec<CandidateFeature> = set.iter().map(CandidateFeature::from_candidate).collect();
    serde_json::to_string(&features)
}

fn decode(raw: &str) -> Option<CandidateSet> {
    let features: Vec<CandidateFeature> = serde_json::from_str(raw).ok()?;
    features
        .into_iter()
        .map(CandidateFeature::into_candidate)
        .collect::<Option<Vec<_>>>()
        .map(CandidateSet::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{Geometry, Polygon};
    use crate::placement::{generate, HazardPolygon, PlacementParams};
    use crate::probe::NoExclusion;
    use nalgebra::vector;
    use tempfile::tempdir;

    fn sample_set() -> CandidateSet {
        let hazards: Vec<_> = (0..4)
            .map(|i| {
                let x = i as f64 * 3000.0;
                HazardPolygon::new(
                    format!("b{i}"),
                    Polygon::rect(vector![x, 0.0], vector![x + 20.0, 35.0]),
                )
            })
            .collect();
        let params = PlacementParams {
            attempt_budget: 64,
            seed: 3,
            ..Default::default()
        };
        generate(&hazards, &params, &Geometry::planar(), &NoExclusion)
            .unwrap()
            .candidates
    }

    #[test]
    fn load_cache_load_round_trips() {
        let mut store = CandidateStore::new(MemoryStore::new());
        assert!(store.load().is_none());
        let set = sample_set();
        assert_eq!(set.len(), 4);
        store.cache(&set).unwrap();
        assert_eq!(store.load(), Some(set));
    }

    #[test]
    fn geographic_set_round_trips_exactly() {
        let hazards: Vec<HazardPolygon> = (0..3)
            .map(|i| {
                let lon = 36.62 + i as f64 * 0.03;
                HazardPolygon::new(
                    format!("g{i}"),
                    Polygon::rect(vector![lon, 37.018], vector![lon + 0.0003, 37.0183]),
                )
            })
            .collect();
        let params = PlacementParams {
            attempt_budget: 64,
            seed: 11,
            ..Default::default()
        };
        let set = generate(&hazards, &params, &Geometry::geographic(), &NoExclusion)
            .unwrap()
            .candidates;
        assert_eq!(set.len(), 3);

        let mut memory = CandidateStore::new(MemoryStore::new());
        memory.cache(&set).unwrap();
        assert_eq!(memory.load().as_ref(), Some(&set));

        let dir = tempdir().unwrap();
        let mut disk = CandidateStore::new(FileStore::new(dir.path()));
        disk.cache(&set).unwrap();
        let reopened = CandidateStore::new(FileStore::new(dir.path()));
        assert_eq!(reopened.load(), Some(set));
    }

    #[test]
    fn cache_is_last_write_wins() {
        let mut store = CandidateStore::new(MemoryStore::new());
        let set = sample_set();
        store.cache(&set).unwrap();
        let shorter: CandidateSet = set.iter().take(1).cloned().collect();
        store.cache(&shorter).unwrap();
        assert_eq!(store.load(), Some(shorter));
    }

    #[test]
    fn empty_set_round_trips() {
        let mut store = CandidateStore::new(MemoryStore::new());
        store.cache(&CandidateSet::default()).unwrap();
        assert_eq!(store.load(), Some(CandidateSet::default()));
    }

    #[test]
    fn corrupt_entries_read_as_absent() {
        for raw in [
            "not json",
            "{\"type\":\"FeatureCollection\"}",
            "[{\"type\":\"Feature\"}]",
            "[{\"type\":\"Feature\",\"geometry\":{\"type\":\"Polygon\",\"coordinates\":[[[0,0],[1,0],[1,1]]]},\
              \"properties\":{\"color\":\"blue\",\"hazard\":\"a\",\"center\":[0,0],\"radius\":15}}]",
        ] {
            let mut backend = MemoryStore::new();
            backend.set(CANDIDATES_KEY, raw).unwrap();
            let store = CandidateStore::new(backend);
            assert!(store.load().is_none(), "accepted {raw}");
        }
    }

    #[test]
    fn fingerprint_gates_fresh_loads() {
        let mut store = CandidateStore::new(MemoryStore::new());
        let set = sample_set();
        let fp = Fingerprint("abc".into());
        store.cache_with_fingerprint(&set, &fp).unwrap();
        assert_eq!(store.load_fresh(&fp), Some(set.clone()));
        assert_eq!(store.load_fresh(&Fingerprint("def".into())), None);
        // A plain cache drops the fingerprint; the set is no longer fresh for anyone.
        store.cache(&set).unwrap();
        assert_eq!(store.load_fresh(&fp), None);
        assert_eq!(store.load(), Some(set));
    }

    #[test]
    fn clear_removes_everything_on_disk() {
        let dir = tempdir().unwrap();
        let mut store = CandidateStore::new(FileStore::new(dir.path()));
        let set = sample_set();
        store
            .cache_with_fingerprint(&set, &Fingerprint("x".into()))
            .unwrap();
        let reopened = CandidateStore::new(FileStore::new(dir.path()));
        assert_eq!(reopened.load(), Some(set));
        store.clear().unwrap();
        assert!(store.load().is_none());
        assert!(store.stored_fingerprint().is_none());
    }
}
