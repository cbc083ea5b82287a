//! Hazards in, candidates out.

use std::fmt;

use crate::classify::{Color, GroupId};
use crate::geom::{Point, Polygon};

/// Identifier of a hazard polygon (GeoJSON feature id or index).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HazardId(pub String);

impl fmt::Display for HazardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for HazardId {
    fn from(s: &str) -> Self {
        HazardId(s.to_string())
    }
}

impl From<String> for HazardId {
    fn from(s: String) -> Self {
        HazardId(s)
    }
}

/// Externally supplied hazard geometry.
#[derive(Clone, Debug, PartialEq)]
pub struct HazardPolygon {
    pub id: HazardId,
    pub geometry: Polygon,
}

impl HazardPolygon {
    pub fn new(id: impl Into<HazardId>, geometry: Polygon) -> Self {
        Self {
            id: id.into(),
            geometry,
        }
    }
}

/// Accepted, classified marker near one hazard.
#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
    pub source_hazard_id: HazardId,
    pub center: Point,
    pub radius: f64,
    pub group: GroupId,
    pub geometry: Polygon,
}

impl Candidate {
    /// Palette color of this candidate's group.
    pub fn color(&self) -> Color {
        Color::from_group(self.group).unwrap_or(Color::ALL[self.group % Color::ALL.len()])
    }
}

/// Candidates in hazard iteration order; the persisted unit.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CandidateSet {
    candidates: Vec<Candidate>,
}

impl CandidateSet {
    pub fn new(candidates: Vec<Candidate>) -> Self {
        Self { candidates }
    }

    pub fn push(&mut self, c: Candidate) {
        self.candidates.push(c);
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Candidate> {
        self.candidates.iter()
    }

    pub fn as_slice(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn into_vec(self) -> Vec<Candidate> {
        self.candidates
    }
}

impl FromIterator<Candidate> for CandidateSet {
    fn from_iter<I: IntoIterator<Item = Candidate>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a CandidateSet {
    type Item = &'a Candidate;
    type IntoIter = std::slice::Iter<'a, Candidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.candidates.iter()
    }
}
