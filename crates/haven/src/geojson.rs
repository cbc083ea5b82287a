//! GeoJSON in and out.
//!
//! - Hazards: `Polygon` / `MultiPolygon` features (each part is a hazard).
//! - Exclusion layer: `LineString` / `MultiLineString` features.
//! - Candidates: `Feature` with a `Polygon` circle and `{color, hazard, center,
//!   radius}` properties; this is also the persisted cache format.
//! - Route: `LineString` feature.

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::classify::Color;
use crate::geom::{Point, Polygon};
use crate::placement::{Candidate, HazardId, HazardPolygon};

#[derive(Debug, thiserror::Error)]
pub enum GeoJsonError {
    #[error("malformed GeoJSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("feature {feature}: position needs at least two finite coordinates")]
    BadPosition { feature: usize },
}

#[derive(Deserialize)]
struct FeatureCollectionIn {
    features: Vec<FeatureIn>,
}

#[derive(Deserialize)]
struct FeatureIn {
    #[serde(default)]
    id: Option<Value>,
    geometry: Option<GeometryIn>,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum GeometryIn {
    Polygon {
        coordinates: Vec<Vec<Vec<f64>>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<Vec<f64>>>>,
    },
    LineString {
        coordinates: Vec<Vec<f64>>,
    },
    MultiLineString {
        coordinates: Vec<Vec<Vec<f64>>>,
    },
    #[serde(other)]
    Other,
}

fn position(raw: &[f64], feature: usize) -> Result<Point, GeoJsonError> {
    match raw {
        [x, y, ..] if x.is_finite() && y.is_finite() => Ok(Vector2::new(*x, *y)),
        _ => Err(GeoJsonError::BadPosition { feature }),
    }
}

fn line(raw: &[Vec<f64>], feature: usize) -> Result<Vec<Point>, GeoJsonError> {
    raw.iter().map(|p| position(p, feature)).collect()
}

fn polygon(raw: &[Vec<Vec<f64>>], feature: usize) -> Result<Option<Polygon>, GeoJsonError> {
    let mut rings = raw.iter().map(|r| line(r, feature));
    let Some(exterior) = rings.next().transpose()? else {
        return Ok(None);
    };
    let holes = rings.collect::<Result<Vec<_>, _>>()?;
    Ok(Some(Polygon::with_holes(exterior, holes)))
}

fn feature_id(id: Option<&Value>, index: usize) -> String {
    match id {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => index.to_string(),
    }
}

/// Hazard polygons from a FeatureCollection, in feature order.
pub fn read_hazards(json: &str) -> Result<Vec<HazardPolygon>, GeoJsonError> {
    let fc: FeatureCollectionIn = serde_json::from_str(json)?;
    let mut out = Vec::with_capacity(fc.features.len());
    for (index, f) in fc.features.iter().enumerate() {
        let id = feature_id(f.id.as_ref(), index);
        match &f.geometry {
            Some(GeometryIn::Polygon { coordinates }) => {
                if let Some(p) = polygon(coordinates, index)? {
                    out.push(HazardPolygon::new(id, p));
                }
            }
            Some(GeometryIn::MultiPolygon { coordinates }) => {
                for (part, raw) in coordinates.iter().enumerate() {
                    if let Some(p) = polygon(raw, index)? {
                        out.push(HazardPolygon::new(format!("{id}#{part}"), p));
                    }
                }
            }
            _ => tracing::debug!(feature = index, "non-polygon hazard feature skipped"),
        }
    }
    Ok(out)
}

/// Polylines from a FeatureCollection (exclusion layer).
pub fn read_polylines(json: &str) -> Result<Vec<Vec<Point>>, GeoJsonError> {
    let fc: FeatureCollectionIn = serde_json::from_str(json)?;
    let mut out = Vec::new();
    for (index, f) in fc.features.iter().enumerate() {
        match &f.geometry {
            Some(GeometryIn::LineString { coordinates }) => out.push(line(coordinates, index)?),
            Some(GeometryIn::MultiLineString { coordinates }) => {
                for raw in coordinates {
                    out.push(line(raw, index)?);
                }
            }
            _ => tracing::debug!(feature = index, "non-line exclusion feature skipped"),
        }
    }
    Ok(out)
}

/// Closed GeoJSON rings for `p`.
pub fn polygon_coordinates(p: &Polygon) -> Vec<Vec<[f64; 2]>> {
    p.rings()
        .map(|ring| {
            let mut out: Vec<[f64; 2]> = ring.iter().map(|v| [v.x, v.y]).collect();
            if let Some(&first) = out.first() {
                out.push(first);
            }
            out
        })
        .collect()
}

fn polygon_from_coordinates(rings: &[Vec<[f64; 2]>]) -> Option<Polygon> {
    let mut it = rings.iter().map(|r| {
        r.iter()
            .map(|&[x, y]| Vector2::new(x, y))
            .collect::<Vec<Point>>()
    });
    let exterior = it.next()?;
    Some(Polygon::with_holes(exterior, it.collect()))
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct PolygonGeometry {
    #[serde(rename = "type")]
    kind: String,
    coordinates: Vec<Vec<[f64; 2]>>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct CandidateProperties {
    color: String,
    hazard: String,
    center: [f64; 2],
    radius: f64,
}

/// Wire form of one candidate.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CandidateFeature {
    #[serde(rename = "type")]
    kind: String,
    geometry: PolygonGeometry,
    properties: CandidateProperties,
}

impl CandidateFeature {
    pub fn from_candidate(c: &Candidate) -> Self {
        Self {
            kind: "Feature".to_string(),
            geometry: PolygonGeometry {
                kind: "Polygon".to_string(),
                coordinates: polygon_coordinates(&c.geometry),
            },
            properties: CandidateProperties {
                color: c.color().hex().to_string(),
                hazard: c.source_hazard_id.0.clone(),
                center: [c.center.x, c.center.y],
                radius: c.radius,
            },
        }
    }

    /// `None` when the feature is not a well-formed palette candidate.
    pub fn into_candidate(self) -> Option<Candidate> {
        if self.kind != "Feature" || self.geometry.kind != "Polygon" {
            return None;
        }
        let color = Color::from_hex(&self.properties.color)?;
        let [x, y] = self.properties.center;
        let radius = self.properties.radius;
        if ![x, y, radius].iter().all(|v| v.is_finite()) || radius <= 0.0 {
            return None;
        }
        let geometry = polygon_from_coordinates(&self.geometry.coordinates)?;
        if geometry.is_degenerate() {
            return None;
        }
        Some(Candidate {
            source_hazard_id: HazardId(self.properties.hazard),
            center: Vector2::new(x, y),
            radius,
            group: color.group(),
            geometry,
        })
    }
}

/// FeatureCollection of candidates.
pub fn candidate_collection<'a, I>(candidates: I) -> Value
where
    I: IntoIterator<Item = &'a Candidate>,
{
    let features: Vec<CandidateFeature> = candidates
        .into_iter()
        .map(CandidateFeature::from_candidate)
        .collect();
    json!({ "type": "FeatureCollection", "features": features })
}

/// Route as a `LineString` feature.
pub fn route_feature(points: &[Point]) -> Value {
    let coordinates: Vec<[f64; 2]> = points.iter().map(|p| [p.x, p.y]).collect();
    json!({
        "type": "Feature",
        "geometry": { "type": "LineString", "coordinates": coordinates },
        "properties": {}
    })
}
