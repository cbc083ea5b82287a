//! Routing request/response contract and the route overlay.
//!
//! Wire format (POST `/shortest-path`):
//! - request `{"start": [lon, lat], "end": [lon, lat]}`
//! - success `{"path": [[lon, lat, ..], ...]}` with at least two points;
//!   numbers past the first two in a point are ignored
//! - failure `{"error": "<message>"}`

mod client;
mod overlay;

pub use client::{RouteClient, SHORTEST_PATH};
pub use overlay::{OverlayState, OverlayUpdate, PathOverlay, RouteTicket};

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::geom::Point;

#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("routing request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("undecodable routing response: {0}")]
    Decode(String),
    /// Error payload from the routing service, verbatim.
    #[error("{0}")]
    Service(String),
    #[error("route has {points} point(s); at least 2 are required")]
    InvalidPath { points: usize },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathRequest {
    pub start: Point,
    pub end: Point,
}

impl PathRequest {
    pub fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }
}

/// Decoded routing response.
#[derive(Clone, Debug, PartialEq)]
pub enum PathResult {
    Path(Vec<Point>),
    Error(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ResponseWire {
    Path { path: Vec<Vec<f64>> },
    Error { error: String },
}

#[derive(Serialize)]
pub(crate) struct RequestWire {
    start: [f64; 2],
    end: [f64; 2],
}

impl From<&PathRequest> for RequestWire {
    fn from(r: &PathRequest) -> Self {
        Self {
            start: [r.start.x, r.start.y],
            end: [r.end.x, r.end.y],
        }
    }
}

impl PathResult {
    /// Decode a response body, whatever its HTTP status.
    pub fn from_json(body: &[u8]) -> Result<Self, RouteError> {
        let wire: ResponseWire =
            serde_json::from_slice(body).map_err(|e| RouteError::Decode(e.to_string()))?;
        Ok(match wire {
            ResponseWire::Path { path } => PathResult::Path(
                path.iter()
                    .enumerate()
                    .map(|(i, raw)| path_point(raw, i))
                    .collect::<Result<_, _>>()?,
            ),
            ResponseWire::Error { error } => PathResult::Error(error),
        })
    }

    /// Usable route points, or the error this result stands for.
    pub fn into_route(self) -> Result<Vec<Point>, RouteError> {
        match self {
            PathResult::Path(points) if points.len() >= 2 => Ok(points),
            PathResult::Path(points) => Err(RouteError::InvalidPath {
                points: points.len(),
            }),
            PathResult::Error(message) => Err(RouteError::Service(message)),
        }
    }
}

fn path_point(raw: &[f64], index: usize) -> Result<Point, RouteError> {
    match raw {
        [x, y, ..] if x.is_finite() && y.is_finite() => Ok(Vector2::new(*x, *y)),
        _ => Err(RouteError::Decode(format!(
            "path point {index} is not a finite [lon, lat] pair"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::vector;

    #[test]
    fn decodes_both_response_shapes() {
        let ok = PathResult::from_json(br#"{"path": [[0, 0], [1, 1]]}"#).unwrap();
        assert_eq!(
            ok,
            PathResult::Path(vec![vector![0.0, 0.0], vector![1.0, 1.0]])
        );
        let err = PathResult::from_json(br#"{"error": "no route"}"#).unwrap();
        assert_eq!(err, PathResult::Error("no route".into()));
    }

    #[test]
    fn path_points_keep_lon_lat_and_drop_extra_numbers() {
        let ok = PathResult::from_json(br#"{"path": [[36.61, 37.0, 0.0], [36.65, 37.03, 12.5]]}"#)
            .unwrap();
        assert_eq!(
            ok,
            PathResult::Path(vec![vector![36.61, 37.0], vector![36.65, 37.03]])
        );
        assert_eq!(ok.into_route().unwrap().len(), 2);
    }

    #[test]
    fn rejects_unknown_bodies() {
        let bodies: [&[u8]; 5] = [
            b"<html>",
            br#"{"status": "ok"}"#,
            br#"{"path": [[1]]}"#,
            br#"{"path": [[0, 0], []]}"#,
            br#"{"path": [[0, 0], ["a", 1]]}"#,
        ];
        for body in bodies {
            assert!(matches!(
                PathResult::from_json(body),
                Err(RouteError::Decode(_))
            ));
        }
    }

    #[test]
    fn short_paths_are_errors() {
        let one = PathResult::Path(vec![vector![0.0, 0.0]]);
        assert!(matches!(
            one.into_route(),
            Err(RouteError::InvalidPath { points: 1 })
        ));
        let service = PathResult::Error("No path exists".into()).into_route();
        match service {
            Err(e) => assert_eq!(e.to_string(), "No path exists"),
            Ok(_) => panic!("error payload accepted as a route"),
        }
    }

    #[test]
    fn request_body_uses_lon_lat_pairs() {
        let req = PathRequest::new(vector![13.4, 52.5], vector![13.5, 52.6]);
        let body = serde_json::to_value(RequestWire::from(&req)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"start": [13.4, 52.5], "end": [13.5, 52.6]})
        );
    }
}
