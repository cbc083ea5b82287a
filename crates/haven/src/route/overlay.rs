//! Single route overlay driven by routing responses.
//!
//! States are `NoRoute` and `HasRoute`. A successful response upserts the one
//! route geometry; an error response leaves state and geometry untouched and
//! is handed back to the caller. Each request gets a ticket from a
//! monotonically increasing counter, and only the latest ticket may change the
//! overlay, so a slow early response cannot overwrite a newer route.

use serde_json::Value;

use super::{PathRequest, PathResult, RouteError};
use crate::geojson::route_feature;
use crate::geom::Point;

/// Sequence number of an issued request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RouteTicket(u64);

impl RouteTicket {
    pub fn sequence(self) -> u64 {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverlayState {
    NoRoute,
    HasRoute,
}

/// Effect of a response on the overlay.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverlayUpdate {
    Created,
    Replaced,
    /// A newer request was issued; the response was discarded.
    Stale,
}

#[derive(Clone, Debug, Default)]
pub struct PathOverlay {
    issued: u64,
    pending: Option<PathRequest>,
    route: Option<Vec<Point>>,
}

impl PathOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> OverlayState {
        match self.route {
            Some(_) => OverlayState::HasRoute,
            None => OverlayState::NoRoute,
        }
    }

    pub fn route(&self) -> Option<&[Point]> {
        self.route.as_deref()
    }

    /// The most recently issued request.
    pub fn latest_request(&self) -> Option<&PathRequest> {
        self.pending.as_ref()
    }

    pub fn issue(&mut self, request: &PathRequest) -> RouteTicket {
        self.issued += 1;
        self.pending = Some(*request);
        tracing::debug!(ticket = self.issued, "route request issued");
        RouteTicket(self.issued)
    }

    pub fn is_current(&self, ticket: RouteTicket) -> bool {
        ticket.0 == self.issued
    }

    /// Apply a decoded response. Error payloads (and paths under two points)
    /// come back as `Err` with the overlay unchanged.
    pub fn apply(
        &mut self,
        ticket: RouteTicket,
        result: PathResult,
    ) -> Result<OverlayUpdate, RouteError> {
        if !self.is_current(ticket) {
            tracing::debug!(
                ticket = ticket.0,
                latest = self.issued,
                "stale route response discarded"
            );
            return Ok(OverlayUpdate::Stale);
        }
        let points = result.into_route()?;
        let update = match self.route {
            Some(_) => OverlayUpdate::Replaced,
            None => OverlayUpdate::Created,
        };
        tracing::info!(ticket = ticket.0, points = points.len(), ?update, "route overlay updated");
        self.route = Some(points);
        Ok(update)
    }

    /// Report a transport failure for `ticket`; never changes the overlay.
    pub fn apply_failure(
        &mut self,
        ticket: RouteTicket,
        err: RouteError,
    ) -> Result<OverlayUpdate, RouteError> {
        if !self.is_current(ticket) {
            tracing::debug!(ticket = ticket.0, error = %err, "stale route failure discarded");
            return Ok(OverlayUpdate::Stale);
        }
        tracing::warn!(ticket = ticket.0, error = %err, "route request failed");
        Err(err)
    }

    /// `apply` or `apply_failure`, depending on how the request ended.
    pub fn resolve(
        &mut self,
        ticket: RouteTicket,
        outcome: Result<PathResult, RouteError>,
    ) -> Result<OverlayUpdate, RouteError> {
        match outcome {
            Ok(result) => self.apply(ticket, result),
            Err(err) => self.apply_failure(ticket, err),
        }
    }

    /// Back to `NoRoute`. Outstanding tickets stay valid.
    pub fn clear(&mut self) {
        self.route = None;
    }

    /// Route as a GeoJSON feature, if any.
    pub fn to_geojson(&self) -> Option<Value> {
        self.route.as_deref().map(route_feature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::vector;

    fn request() -> PathRequest {
        PathRequest::new(vector![0.0, 0.0], vector![1.0, 1.0])
    }

    fn path(pts: &[[f64; 2]]) -> PathResult {
        PathResult::Path(pts.iter().map(|&[x, y]| vector![x, y]).collect())
    }

    #[test]
    fn error_after_success_keeps_first_route() {
        let mut overlay = PathOverlay::new();
        assert_eq!(overlay.state(), OverlayState::NoRoute);

        let t = overlay.issue(&request());
        let first = PathResult::from_json(br#"{"path": [[0, 0], [1, 1]]}"#).unwrap();
        assert_eq!(overlay.apply(t, first).unwrap(), OverlayUpdate::Created);

        let t = overlay.issue(&request());
        let second = PathResult::from_json(br#"{"error": "no route"}"#).unwrap();
        let err = overlay.apply(t, second).unwrap_err();
        assert_eq!(err.to_string(), "no route");

        assert_eq!(overlay.state(), OverlayState::HasRoute);
        assert_eq!(
            overlay.route(),
            Some(&[vector![0.0, 0.0], vector![1.0, 1.0]][..])
        );
    }

    #[test]
    fn applying_twice_equals_applying_once() {
        let result = path(&[[0.0, 0.0], [0.5, 0.2], [1.0, 1.0]]);
        let mut once = PathOverlay::new();
        let t = once.issue(&request());
        once.apply(t, result.clone()).unwrap();

        let mut twice = PathOverlay::new();
        let t = twice.issue(&request());
        twice.apply(t, result.clone()).unwrap();
        assert_eq!(twice.apply(t, result).unwrap(), OverlayUpdate::Replaced);

        assert_eq!(once.route(), twice.route());
        assert_eq!(once.to_geojson(), twice.to_geojson());
    }

    #[test]
    fn stale_responses_are_discarded() {
        let mut overlay = PathOverlay::new();
        let slow = overlay.issue(&request());
        let fast = overlay.issue(&request());
        assert!(slow < fast);

        overlay.apply(fast, path(&[[2.0, 2.0], [3.0, 3.0]])).unwrap();
        let late = overlay.apply(slow, path(&[[9.0, 9.0], [8.0, 8.0]])).unwrap();
        assert_eq!(late, OverlayUpdate::Stale);
        assert_eq!(overlay.route().map(|r| r[0]), Some(vector![2.0, 2.0]));

        let late_err = overlay.apply(slow, PathResult::Error("timeout".into()));
        assert_eq!(late_err.unwrap(), OverlayUpdate::Stale);
    }

    #[test]
    fn failures_surface_without_state_change() {
        let mut overlay = PathOverlay::new();
        let t = overlay.issue(&request());
        let err = overlay
            .resolve(t, Err(RouteError::Decode("truncated".into())))
            .unwrap_err();
        assert!(matches!(err, RouteError::Decode(_)));
        assert_eq!(overlay.state(), OverlayState::NoRoute);

        let err = overlay.apply(t, path(&[[0.0, 0.0]])).unwrap_err();
        assert!(matches!(err, RouteError::InvalidPath { points: 1 }));
        assert!(overlay.to_geojson().is_none());
    }

    #[test]
    fn clear_returns_to_no_route() {
        let mut overlay = PathOverlay::new();
        let t = overlay.issue(&request());
        overlay.apply(t, path(&[[0.0, 0.0], [1.0, 0.0]])).unwrap();
        overlay.clear();
        assert_eq!(overlay.state(), OverlayState::NoRoute);
        assert_eq!(
            overlay.apply(t, path(&[[0.0, 0.0], [1.0, 0.0]])).unwrap(),
            OverlayUpdate::Created
        );
    }
}
