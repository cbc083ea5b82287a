//! Safe-candidate placement around hazard polygons.
//!
//! Pipeline: hazards → `placement` (annulus sampling against `geom` and an
//! exclusion `probe`) → `classify` → `store` (cached, fingerprinted) →
//! `present` (grouped, toggleable layers). Independently, `route` applies
//! routing-service responses to a single overlay.
//!
//! API Policy
//! - This crate is project-internal. There is no stable public API.
//! - `Session` is the entry point for callers that want the whole pipeline;
//!   the modules stay usable on their own.

pub mod classify;
pub mod fingerprint;
pub mod geojson;
pub mod geom;
pub mod placement;
pub mod present;
pub mod probe;
pub mod route;
pub mod session;
pub mod store;

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use session::{Session, SessionError, SetOrigin};

/// Common exports for quick imports in callers.
pub mod prelude {
    pub use crate::classify::{classify, Color, GroupId, PALETTE_SIZE};
    pub use crate::fingerprint::{fingerprint, Fingerprint};
    pub use crate::geom::{BBox, Geometry, GeometryOps, Metric, Point, Polygon, Region};
    pub use crate::placement::{
        generate, Candidate, CandidateGenerator, CandidateSet, HazardId, HazardPolygon,
        Placement, PlacementError, PlacementParams, PlacementReport,
    };
    pub use crate::present::{HazardToggle, LayerPresenter};
    pub use crate::probe::{ExclusionProbe, LineNetworkProbe, NoExclusion};
    pub use crate::route::{PathOverlay, PathRequest, PathResult, RouteClient, RouteError};
    pub use crate::session::{Session, SetOrigin};
    pub use crate::store::{CandidateStore, FileStore, KeyValueStore, MemoryStore};
    pub use nalgebra::Vector2 as Vec2;
}
