use anyhow::{ensure, Context, Result};
use haven::geom::Metric;
use haven::placement::PlacementParams;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Settings file for the `haven` CLI. Every field is optional in the file;
/// command-line flags override whatever the file sets.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HavenConfig {
    pub placement: PlacementParams,
    pub metric: Metric,
    /// Distance to a road at which a candidate conflicts.
    pub road_tolerance: f64,
    pub route_endpoint: String,
}

impl Default for HavenConfig {
    fn default() -> Self {
        Self {
            placement: PlacementParams::default(),
            metric: Metric::Geographic,
            road_tolerance: 8.0,
            route_endpoint: "http://127.0.0.1:5000".to_string(),
        }
    }
}

impl HavenConfig {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw =
            fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
        let cfg: Self = serde_json::from_str(&raw)
            .with_context(|| format!("parsing config {}", path.display()))?;
        tracing::debug!(path = %path.display(), "config loaded");
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        self.placement.validate()?;
        ensure!(
            self.road_tolerance.is_finite() && self.road_tolerance >= 0.0,
            "road_tolerance must be finite and >= 0"
        );
        Ok(())
    }
}
