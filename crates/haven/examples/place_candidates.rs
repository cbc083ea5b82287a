//! Place candidates around a small grid of hazards and print the groups.
//!
//! Usage:
//!   cargo run -p haven --example place_candidates -- [attempt_budget]

use haven::prelude::*;
use nalgebra::vector;

fn main() {
    let budget = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(4);
    let hazards: Vec<_> = (0..9)
        .map(|i| {
            let x = (i % 3) as f64 * 2500.0;
            let y = (i / 3) as f64 * 2500.0;
            HazardPolygon::new(
                format!("b{i}"),
                Polygon::rect(vector![x, y], vector![x + 25.0, y + 40.0]),
            )
        })
        .collect();
    // One east-west road through every hazard row.
    let roads = LineNetworkProbe::new(
        (0..3)
            .map(|r| {
                let y = r as f64 * 2500.0 + 20.0;
                vec![vector![-2000.0, y], vector![8000.0, y]]
            })
            .collect(),
        8.0,
        Metric::Planar,
    );
    let params = PlacementParams {
        attempt_budget: budget,
        seed: 7,
        ..Default::default()
    };
    let out = match generate(&hazards, &params, &Geometry::planar(), &roads) {
        Ok(out) => out,
        Err(e) => {
            eprintln!("placement failed: {e}");
            return;
        }
    };
    println!(
        "budget {budget}: placed {}/{} (exhausted {}, draws {})",
        out.report.placed,
        out.report.hazards,
        out.report.exhausted.len(),
        out.report.draws
    );
    for (g, group) in LayerPresenter::new().compose(&out.candidates) {
        let ids: Vec<_> = group
            .candidates
            .iter()
            .map(|c| c.source_hazard_id.to_string())
            .collect();
        println!("group {g} ({}): {}", group.color, ids.join(", "));
    }
}
