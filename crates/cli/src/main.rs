mod config;
mod export;
mod provenance;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use haven::classify::PALETTE_SIZE;
use haven::geojson::{candidate_collection, read_hazards, read_polylines};
use haven::geom::{Geometry, Metric, Point};
use haven::placement::CandidateSet;
use haven::present::LayerPresenter;
use haven::probe::{ExclusionProbe, LineNetworkProbe, NoExclusion};
use haven::route::{PathOverlay, PathRequest, RouteClient};
use haven::store::{CandidateStore, FileStore};
use haven::{Session, SetOrigin};
use nalgebra::Vector2;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::fmt::SubscriberBuilder;
use tracing_subscriber::EnvFilter;

use config::HavenConfig;
use provenance::Provenance;

#[derive(Parser)]
#[command(name = "haven")]
#[command(about = "Place, cache, and present safe candidates around hazard polygons")]
struct Cmd {
    /// JSON settings file; flags override its values
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    action: Action,
}

#[derive(Clone, Copy, ValueEnum)]
enum MetricArg {
    Planar,
    Geographic,
}

impl From<MetricArg> for Metric {
    fn from(m: MetricArg) -> Self {
        match m {
            MetricArg::Planar => Metric::Planar,
            MetricArg::Geographic => Metric::Geographic,
        }
    }
}

#[derive(Subcommand)]
enum Action {
    /// Generate candidates for a hazard FeatureCollection (or reuse the cache)
    Generate {
        #[arg(long)]
        hazards: PathBuf,
        #[arg(long)]
        store: PathBuf,
        /// Exclusion layer: LineString/MultiLineString FeatureCollection
        #[arg(long)]
        roads: Option<PathBuf>,
        #[arg(long)]
        road_tolerance: Option<f64>,
        #[arg(long)]
        inner: Option<f64>,
        #[arg(long)]
        outer: Option<f64>,
        #[arg(long)]
        attempts: Option<u32>,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, value_enum)]
        metric: Option<MetricArg>,
        /// Regenerate even when the cache matches
        #[arg(long)]
        force: bool,
    },
    /// Print visible candidate groups as a GeoJSON FeatureCollection
    Show {
        #[arg(long)]
        store: PathBuf,
        /// Groups to show (repeatable); all groups when omitted
        #[arg(long = "group")]
        groups: Vec<usize>,
    },
    /// Export the cached set to .csv or .parquet with a provenance sidecar
    Export {
        #[arg(long)]
        store: PathBuf,
        #[arg(long)]
        out: PathBuf,
    },
    /// Remove the cached set and its fingerprint
    Clear {
        #[arg(long)]
        store: PathBuf,
    },
    /// Ask the routing service for a path and print it as a GeoJSON feature
    Route {
        #[arg(long)]
        endpoint: Option<String>,
        /// lon,lat
        #[arg(long, value_parser = parse_point)]
        start: Point,
        /// lon,lat
        #[arg(long, value_parser = parse_point)]
        end: Point,
    },
    /// Print a small provenance JSON block
    Report,
}

fn main() -> Result<()> {
    SubscriberBuilder::default()
        .with_target(false)
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    let cmd = Cmd::parse();
    let cfg = HavenConfig::load(cmd.config.as_deref())?;
    match cmd.action {
        Action::Generate {
            hazards,
            store,
            roads,
            road_tolerance,
            inner,
            outer,
            attempts,
            seed,
            metric,
            force,
        } => {
            let mut cfg = cfg;
            if let Some(v) = road_tolerance {
                cfg.road_tolerance = v;
            }
            if let Some(v) = inner {
                cfg.placement.inner_radius = v;
            }
            if let Some(v) = outer {
                cfg.placement.outer_radius = v;
            }
            if let Some(v) = attempts {
                cfg.placement.attempt_budget = v;
            }
            if let Some(v) = seed {
                cfg.placement.seed = v;
            }
            if let Some(m) = metric {
                cfg.metric = m.into();
            }
            generate(&cfg, &hazards, &store, roads.as_deref(), force)
        }
        Action::Show { store, groups } => show(&store, &groups),
        Action::Export { store, out } => export(&store, &out),
        Action::Clear { store } => clear(&store),
        Action::Route {
            endpoint,
            start,
            end,
        } => route(endpoint.as_deref().unwrap_or(&cfg.route_endpoint), start, end),
        Action::Report => report(),
    }
}

fn parse_point(s: &str) -> Result<Point, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected lon,lat but got {s:?}"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .ok_or_else(|| format!("not a finite number: {v:?}"))
    };
    Ok(Vector2::new(parse(x)?, parse(y)?))
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn generate(
    cfg: &HavenConfig,
    hazards_path: &Path,
    store: &Path,
    roads: Option<&Path>,
    force: bool,
) -> Result<()> {
    cfg.validate()?;
    let hazards = read_hazards(&read(hazards_path)?)
        .with_context(|| format!("parsing hazards {}", hazards_path.display()))?;
    let probe: Box<dyn ExclusionProbe> = match roads {
        Some(path) => {
            let lines = read_polylines(&read(path)?)
                .with_context(|| format!("parsing roads {}", path.display()))?;
            Box::new(LineNetworkProbe::new(lines, cfg.road_tolerance, cfg.metric))
        }
        None => Box::new(NoExclusion),
    };
    let geometry = Geometry::new(cfg.metric);
    tracing::info!(
        hazards = hazards.len(),
        metric = ?cfg.metric,
        attempts = cfg.placement.attempt_budget,
        store = %store.display(),
        "generate"
    );

    let mut session = Session::new(FileStore::new(store));
    let summary = if force {
        let report = session.regenerate(&hazards, &cfg.placement, &geometry, probe.as_ref())?;
        serde_json::json!({
            "origin": "generated",
            "candidates": report.placed,
            "hazards": report.hazards,
            "empty_annulus": report.empty_annulus.len(),
            "exhausted": report.exhausted.len(),
            "draws": report.draws,
        })
    } else {
        let (set, origin) =
            session.load_or_generate(&hazards, &cfg.placement, &geometry, probe.as_ref())?;
        let candidates = set.len();
        match origin {
            SetOrigin::Cached => serde_json::json!({
                "origin": "cached",
                "candidates": candidates,
                "hazards": hazards.len(),
            }),
            SetOrigin::Generated(report) => serde_json::json!({
                "origin": "generated",
                "candidates": candidates,
                "hazards": report.hazards,
                "empty_annulus": report.empty_annulus.len(),
                "exhausted": report.exhausted.len(),
                "draws": report.draws,
            }),
        }
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn show(store: &Path, groups: &[usize]) -> Result<()> {
    let Some(set) = CandidateStore::new(FileStore::new(store)).load() else {
        bail!("no cached candidates in {}; run `haven generate` first", store.display());
    };
    let fc = visible_collection(&set, groups)?;
    println!("{}", serde_json::to_string_pretty(&fc)?);
    Ok(())
}

/// FeatureCollection of the requested groups (all when `groups` is empty);
/// repeating a group does not hide it again.
fn visible_collection(set: &CandidateSet, groups: &[usize]) -> Result<serde_json::Value> {
    let mut wanted: Vec<usize> = if groups.is_empty() {
        (0..PALETTE_SIZE).collect()
    } else {
        groups.to_vec()
    };
    wanted.sort_unstable();
    wanted.dedup();
    let mut presenter = LayerPresenter::new();
    for g in wanted {
        if presenter.toggle(g).is_none() {
            bail!("unknown group {g}");
        }
    }
    let visible = presenter.visible_layers(set);
    Ok(candidate_collection(
        visible.iter().flat_map(|g| g.candidates.iter().copied()),
    ))
}

fn export(store: &Path, out: &Path) -> Result<()> {
    let cache = CandidateStore::new(FileStore::new(store));
    let Some(set) = cache.load() else {
        bail!("no cached candidates in {}", store.display());
    };
    let rows = export::write_candidates(&set, out)?;
    let record = Provenance::new(serde_json::json!({
        "rows": rows,
        "fingerprint": cache.stored_fingerprint().map(|f| f.0),
    }))
    .with_input(store);
    let sidecar = provenance::write_sidecar(out, record)?;
    tracing::info!(sidecar = %sidecar.display(), "provenance written");
    Ok(())
}

fn clear(store: &Path) -> Result<()> {
    let mut cache = CandidateStore::new(FileStore::new(store));
    cache
        .clear()
        .with_context(|| format!("clearing {}", store.display()))?;
    tracing::info!(store = %store.display(), "cache cleared");
    Ok(())
}

fn route(endpoint: &str, start: Point, end: Point) -> Result<()> {
    let client = RouteClient::new(endpoint)?;
    let request = PathRequest::new(start, end);
    let mut overlay = PathOverlay::new();
    let ticket = overlay.issue(&request);
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("starting async runtime")?;
    let outcome = runtime.block_on(client.shortest_path(&request));
    overlay.resolve(ticket, outcome)?;
    match overlay.to_geojson() {
        Some(feature) => println!("{}", serde_json::to_string_pretty(&feature)?),
        None => bail!("routing service returned no route"),
    }
    Ok(())
}

fn report() -> Result<()> {
    let record = Provenance::new(serde_json::json!({}));
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}
