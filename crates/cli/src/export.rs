use anyhow::{bail, Context, Result};
use haven::placement::CandidateSet;
use polars::prelude::*;
use std::fs::{self, File};
use std::path::Path;

/// One row per candidate: hazard id, group, color, center, radius.
pub fn candidates_frame(set: &CandidateSet) -> PolarsResult<DataFrame> {
    let hazard: Vec<String> = set.iter().map(|c| c.source_hazard_id.0.clone()).collect();
    let group: Vec<u32> = set.iter().map(|c| c.group as u32).collect();
    let color: Vec<&str> = set.iter().map(|c| c.color().hex()).collect();
    let x: Vec<f64> = set.iter().map(|c| c.center.x).collect();
    let y: Vec<f64> = set.iter().map(|c| c.center.y).collect();
    let radius: Vec<f64> = set.iter().map(|c| c.radius).collect();
    df!(
        "hazard" => hazard,
        "group" => group,
        "color" => color,
        "center_x" => x,
        "center_y" => y,
        "radius" => radius
    )
}

/// Write `set` as CSV or Parquet, chosen by the extension of `out`.
pub fn write_candidates(set: &CandidateSet, out: &Path) -> Result<usize> {
    let mut df = candidates_frame(set)?;
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    let ext = out
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let file = || File::create(out).with_context(|| format!("creating {}", out.display()));
    match ext.as_deref() {
        Some("csv") => {
            CsvWriter::new(file()?).finish(&mut df)?;
        }
        Some("parquet") => {
            ParquetWriter::new(file()?).finish(&mut df)?;
        }
        _ => bail!(
            "unsupported export format {}; use .csv or .parquet",
            out.display()
        ),
    }
    tracing::info!(rows = df.height(), out = %out.display(), "candidates exported");
    Ok(df.height())
}

#[cfg(test)]
mod tests {
    use super::*;
    use haven::geom::{Geometry, GeometryOps};
    use haven::placement::{Candidate, HazardId};
    use nalgebra::vector;
    use tempfile::tempdir;

    fn set() -> CandidateSet {
        let g = Geometry::planar();
        (0..4)
            .map(|i| {
                let center = vector![i as f64, 2.0 * i as f64];
                Candidate {
                    source_hazard_id: HazardId(format!("h{i}")),
                    center,
                    radius: 15.0,
                    group: i % 3,
                    geometry: g.circle(center, 15.0, 8),
                }
            })
            .collect()
    }

    #[test]
    fn frame_has_one_row_per_candidate() {
        let df = candidates_frame(&set()).unwrap();
        assert_eq!(df.shape(), (4, 6));
        let colors = df.column("color").unwrap().str().unwrap();
        assert_eq!(colors.get(3), Some("#FF6347"));
    }

    #[test]
    fn csv_export_writes_header_and_rows() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("nested/c.csv");
        assert_eq!(write_candidates(&set(), &out).unwrap(), 4);
        let text = fs::read_to_string(&out).unwrap();
        assert!(text.starts_with("hazard,group,color,center_x,center_y,radius"));
        assert_eq!(text.lines().count(), 5);
    }

    #[test]
    fn parquet_export_and_unknown_extension() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("c.parquet");
        write_candidates(&set(), &out).unwrap();
        assert!(fs::metadata(&out).unwrap().len() > 0);
        assert!(write_candidates(&set(), &dir.path().join("c.xlsx")).is_err());
    }
}
