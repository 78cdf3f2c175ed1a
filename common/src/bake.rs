use std::path::Path;

use eyre::Result;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{config::Config, error::CellError, estimates};

/// Insertion point: immediately before the dashboard's own logic that
/// declares the expected cell ordering.
pub const INLINE_MARKER: &str = "<script>\n      const GROUPS = [";

/// A successfully resolved cell, as embedded in the baked report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BakedRow {
    pub group: String,
    pub n: u64,
    pub mean: f64,
    pub lb: Option<f64>,
    pub ub: Option<f64>,
}

/// A cell that produced no usable estimate: the attempted location plus
/// the classified reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingCell {
    pub group: String,
    pub n: u64,
    pub path: String,
    pub error: String,
}

/// Resolve every configured cell to either a baked row or a missing
/// record. The two collections partition the cell space: no overlap, no
/// omission.
pub async fn resolve_cells(
    config: &Config,
    criterion_dir: &Path,
) -> (Vec<BakedRow>, Vec<MissingCell>) {
    let mut rows = Vec::new();
    let mut missing = Vec::new();
    for (group, n) in config.cells() {
        match estimates::load_estimate(criterion_dir, group, n).await {
            Ok(est) => rows.push(BakedRow {
                group: group.to_owned(),
                n,
                mean: est.mean,
                lb: est.lower_bound,
                ub: est.upper_bound,
            }),
            Err(err) => {
                if !matches!(err, CellError::Absent { .. }) {
                    warn!("{}: {err}", err.path().display());
                }
                missing.push(MissingCell {
                    group: group.to_owned(),
                    n,
                    path: err.path().display().to_string(),
                    error: err.to_string(),
                });
            }
        }
    }
    (rows, missing)
}

fn inline_script(rows: &[BakedRow], missing: &[MissingCell]) -> Result<String> {
    Ok(format!(
        "<script>\nwindow.__BENCH_DATA__ = {};\nwindow.__BENCH_MISSING__ = {};\n</script>\n",
        serde_json::to_string(rows)?,
        serde_json::to_string(missing)?
    ))
}

/// Splice the inline data into the template, producing an artifact that
/// renders with no live computation step.
///
/// When the marker is absent the data lands just before the closing body
/// boundary instead, so the artifact stays valid even if the template
/// structure has shifted.
pub fn splice_inline_data(
    template: &str,
    rows: &[BakedRow],
    missing: &[MissingCell],
) -> Result<String> {
    let script = inline_script(rows, missing)?;
    if template.contains(INLINE_MARKER) {
        Ok(template.replacen(INLINE_MARKER, &format!("{script}{INLINE_MARKER}"), 1))
    } else {
        Ok(template.replacen("</body>", &format!("{script}</body>"), 1))
    }
}
