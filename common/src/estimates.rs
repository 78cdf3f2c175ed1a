use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::CellError;

/// Run-lifecycle states searched for a summarization artifact, in
/// priority order.
pub const STATES: [&str; 3] = ["new", "base", "change"];

#[derive(Debug, Deserialize)]
struct Estimates {
    /// Older framework versions capitalized the key.
    #[serde(alias = "Mean")]
    mean: Option<Estimate>,
}

#[derive(Debug, Deserialize)]
struct Estimate {
    point_estimate: Option<f64>,
    confidence_interval: Option<ConfidenceInterval>,
}

#[derive(Debug, Deserialize)]
struct ConfidenceInterval {
    lower_bound: Option<f64>,
    upper_bound: Option<f64>,
}

/// A validated point estimate for one cell.
#[derive(Debug, Clone, PartialEq)]
pub struct CellEstimate {
    /// File the estimate was read from.
    pub path: PathBuf,
    pub mean: f64,
    pub lower_bound: Option<f64>,
    pub upper_bound: Option<f64>,
}

/// Path of a cell's summarization artifact under one state.
pub fn estimates_path(criterion_dir: &Path, group: &str, n: u64, state: &str) -> PathBuf {
    criterion_dir
        .join(group)
        .join(n.to_string())
        .join(state)
        .join("estimates.json")
}

/// Load the first existing summarization artifact for a cell.
///
/// The mean is required; confidence bounds are optional. Failures are
/// classified so the caller can tell absent from malformed from
/// missing-statistic.
pub async fn load_estimate(
    criterion_dir: &Path,
    group: &str,
    n: u64,
) -> Result<CellEstimate, CellError> {
    for state in STATES {
        let path = estimates_path(criterion_dir, group, n, state);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
            Err(err) => {
                return Err(CellError::Malformed {
                    path,
                    detail: err.to_string(),
                });
            }
        };

        let parsed: Estimates =
            serde_json::from_str(&raw).map_err(|err| CellError::Malformed {
                path: path.clone(),
                detail: err.to_string(),
            })?;

        let Some(mean) = parsed.mean else {
            return Err(CellError::MissingStatistic { path });
        };
        let Some(point_estimate) = mean.point_estimate else {
            return Err(CellError::MissingStatistic { path });
        };
        let ci = mean.confidence_interval;
        return Ok(CellEstimate {
            path,
            mean: point_estimate,
            lower_bound: ci.as_ref().and_then(|ci| ci.lower_bound),
            upper_bound: ci.as_ref().and_then(|ci| ci.upper_bound),
        });
    }
    Err(CellError::Absent {
        path: estimates_path(criterion_dir, group, n, "new"),
    })
}
