use std::path::{Path, PathBuf};

use thiserror::Error;

/// Why a cell yielded no usable data.
///
/// Only [`CellError::Absent`] is benign; callers log every other variant
/// to the diagnostic stream before treating the cell as absent. None of
/// these abort a session.
#[derive(Debug, Clone, Error)]
pub enum CellError {
    /// No candidate file exists for the cell.
    #[error("not found")]
    Absent { path: PathBuf },
    /// A file exists but could not be read, parsed, or validated.
    #[error("parse error: {detail}")]
    Malformed { path: PathBuf, detail: String },
    /// A file exists and parses but lacks the primary point estimate.
    #[error("missing mean.point_estimate")]
    MissingStatistic { path: PathBuf },
}

impl CellError {
    /// The location that was attempted for the cell.
    pub fn path(&self) -> &Path {
        match self {
            CellError::Absent { path }
            | CellError::Malformed { path, .. }
            | CellError::MissingStatistic { path } => path,
        }
    }
}
