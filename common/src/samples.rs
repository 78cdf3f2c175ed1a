use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::CellError;

/// Raw measurement record one benchmark pass leaves behind for a cell.
///
/// The two sequences are parallel: `times[i]` nanoseconds spent on
/// `iters[i]` iterations.
#[derive(Debug, Deserialize)]
struct RawSample {
    iters: Vec<f64>,
    times: Vec<f64>,
}

/// Path of a cell's raw sample file under one run-lifecycle state.
pub fn sample_path(criterion_dir: &Path, group: &str, n: u64, state: &str) -> PathBuf {
    criterion_dir
        .join(group)
        .join(n.to_string())
        .join(state)
        .join("sample.json")
}

/// Read one raw sample file and normalize it to ns per iteration.
///
/// Absence is expected and silent. Unequal sequence lengths signal
/// corrupted input and are never truncated into a partial zip.
pub async fn read_samples(path: &Path) -> Result<Vec<f64>, CellError> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(CellError::Absent {
                path: path.to_path_buf(),
            });
        }
        Err(err) => {
            return Err(CellError::Malformed {
                path: path.to_path_buf(),
                detail: err.to_string(),
            });
        }
    };

    let parsed: RawSample = serde_json::from_str(&raw).map_err(|err| CellError::Malformed {
        path: path.to_path_buf(),
        detail: err.to_string(),
    })?;

    if parsed.times.len() != parsed.iters.len() {
        return Err(CellError::Malformed {
            path: path.to_path_buf(),
            detail: format!(
                "times/iters length mismatch ({} vs {})",
                parsed.times.len(),
                parsed.iters.len()
            ),
        });
    }
    if parsed.iters.iter().any(|iters| *iters <= 0.0) {
        return Err(CellError::Malformed {
            path: path.to_path_buf(),
            detail: "non-positive iteration count".to_owned(),
        });
    }

    Ok(parsed
        .times
        .iter()
        .zip(&parsed.iters)
        .map(|(time, iters)| time / iters)
        .collect())
}

/// Ordered-candidate search over run-lifecycle states.
///
/// The first state whose sample file exists decides the outcome; a
/// malformed file does not fall through to later states.
pub async fn locate_samples(
    criterion_dir: &Path,
    group: &str,
    n: u64,
    states: &[&str],
) -> Result<(PathBuf, Vec<f64>), CellError> {
    let mut first_attempt = None;
    for state in states {
        let path = sample_path(criterion_dir, group, n, state);
        match read_samples(&path).await {
            Ok(samples) => return Ok((path, samples)),
            Err(CellError::Absent { path }) => {
                first_attempt.get_or_insert(path);
            }
            Err(err) => return Err(err),
        }
    }
    Err(CellError::Absent {
        path: first_attempt.unwrap_or_else(|| sample_path(criterion_dir, group, n, "new")),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write_cell(root: &Path, group: &str, n: u64, state: &str, body: &str) -> PathBuf {
        let path = sample_path(root, group, n, state);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, body).unwrap();
        path
    }

    #[tokio::test]
    async fn normalizes_times_by_iters() {
        let dir = tempdir().unwrap();
        let path = write_cell(
            dir.path(),
            "hash",
            10,
            "new",
            r#"{"iters":[1.0,2.0,4.0],"times":[10.0,40.0,80.0]}"#,
        );
        let samples = read_samples(&path).await.unwrap();
        assert_eq!(samples, vec![10.0, 20.0, 20.0]);
    }

    #[tokio::test]
    async fn missing_file_is_absent() {
        let dir = tempdir().unwrap();
        let path = sample_path(dir.path(), "hash", 10, "new");
        let err = read_samples(&path).await.unwrap_err();
        assert!(matches!(err, CellError::Absent { .. }));
    }

    #[tokio::test]
    async fn invalid_json_is_malformed() {
        let dir = tempdir().unwrap();
        let path = write_cell(dir.path(), "hash", 10, "new", "{not json");
        let err = read_samples(&path).await.unwrap_err();
        assert!(matches!(err, CellError::Malformed { .. }));
    }

    #[tokio::test]
    async fn length_mismatch_is_malformed_not_truncated() {
        let dir = tempdir().unwrap();
        let path = write_cell(
            dir.path(),
            "hash",
            10,
            "new",
            r#"{"iters":[1.0,1.0,1.0,1.0],"times":[1.0,2.0,3.0,4.0,5.0]}"#,
        );
        let err = read_samples(&path).await.unwrap_err();
        match err {
            CellError::Malformed { detail, .. } => {
                assert!(detail.contains("length mismatch (5 vs 4)"), "{detail}");
            }
            other => panic!("expected Malformed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn zero_iteration_count_is_malformed() {
        let dir = tempdir().unwrap();
        let path = write_cell(
            dir.path(),
            "hash",
            10,
            "new",
            r#"{"iters":[1.0,0.0],"times":[1.0,2.0]}"#,
        );
        let err = read_samples(&path).await.unwrap_err();
        assert!(matches!(err, CellError::Malformed { .. }));
    }

    #[tokio::test]
    async fn empty_sequences_are_ok_and_empty() {
        let dir = tempdir().unwrap();
        let path = write_cell(dir.path(), "hash", 10, "new", r#"{"iters":[],"times":[]}"#);
        let samples = read_samples(&path).await.unwrap();
        assert!(samples.is_empty());
    }

    #[tokio::test]
    async fn locate_falls_back_to_later_state() {
        let dir = tempdir().unwrap();
        write_cell(
            dir.path(),
            "hash",
            10,
            "base",
            r#"{"iters":[2.0],"times":[10.0]}"#,
        );
        let (path, samples) = locate_samples(dir.path(), "hash", 10, &["new", "base"])
            .await
            .unwrap();
        assert!(path.ends_with("base/sample.json"));
        assert_eq!(samples, vec![5.0]);
    }

    #[tokio::test]
    async fn locate_first_existing_decides_even_if_malformed() {
        let dir = tempdir().unwrap();
        write_cell(dir.path(), "hash", 10, "new", "{corrupt");
        write_cell(
            dir.path(),
            "hash",
            10,
            "base",
            r#"{"iters":[1.0],"times":[1.0]}"#,
        );
        let err = locate_samples(dir.path(), "hash", 10, &["new", "base"])
            .await
            .unwrap_err();
        assert!(matches!(err, CellError::Malformed { .. }));
    }

    #[tokio::test]
    async fn locate_nothing_found_reports_first_attempt() {
        let dir = tempdir().unwrap();
        let err = locate_samples(dir.path(), "hash", 10, &["new", "base"])
            .await
            .unwrap_err();
        assert!(matches!(err, CellError::Absent { .. }));
        assert!(err.path().ends_with("new/sample.json"));
    }
}
