use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{config::Config, stats};

/// One run's worth of normalized samples for a single cell, tagged with
/// its provenance so the raw data stays traceable to its origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunChunk {
    pub group: String,
    pub n: u64,
    /// 1-based index of the run that produced these samples.
    pub run: usize,
    pub samples_ns: Vec<f64>,
}

/// Summary of one cell after pooling every run's samples.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub group: String,
    pub n: u64,
    pub median_ns: f64,
    pub samples: usize,
}

/// Pool accumulated chunks per cell and reduce each pool to its median.
///
/// Cells with zero pooled samples are omitted; rows follow the
/// configured cell ordering.
pub fn summarize(config: &Config, chunks: &[RunChunk]) -> Vec<SummaryRow> {
    let mut pooled: HashMap<(&str, u64), Vec<f64>> = HashMap::new();
    for chunk in chunks {
        pooled
            .entry((chunk.group.as_str(), chunk.n))
            .or_default()
            .extend_from_slice(&chunk.samples_ns);
    }

    config
        .cells()
        .filter_map(|(group, n)| {
            let samples = pooled.get(&(group, n))?;
            let median_ns = stats::median(samples)?;
            Some(SummaryRow {
                group: group.to_owned(),
                n,
                median_ns,
                samples: samples.len(),
            })
        })
        .collect()
}

/// Render summary rows as the markdown table printed on stdout.
pub fn summary_table(title: &str, rows: &[SummaryRow]) -> String {
    let mut out = format!("### Benchmark Results ({title})\n\n");
    out.push_str("| Group | Input (n) | Median Time | Samples |\n");
    out.push_str("| :--- | :--- | :--- | :--- |\n");
    for row in rows {
        out.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            row.group,
            row.n,
            stats::fmt_ns(row.median_ns),
            row.samples
        ));
    }
    out
}
