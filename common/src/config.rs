use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level harvest configuration, usually loaded from `config.yaml`.
///
/// Groups and inputs are ordered; every report and table follows this
/// ordering. Unknown fields are rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub name: String,
    #[serde(default)]
    pub settings: Settings,
    /// Benchmark groups, possibly hierarchical (`parent/phase`).
    pub groups: Vec<String>,
    /// Input sizes each group is measured at.
    pub inputs: Vec<u64>,
}

impl Config {
    /// Enumerate every (group, input) cell in the configured ordering.
    pub fn cells(&self) -> impl Iterator<Item = (&str, u64)> {
        self.groups
            .iter()
            .flat_map(|group| self.inputs.iter().map(move |n| (group.as_str(), *n)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Number of full benchmark passes to accumulate over.
    #[serde(default = "default_runs")]
    pub runs: usize,
    /// Upper bound on a single benchmark invocation, in seconds.
    #[serde(default = "default_run_timeout")]
    pub run_timeout: u64,
    /// External command performing one benchmark pass.
    #[serde(default)]
    pub command: RunCommand,
    /// Directory the benchmark framework writes raw results into.
    #[serde(default = "default_criterion_dir")]
    pub criterion_dir: PathBuf,
    #[serde(default = "default_dataset_out")]
    pub dataset_out: PathBuf,
    #[serde(default = "default_template")]
    pub template: PathBuf,
    #[serde(default = "default_report_out")]
    pub report_out: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            runs: default_runs(),
            run_timeout: default_run_timeout(),
            command: RunCommand::default(),
            criterion_dir: default_criterion_dir(),
            dataset_out: default_dataset_out(),
            template: default_template(),
            report_out: default_report_out(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunCommand {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for RunCommand {
    fn default() -> Self {
        RunCommand {
            program: "cargo".to_owned(),
            args: vec!["bench".to_owned()],
        }
    }
}

fn default_runs() -> usize {
    10
}

fn default_run_timeout() -> u64 {
    600
}

fn default_criterion_dir() -> PathBuf {
    PathBuf::from("target/criterion")
}

fn default_dataset_out() -> PathBuf {
    PathBuf::from("docs/benchmarks/data-raw-accumulated.json")
}

fn default_template() -> PathBuf {
    PathBuf::from("docs/benchmarks/index.html")
}

fn default_report_out() -> PathBuf {
    PathBuf::from("docs/benchmarks/report-inline.html")
}
