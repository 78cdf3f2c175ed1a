use std::{path::Path, time::Duration};

use common::{
    config::{Config, Settings},
    dataset::{self, RunChunk},
    error::CellError,
    samples,
};
use console::style;
use eyre::{Context, Result, bail};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::{
    fs::{create_dir_all, read_to_string, write},
    process::Command,
    time::timeout,
};
use tracing::{debug, warn};

/// One full aggregation session: R sequential runs, each followed by a
/// harvest of every configured cell's fresh samples.
///
/// A failed run aborts the session, but whatever was accumulated from
/// prior runs is flushed to the dataset artifact first.
pub async fn run_benchmark(config_file: String, no_progress: bool) -> Result<()> {
    let config: Config = serde_yml::from_str(
        &read_to_string(&config_file)
            .await
            .context(format!("Read config {config_file}"))?,
    )
    .context(format!("Parse config {config_file}"))?;
    let settings = config.settings.clone();

    println!("Accumulating {} over {} runs...", config.name, settings.runs);

    let progress = if no_progress {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(settings.runs as u64)
    };
    progress.set_style(ProgressStyle::with_template(
        "[{bar:30}] run {pos}/{len} {msg}",
    )?);

    let mut accumulated: Vec<RunChunk> = Vec::new();
    let mut session_err = None;
    for run in 1..=settings.runs {
        progress.set_message(format!("running {}", settings.command.program));
        if let Err(err) = invoke_run(&settings).await {
            session_err = Some(err);
            break;
        }
        collect_run(&config, run, &mut accumulated).await;
        progress.inc(1);
    }
    progress.finish_and_clear();

    flush_dataset(&settings.dataset_out, &accumulated).await?;
    println!(
        "Saved accumulated data to {}",
        settings.dataset_out.display()
    );

    if let Some(err) = session_err {
        return Err(err);
    }

    let rows = dataset::summarize(&config, &accumulated);
    print!(
        "\n{}",
        dataset::summary_table(&format!("Median of {} runs", settings.runs), &rows)
    );
    println!("\n{}", style("Done.").green());
    Ok(())
}

/// One external benchmark pass. The child inherits stdio so the
/// benchmark's own progress stays visible.
async fn invoke_run(settings: &Settings) -> Result<()> {
    let mut child = Command::new(&settings.command.program)
        .args(&settings.command.args)
        .spawn()
        .context(format!("Spawn benchmark run {}", settings.command.program))?;

    let status = match timeout(Duration::from_secs(settings.run_timeout), child.wait()).await {
        Ok(status) => status?,
        Err(_) => {
            child.kill().await?;
            bail!("Benchmark run exceeded {}s timeout", settings.run_timeout);
        }
    };

    if !status.success() {
        bail!("Benchmark run {} exited with {status}", settings.command.program);
    }
    Ok(())
}

/// Harvest every configured cell's fresh samples after one run.
///
/// Absent cells are skipped silently; anything else gets a diagnostic
/// and never aborts the session.
async fn collect_run(config: &Config, run: usize, accumulated: &mut Vec<RunChunk>) {
    for (group, n) in config.cells() {
        let path = samples::sample_path(&config.settings.criterion_dir, group, n, "new");
        match samples::read_samples(&path).await {
            Ok(samples_ns) => {
                debug!("run={run} group={group} n={n} samples={}", samples_ns.len());
                accumulated.push(RunChunk {
                    group: group.to_owned(),
                    n,
                    run,
                    samples_ns,
                });
            }
            Err(CellError::Absent { .. }) => {}
            Err(err) => warn!("{}: {err}", err.path().display()),
        }
    }
}

async fn flush_dataset(out: &Path, accumulated: &[RunChunk]) -> Result<()> {
    if let Some(parent) = out.parent()
        && !parent.as_os_str().is_empty()
    {
        create_dir_all(parent).await?;
    }
    write(out, serde_json::to_string(accumulated)?)
        .await
        .context(format!("Write dataset {}", out.display()))?;
    Ok(())
}
