use std::path::PathBuf;

use clap::{Parser, Subcommand};
use common::{
    bake,
    config::Config,
    dataset::{self, SummaryRow},
    error::CellError,
    samples, stats,
};
use eyre::{Context, Result};
use tokio::fs::{create_dir_all, read_to_string, write};
use tracing::{error, warn};
use tracing_subscriber::{
    EnvFilter,
    fmt::{layer, time::ChronoLocal},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

mod bench;

#[derive(Parser)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    #[arg(long, default_value_t = false)]
    no_progress: bool,
    #[arg(short, long)]
    log: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Accumulate raw samples over repeated benchmark runs
    Bench {
        #[arg(short, long, default_value = "config.yaml")]
        config_file: String,
    },
    /// Print a median table from the latest raw samples, without running
    Report {
        #[arg(short, long, default_value = "config.yaml")]
        config_file: String,
    },
    /// Bake estimates into a self-contained report
    Bake {
        #[arg(short, long, default_value = "config.yaml")]
        config_file: String,
        /// Template override
        #[arg(long)]
        template: Option<PathBuf>,
        /// Output path override
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let log_level = std::env::var("RUST_LOG").unwrap_or("warn".to_owned());
    let args = Cli::parse();
    let file_appender = tracing_appender::rolling::never(".", "log.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let mut env_filter =
        EnvFilter::new(format!("bench_harvest={log_level},common={log_level}"));
    for log in &args.log {
        env_filter = env_filter.add_directive(log.parse()?);
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            layer()
                .with_timer(ChronoLocal::new("%v %k:%M:%S %z".to_owned()))
                .with_writer(std::io::stderr)
                .compact(),
        )
        .with(layer().with_writer(non_blocking))
        .init();

    match args.command {
        Commands::Bench { config_file } => {
            if let Err(err) = bench::run_benchmark(config_file, args.no_progress).await {
                error!("{err:#?}");
                return Err(err);
            }
        }
        Commands::Report { config_file } => report(&config_file).await?,
        Commands::Bake {
            config_file,
            template,
            out,
        } => {
            if let Err(err) = bake_report(&config_file, template, out).await {
                error!("{err:#?}");
                return Err(err);
            }
        }
    };

    Ok(())
}

async fn load_config(path: &str) -> Result<Config> {
    let raw = read_to_string(path)
        .await
        .context(format!("Read config {path}"))?;
    serde_yml::from_str(&raw).context(format!("Parse config {path}"))
}

/// Median table from the latest raw samples, preferring a fresh `new`
/// result over the `base` it would be compared against.
async fn report(config_file: &str) -> Result<()> {
    let config = load_config(config_file).await?;
    let criterion_dir = &config.settings.criterion_dir;

    let mut rows = Vec::new();
    for (group, n) in config.cells() {
        match samples::locate_samples(criterion_dir, group, n, &["new", "base"]).await {
            Ok((_, samples_ns)) => {
                if let Some(median_ns) = stats::median(&samples_ns) {
                    rows.push(SummaryRow {
                        group: group.to_owned(),
                        n,
                        median_ns,
                        samples: samples_ns.len(),
                    });
                }
            }
            Err(CellError::Absent { .. }) => {}
            Err(err) => warn!("{}: {err}", err.path().display()),
        }
    }

    print!(
        "{}",
        dataset::summary_table("Median from latest run", &rows)
    );
    Ok(())
}

async fn bake_report(
    config_file: &str,
    template: Option<PathBuf>,
    out: Option<PathBuf>,
) -> Result<()> {
    let config = load_config(config_file).await?;
    let template_path = template.unwrap_or_else(|| config.settings.template.clone());
    let out_path = out.unwrap_or_else(|| config.settings.report_out.clone());

    let html = read_to_string(&template_path)
        .await
        .context(format!("Template not found: {}", template_path.display()))?;

    let (rows, missing) = bake::resolve_cells(&config, &config.settings.criterion_dir).await;
    let baked = bake::splice_inline_data(&html, &rows, &missing)?;

    if let Some(parent) = out_path.parent()
        && !parent.as_os_str().is_empty()
    {
        create_dir_all(parent).await?;
    }
    write(&out_path, baked)
        .await
        .context(format!("Write report {}", out_path.display()))?;
    println!(
        "[bake] Wrote {} ({} cells, {} missing)",
        out_path.display(),
        rows.len(),
        missing.len()
    );
    Ok(())
}
