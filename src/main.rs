//! Course sentiment grader: binary entrypoint.
//! Reads a course-comment sheet, grades it and writes the report.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use course_sentiment::config::load_config_default;
use course_sentiment::{FileReportRenderer, Pipeline, ReportContext, ReportRenderer};

#[derive(Debug, Parser)]
#[command(name = "course-sentiment", version, about = "Grade course reviews by sentiment")]
struct Cli {
    /// Spreadsheet (.xlsx/.xls/.ods) or CSV export with the comments.
    data_file: PathBuf,
    /// Course name used in the report title and file names.
    course_name: String,
    /// Pipeline config (TOML or JSON).
    #[arg(long, env = "COURSE_SENTIMENT_CONFIG")]
    config: Option<PathBuf>,
    /// Where the report files go; overrides `report.out_dir`.
    #[arg(long)]
    out_dir: Option<PathBuf>,
}

/// Logs go to stderr so stdout only carries the result.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("course_sentiment=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if e.use_stderr() => {
            let _ = e.print();
            return ExitCode::from(1);
        }
        Err(e) => {
            // --help / --version
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
    };

    // Load .env in local/dev; no-op otherwise.
    let _ = dotenvy::dotenv();
    init_tracing();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %format!("{e:#}"), "grading failed");
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut cfg = load_config_default(cli.config.as_deref()).context("loading config")?;
    if let Some(dir) = cli.out_dir {
        cfg.report.out_dir = dir;
    }

    let pipeline = Pipeline::from_config(&cfg)?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling");
            on_signal.cancel();
        }
    });

    info!(file = %cli.data_file.display(), course = %cli.course_name, "grading");
    let report = pipeline
        .run_sheet(&cli.data_file, &cfg.sheet, cancel)
        .await?;

    let renderer = FileReportRenderer::new(&cfg.report.out_dir, cfg.report.chart_file.as_str());
    let ctx = ReportContext::today(&cli.course_name, &cfg.report.author, &report);
    let artifacts = renderer.render(&ctx)?;

    println!("{}", report.aggregate.star_score);
    if !report.failed.is_empty() {
        println!("untranslated comments skipped: {}", report.failed.len());
    }
    println!("chart: {}", artifacts.chart.display());
    println!("report: {}", artifacts.pdf.display());
    println!("markdown: {}", artifacts.narrative.display());
    println!("summary: {}", artifacts.summary.display());
    Ok(())
}
