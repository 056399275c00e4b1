//! CLI entry point for the battery health tool.
//!
//! Provides subcommands for analyzing a single telemetry log (from a file or
//! URL), analyzing a directory of logs concurrently, and printing the
//! effective thresholds.

use anyhow::{Context, Result, bail};
use battery_health::analyzers::types::Report;
use battery_health::analyzers::{AnalysisError, analyze_log};
use battery_health::analyzers::normalize::normalize_log;
use battery_health::config::AnalysisConfig;
use battery_health::{
    fetch::{ApiKey, BasicClient, fetch_bytes, is_remote},
    output::{append_record, print_pretty, to_json, write_artifacts},
    parser::parse_raw,
    stats::ReportSummary,
};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;
use tracing::{error, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "battery_health")]
#[command(about = "Derive EV battery SoH, cycle counts and anomalies from telemetry logs", long_about = None)]
struct Cli {
    /// JSON file overriding analysis thresholds
    #[arg(long, global = true, env = "BATTERY_HEALTH_CONFIG")]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a telemetry log from a file or URL
    Analyze {
        /// Path to file or URL to fetch
        #[arg(value_name = "FILE_OR_URL")]
        source: String,

        /// Directory for the JSON and HTML report artifacts
        #[arg(short, long, default_value = "report_outputs")]
        out_dir: PathBuf,

        /// CSV file to append a summary row to
        #[arg(short, long)]
        summary: Option<String>,

        /// Only print the report, write no artifacts
        #[arg(long, default_value_t = false)]
        no_artifacts: bool,
    },
    /// Analyze every *.json log in a directory
    Batch {
        /// Directory containing log files
        #[arg(value_name = "DIR")]
        input_dir: PathBuf,

        /// Directory for the JSON and HTML report artifacts
        #[arg(short, long, default_value = "report_outputs")]
        out_dir: PathBuf,

        /// CSV file to append one summary row per log to
        #[arg(short, long, default_value = "batch_summary.csv")]
        summary: String,

        /// Maximum number of logs analyzed at once
        #[arg(short, long, default_value_t = 4)]
        concurrency: usize,
    },
    /// Print the effective analysis thresholds as JSON
    ShowConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/battery_health.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("battery_health.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Analyze {
            source,
            out_dir,
            summary,
            no_artifacts,
        } => {
            let out_dir = (!no_artifacts).then_some(out_dir);
            analyze_source(&source, &config, out_dir.as_deref(), summary.as_deref()).await?;
        }
        Commands::Batch {
            input_dir,
            out_dir,
            summary,
            concurrency,
        } => {
            batch(&input_dir, &out_dir, &summary, concurrency, config).await?;
        }
        Commands::ShowConfig => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

fn load_config(path: Option<&str>) -> Result<AnalysisConfig> {
    match path {
        Some(path) => {
            let config = AnalysisConfig::load(path)?;
            info!(path, "Loaded analysis thresholds");
            Ok(config)
        }
        None => Ok(AnalysisConfig::default()),
    }
}

/// Loads log data from a local file path or fetches it over HTTP.
///
/// `TELEMETRY_API_KEY`, when set, is sent as a bearer token.
#[tracing::instrument]
async fn fetcher(source: &str) -> Result<Vec<u8>> {
    let bytes = if is_remote(source) {
        match std::env::var("TELEMETRY_API_KEY") {
            Ok(key) => fetch_bytes(&ApiKey::bearer(BasicClient::new(), &key)?, source).await?,
            Err(_) => fetch_bytes(&BasicClient::new(), source).await?,
        }
    } else {
        std::fs::read(source).with_context(|| format!("failed to read log file '{source}'"))?
    };
    Ok(bytes)
}

/// Parses, validates and analyzes raw log bytes. Returns the report and sample count.
fn run_analysis(bytes: &[u8], config: &AnalysisConfig) -> Result<(Report, usize), AnalysisError> {
    let raw = parse_raw(bytes)?;
    let log = normalize_log(&raw)?;
    Ok((analyze_log(&log, config), log.samples.len()))
}

/// Analyzes a single log, prints the report JSON to stdout, and writes artifacts.
#[tracing::instrument(skip(config, out_dir, summary))]
async fn analyze_source(
    source: &str,
    config: &AnalysisConfig,
    out_dir: Option<&Path>,
    summary: Option<&str>,
) -> Result<()> {
    let started = Instant::now();
    let bytes = fetcher(source).await?;

    let (report, samples) = match run_analysis(&bytes, config) {
        Ok(result) => result,
        Err(e) => {
            error!(error = %e, "Log rejected");
            if let Some(path) = summary {
                let row = ReportSummary::from_error(e.kind(), &e.to_string()).with_source(source);
                append_record(path, &row)?;
            }
            return Err(e.into());
        }
    };

    print_pretty(&report);
    println!("{}", to_json(&report)?);

    if let Some(out_dir) = out_dir {
        write_artifacts(&report, out_dir, Utc::now())?;
    }
    if let Some(path) = summary {
        append_record(path, &ReportSummary::from_report(&report, samples).with_source(source))?;
    }

    info!(
        records = samples,
        elapsed_ms = started.elapsed().as_millis() as u64,
        soh = ?report.soh,
        anomalies = report.anomalies.total(),
        "Analysis complete"
    );
    Ok(())
}

/// Analyzes every `*.json` file in `input_dir`, at most `concurrency` at a time.
///
/// A failing file produces an error row in the summary instead of aborting the batch.
#[tracing::instrument(skip_all, fields(input_dir = %input_dir.display(), concurrency = concurrency))]
async fn batch(
    input_dir: &Path,
    out_dir: &Path,
    summary: &str,
    concurrency: usize,
    config: AnalysisConfig,
) -> Result<()> {
    if concurrency == 0 {
        bail!("concurrency must be at least 1");
    }

    let mut paths: Vec<PathBuf> = std::fs::read_dir(input_dir)
        .with_context(|| format!("failed to read directory {}", input_dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("json"))
        .collect();
    paths.sort();

    info!(files = paths.len(), "Starting batch analysis");

    let semaphore = Arc::new(tokio::sync::Semaphore::new(concurrency));
    let mut tasks = vec![];

    for path in paths {
        let sem = semaphore.clone();
        let out_dir = out_dir.to_path_buf();
        let source = path.display().to_string();
        let span = tracing::info_span!("analyze_file", file = %source);

        let task = tokio::spawn(
            async move {
                let _permit = sem.acquire_owned().await?;
                let summary = tokio::task::spawn_blocking(move || {
                    analyze_file(&path, &config, &out_dir)
                })
                .await?;
                anyhow::Ok(summary)
            }
            .instrument(span),
        );
        tasks.push((source, task));
    }

    let started = Instant::now();
    let mut failed = 0;
    let mut total = 0;

    // Wait for all tasks in spawn order so the CSV follows file order
    for (source, task) in tasks {
        let row = batch_row(&source, task.await);
        if row.error_type.is_some() {
            failed += 1;
        }
        total += 1;
        append_record(summary, &row)?;
    }

    info!(
        total,
        failed,
        elapsed_ms = started.elapsed().as_millis() as u64,
        summary,
        "Batch analysis finished"
    );
    Ok(())
}

/// Turns a joined batch task into its summary row, tagged with the file it analyzed.
fn batch_row(
    source: &str,
    joined: Result<Result<ReportSummary>, tokio::task::JoinError>,
) -> ReportSummary {
    let row = match joined {
        Ok(Ok(row)) => row,
        Ok(Err(e)) => {
            error!(file = source, error = %e, "Batch task failed");
            ReportSummary::from_error("task_error", &e.to_string())
        }
        Err(e) => {
            error!(file = source, error = %e, "Batch task panicked");
            ReportSummary::from_error("task_error", &e.to_string())
        }
    };
    row.with_source(source)
}

/// Blocking per-file work for [`batch`]. Never fails; errors become summary rows.
fn analyze_file(path: &Path, config: &AnalysisConfig, out_dir: &Path) -> ReportSummary {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(error = %e, "Failed to read log");
            return ReportSummary::from_error("io_error", &e.to_string());
        }
    };

    let (report, samples) = match run_analysis(&bytes, config) {
        Ok(result) => result,
        Err(e) => {
            warn!(error = %e, "Log rejected");
            return ReportSummary::from_error(e.kind(), &e.to_string());
        }
    };

    if let Err(e) = write_artifacts(&report, out_dir, Utc::now()) {
        error!(error = %e, "Failed to write artifacts");
        return ReportSummary::from_error("write_error", &format!("{e:#}"));
    }

    ReportSummary::from_report(&report, samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_batch_row_failed_task_keeps_source() {
        let joined =
            tokio::spawn(async { Err::<ReportSummary, _>(anyhow::anyhow!("semaphore closed")) }).await;
        let row = batch_row("logs/vin1.json", joined);

        assert_eq!(row.source.as_deref(), Some("logs/vin1.json"));
        assert_eq!(row.error_type.as_deref(), Some("task_error"));
        assert_eq!(row.error_message.as_deref(), Some("semaphore closed"));
    }

    #[tokio::test]
    async fn test_batch_row_panicked_task_keeps_source() {
        let handle: tokio::task::JoinHandle<Result<ReportSummary>> =
            tokio::spawn(async { panic!("worker died") });
        let joined = handle.await;
        let row = batch_row("logs/vin2.json", joined);

        assert_eq!(row.source.as_deref(), Some("logs/vin2.json"));
        assert_eq!(row.error_type.as_deref(), Some("task_error"));
    }

    #[test]
    fn test_batch_row_success_gets_source() {
        let row = batch_row("logs/vin3.json", Ok(Ok(ReportSummary::default())));
        assert_eq!(row.source.as_deref(), Some("logs/vin3.json"));
        assert!(row.error_type.is_none());
    }
}
