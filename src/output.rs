//! Output formatting and persistence for analysis results.
//!
//! Supports pretty-printing, JSON/HTML report artifacts, and CSV summary append.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::analyzers::types::Report;
use crate::render::render_html;
use crate::stats::ReportSummary;
use csv::WriterBuilder;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Paths of the artifacts written for one report.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifacts {
    pub json: PathBuf,
    pub html: PathBuf,
}

/// Logs a report using Rust's debug pretty-print format.
pub fn print_pretty(report: &Report) {
    debug!("{:#?}", report);
}

/// Serializes a report as pretty-printed JSON.
pub fn to_json(report: &Report) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// File stem `<VIN>_<YYYYmmdd_HHMMSS>` with unsafe VIN characters replaced by `-`.
pub fn artifact_stem(vin: &str, at: DateTime<Utc>) -> String {
    let vin_safe: String = vin
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                c
            } else {
                '-'
            }
        })
        .collect();
    let vin_safe = if vin_safe.is_empty() {
        "unknown".to_string()
    } else {
        vin_safe
    };
    format!("{}_{}", vin_safe, at.format("%Y%m%d_%H%M%S"))
}

/// Writes `<stem>.json` and `<stem>.html` for `report` into `out_dir`.
///
/// Creates `out_dir` if it does not already exist. Existing artifacts are never
/// overwritten: when the stem is taken, `-1`, `-2`, ... is appended until a free
/// pair of names is found.
pub fn write_artifacts(report: &Report, out_dir: &Path, at: DateTime<Utc>) -> Result<Artifacts> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create output directory {}", out_dir.display()))?;

    let stem = artifact_stem(&report.vehicle_info.vin, at);
    let (artifacts, mut json_file, mut html_file) = reserve_artifacts(out_dir, &stem)?;

    json_file
        .write_all(to_json(report)?.as_bytes())
        .with_context(|| format!("failed to write {}", artifacts.json.display()))?;
    html_file
        .write_all(render_html(report, at).as_bytes())
        .with_context(|| format!("failed to write {}", artifacts.html.display()))?;

    info!(json = %artifacts.json.display(), html = %artifacts.html.display(), "Report artifacts written");
    Ok(artifacts)
}

/// Atomically claims a `.json`/`.html` pair under `stem` or the first free suffixed stem.
fn reserve_artifacts(out_dir: &Path, stem: &str) -> Result<(Artifacts, File, File)> {
    let mut attempt = 0u32;
    loop {
        let candidate = if attempt == 0 {
            stem.to_string()
        } else {
            format!("{stem}-{attempt}")
        };
        attempt += 1;

        let json = out_dir.join(format!("{candidate}.json"));
        let Some(json_file) = create_new(&json)? else {
            continue;
        };

        let html = out_dir.join(format!("{candidate}.html"));
        match create_new(&html)? {
            Some(html_file) => return Ok((Artifacts { json, html }, json_file, html_file)),
            None => {
                debug!(path = %html.display(), "Artifact name taken, trying next suffix");
                std::fs::remove_file(&json)
                    .with_context(|| format!("failed to release {}", json.display()))?;
            }
        }
    }
}

/// Opens `path` for writing only if it does not exist yet. `None` when it does.
fn create_new(path: &Path) -> Result<Option<File>> {
    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => Ok(Some(file)),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(None),
        Err(e) => Err(e).with_context(|| format!("failed to create {}", path.display())),
    }
}

/// Appends a [`ReportSummary`] record as a row to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_record(path: &str, summary: &ReportSummary) -> Result<()> {
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, "Appending CSV record");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // IMPORTANT when appending
        .from_writer(file);

    writer.serialize(summary)?;
    writer.flush()?;

    Ok(())
}
