//! Output formatting and persistence for reports and run statistics.
//!
//! Supports table logging, JSON printing, report CSV export (optionally
//! gzip-compressed) and CSV append for the stats history.

use anyhow::Result;
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::analyzers::filters::BorderlineRange;
use crate::analyzers::types::{Report, ReportKind};
use crate::stats::ReportStats;
use csv::WriterBuilder;

/// Rows shown by [`print_table`].
pub const PREVIEW_ROWS: usize = 100;

/// Logs run statistics using Rust's debug pretty-print format.
pub fn print_pretty(stats: &ReportStats) {
    debug!("{:#?}", stats);
}

/// Prints any serializable value as pretty JSON on stdout.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Logs up to `limit` rows of a report.
pub fn print_table(title: &str, report: &Report, limit: usize) {
    if report.is_empty() {
        info!(title, "No rows");
        return;
    }

    info!(title, rows = report.len(), "{}", report.header().join(" | "));
    for record in report.records().iter().take(limit) {
        info!(title, "{}", record.join(" | "));
    }
    if report.len() > limit {
        info!(title, hidden = report.len() - limit, "Rows truncated");
    }
}

/// Renders a report as UTF-8 CSV bytes.
pub fn report_to_csv(report: &Report) -> Result<Vec<u8>> {
    let mut writer = WriterBuilder::new().from_writer(Vec::new());
    writer.write_record(report.header())?;
    for record in report.records() {
        writer.write_record(&record)?;
    }
    writer.flush()?;
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(bytes)
}

fn format_bound(value: f64) -> String {
    value.to_string().replace('.', "_")
}

/// File name a report is exported under.
pub fn report_file_name(kind: ReportKind, range: BorderlineRange) -> String {
    match kind {
        ReportKind::Failures => "failed_students.csv".to_string(),
        ReportKind::TeeBorderline => format!(
            "tee_{}_{}.csv",
            format_bound(range.low),
            format_bound(range.high)
        ),
        ReportKind::FinalBorderline => format!(
            "final_{}_{}.csv",
            format_bound(range.low),
            format_bound(range.high)
        ),
    }
}

/// Deletes `path` if it exists.
fn remove_stale(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!(path = %path.display(), "Removed stale report");
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Writes a report into `dir`. Empty reports are not written and return
/// `None`; a file left under the same name by an earlier run is removed.
///
/// With `gzip`, a compressed `.csv.gz` copy is written next to the CSV.
/// Without it, any `.csv.gz` from an earlier run is removed.
pub fn write_report(
    dir: &Path,
    report: &Report,
    range: BorderlineRange,
    gzip: bool,
) -> Result<Option<PathBuf>> {
    let path = dir.join(report_file_name(report.kind, range));
    let mut gz_path = path.clone().into_os_string();
    gz_path.push(".gz");
    let gz_path = PathBuf::from(gz_path);

    if report.is_empty() {
        match report.kind {
            ReportKind::Failures => info!("All students passed, no failure report written"),
            kind => info!(?kind, "No borderline students, report not written"),
        }
        remove_stale(&path)?;
        remove_stale(&gz_path)?;
        return Ok(None);
    }

    fs::create_dir_all(dir)?;
    let bytes = report_to_csv(report)?;
    fs::write(&path, &bytes)?;

    if gzip {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&bytes)?;
        let compressed = encoder.finish()?;

        fs::write(&gz_path, compressed)?;
        debug!(path = %gz_path.display(), "Wrote compressed report");
    } else {
        remove_stale(&gz_path)?;
    }

    info!(path = %path.display(), rows = report.len(), "Wrote report");
    Ok(Some(path))
}

/// Appends a [`ReportStats`] record as a row to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_record(path: &str, stats: &ReportStats) -> Result<()> {
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, "Appending CSV record");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // header only on the first append
        .from_writer(file);

    writer.serialize(stats)?;
    writer.flush()?;

    Ok(())
}
