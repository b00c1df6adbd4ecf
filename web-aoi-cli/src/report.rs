//! Run summary reporting
//!
//! Prints the [`ProcessingSummary`] of a run and writes it next to the CSV
//! outputs as `summary.json`.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use web_aoi_processor::ProcessingSummary;

pub const SUMMARY_FILE: &str = "summary.json";

/// Contents of `summary.json`
#[derive(Debug, Serialize)]
pub struct SummaryReport<'a> {
    pub processor_version: &'a str,
    pub generated_at: DateTime<Utc>,
    pub recording: &'a Path,
    #[serde(flatten)]
    pub summary: &'a ProcessingSummary,
}

/// Write `summary.json` into `output_dir` and return its path
pub fn write_summary_json(
    summary: &ProcessingSummary,
    recording: &Path,
    output_dir: &Path,
) -> Result<PathBuf> {
    let path = output_dir.join(SUMMARY_FILE);
    let report = SummaryReport {
        processor_version: web_aoi_processor::VERSION,
        generated_at: Utc::now(),
        recording,
        summary,
    };

    let file =
        File::create(&path).with_context(|| format!("Failed to create {:?}", path))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &report)
        .with_context(|| format!("Failed to write {:?}", path))?;

    log::debug!("Summary written to {:?}", path);
    Ok(path)
}

fn format_timestamp(timestamp: Option<DateTime<Utc>>) -> String {
    timestamp
        .map(|t| t.format("%Y-%m-%d %H:%M:%S%.3f UTC").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Print a human readable summary to stdout
pub fn print_summary(summary: &ProcessingSummary) {
    println!("\n📊 Processing Summary:");
    println!("  Frames:         {}", summary.frames_processed);
    println!("  Tabs:           {}", summary.tabs);
    println!(
        "  Gaze samples:   {} ({} attributed, {:.1}%)",
        summary.gaze_samples,
        summary.gaze_rows,
        summary.attribution_rate() * 100.0
    );
    if summary.trailing_gaze_dropped > 0 {
        println!("  Dropped after last frame: {}", summary.trailing_gaze_dropped);
    }
    println!("  AOI hits:       {}", summary.aoi_hits);
    println!(
        "  Events:         {} applied, {} dropped, {} unknown",
        summary.events_applied, summary.events_dropped, summary.events_unknown
    );
    println!(
        "  Surfaces:       {} established, {} replaced",
        summary.surfaces_established, summary.surfaces_replaced
    );
    println!("  First gaze:     {}", format_timestamp(summary.first_gaze));
    println!("  Last gaze:      {}", format_timestamp(summary.last_gaze));
}
