//! CSV output sinks
//!
//! Each tab writes its attributed gaze to `tab-<id>/gazes.csv` and one
//! `aoi-<name>.csv` per AOI. A sink touches the filesystem only when its
//! first row is written or when it is finished, so tabs and AOIs that never
//! see gaze hold no open file. Numbers use Rust's shortest round-trip
//! formatting so identical input produces identical bytes.

use crate::types::{Result, WebAoiError};
use std::fmt::Display;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

/// Column headers of `gazes.csv`
pub const GAZE_COLUMNS: [&str; 7] = [
    "timestamp",
    "norm x",
    "norm y",
    "window x [px]",
    "window y [px]",
    "page x [px]",
    "page y [px]",
];

/// Column headers of `aoi-<name>.csv`
pub const AOI_COLUMNS: [&str; 5] = ["timestamp", "x norm", "y norm", "x [px]", "y [px]"];

/// Directory name for a tab's outputs
pub fn tab_dir_name(tab_id: usize) -> String {
    format!("tab-{}", tab_id)
}

/// File name of an AOI sink, with path separators neutralised
///
/// `duplicate` > 0 appends a numeric suffix for names that sanitise to an
/// already used file name.
pub fn aoi_file_name(aoi_name: &str, duplicate: usize) -> String {
    let safe: String = aoi_name
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | '\0') { '_' } else { c })
        .collect();
    match duplicate {
        0 => format!("aoi-{}.csv", safe),
        n => format!("aoi-{}-{}.csv", safe, n + 1),
    }
}

fn csv_error(e: csv::Error) -> WebAoiError {
    WebAoiError::IoError(e.into())
}

/// Append-only CSV file with a fixed header, opened on demand
pub struct CsvSink {
    path: PathBuf,
    columns: &'static [&'static str],
    writer: Option<csv::Writer<File>>,
    created: bool,
    rows_written: u64,
}

impl CsvSink {
    pub fn new(path: PathBuf, columns: &'static [&'static str]) -> Self {
        Self {
            path,
            columns,
            writer: None,
            created: false,
            rows_written: 0,
        }
    }

    /// Writer for the file, opened on first use
    fn writer(&mut self) -> Result<&mut csv::Writer<File>> {
        let writer = match self.writer.take() {
            Some(writer) => writer,
            None => self.open()?,
        };
        Ok(self.writer.insert(writer))
    }

    /// Create the file with its header, or reopen it for appending after a
    /// [`CsvSink::finish`]
    fn open(&mut self) -> Result<csv::Writer<File>> {
        let file = if self.created {
            OpenOptions::new().append(true).open(&self.path)?
        } else {
            log::debug!("Opening sink {:?}", self.path);
            if let Some(parent) = self.path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            File::create(&self.path)?
        };

        let mut writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(file);
        if !self.created {
            writer.write_record(self.columns).map_err(csv_error)?;
            self.created = true;
        }
        Ok(writer)
    }

    /// Append one row
    pub fn write_row(&mut self, timestamp: u64, values: &[f64]) -> Result<()> {
        let record = std::iter::once(timestamp.to_string())
            .chain(values.iter().map(|v| FormattedFloat(*v).to_string()));
        self.writer()?.write_record(record).map_err(csv_error)?;
        self.rows_written += 1;
        Ok(())
    }

    /// Make sure the file exists, flush it and release the file handle
    pub fn finish(&mut self) -> Result<()> {
        if !self.created {
            self.writer()?;
        }
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.writer.is_some()
    }

    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Float formatting that never prints `-0`
struct FormattedFloat(f64);

impl Display for FormattedFloat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0 == 0.0 {
            write!(f, "0")
        } else {
            write!(f, "{}", self.0)
        }
    }
}
