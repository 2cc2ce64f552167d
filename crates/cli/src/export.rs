//! CSV export of an assembled report.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use campaign_report_core::{NewsletterCategory, ReportTable};
use chrono::NaiveDate;
use csv::WriterBuilder;
use thiserror::Error;

const CSV_EXTENSION: &str = ".csv";

/// Errors that can occur while writing a report file.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// Append `.csv` unless the name already ends with it.
#[must_use]
pub fn normalize_filename(name: &str) -> String {
    if name.ends_with(CSV_EXTENSION) {
        name.to_string()
    } else {
        format!("{name}{CSV_EXTENSION}")
    }
}

/// `<advertiser>-<newsletter>-<YYYY-MM-DD>.csv`, or without the advertiser
/// part when none was given. Path separators in either name become `_`.
#[must_use]
pub fn default_filename(
    advertiser: Option<&str>,
    category: &NewsletterCategory,
    date: NaiveDate,
) -> String {
    let date = date.format("%Y-%m-%d");
    let category = file_component(&category.to_string());
    match advertiser.filter(|a| !a.is_empty()) {
        Some(advertiser) => format!(
            "{}-{category}-{date}{CSV_EXTENSION}",
            file_component(advertiser)
        ),
        None => format!("{category}-{date}{CSV_EXTENSION}"),
    }
}

fn file_component(name: &str) -> String {
    name.replace(['/', '\\'], "_")
}

/// Write `table` to `dir/filename`, creating `dir` if needed.
///
/// # Errors
///
/// Returns `ExportError` if the directory or file cannot be created or a
/// record cannot be written.
pub fn write_report(table: &ReportTable, dir: &Path, filename: &str) -> Result<PathBuf, ExportError> {
    fs::create_dir_all(dir).map_err(|source| ExportError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let path = dir.join(filename);
    let file = File::create(&path).map_err(|source| ExportError::Io {
        path: path.clone(),
        source,
    })?;

    let mut writer = WriterBuilder::new().from_writer(BufWriter::new(file));
    for record in table.records() {
        writer.write_record(record)?;
    }
    writer.flush().map_err(|source| ExportError::Io {
        path: path.clone(),
        source,
    })?;

    Ok(path)
}
