//! Report table assembly.
//!
//! Turns analyzed rows into the header and data rows written to CSV. Rows
//! without a send date (`N/A`) come first, then the rest by their
//! `YYYY-MM-DD` string, which sorts chronologically.

use serde::Serialize;

use crate::types::campaign::UNKNOWN_SEND_DATE;
use crate::{AnalyzedRow, MetricSelection};

/// Header of the leading date column.
pub const DATE_HEADER: &str = "Date";

/// A rendered report: one header row and one row per campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportTable {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl ReportTable {
    /// Assemble the table from analyzed rows and a metric selection.
    ///
    /// Each row holds the send date followed by the selected metrics in
    /// declared order.
    #[must_use]
    pub fn assemble(rows: &[AnalyzedRow], selection: &MetricSelection) -> Self {
        let header = std::iter::once(DATE_HEADER.to_string())
            .chain(selection.selected().map(crate::Metric::header))
            .collect();

        // Stable, so rows sharing a date keep their input order
        let mut sorted: Vec<&AnalyzedRow> = rows.iter().collect();
        sorted.sort_by(|a, b| date_key(a).cmp(&date_key(b)));

        let rows = sorted
            .into_iter()
            .map(|row| {
                std::iter::once(row.send_date.clone())
                    .chain(selection.selected().map(|m| row.metric(m).to_string()))
                    .collect()
            })
            .collect();

        Self { header, rows }
    }

    #[must_use]
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Data rows, sorted by send date.
    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Header followed by the data rows.
    pub fn records(&self) -> impl Iterator<Item = &[String]> {
        std::iter::once(self.header.as_slice()).chain(self.rows.iter().map(Vec::as_slice))
    }
}

/// Sort key placing rows without a send date ahead of every dated row.
fn date_key(row: &AnalyzedRow) -> (bool, &str) {
    (row.send_date != UNKNOWN_SEND_DATE, row.send_date.as_str())
}
