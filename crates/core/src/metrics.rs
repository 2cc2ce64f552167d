//! Report metric columns and the ordered metric selection.

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`MetricSelection`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MetricSelectionError {
    /// A metric name is not one of the known report columns.
    #[error("unknown metric '{0}'. Valid metrics: unique_opens, total_opens, total_recipients, total_clicks, ctr")]
    UnknownMetric(String),
    /// A metric was listed more than once.
    #[error("metric '{0}' listed more than once")]
    Duplicate(String),
    /// No metric was listed.
    #[error("at least one metric must be selected")]
    Empty,
}

/// A per-campaign report column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    UniqueOpens,
    TotalOpens,
    TotalRecipients,
    TotalClicks,
    /// Click-through rate.
    Ctr,
}

impl Metric {
    /// All metrics in their default column order.
    pub const ALL: [Self; 5] = [
        Self::UniqueOpens,
        Self::TotalOpens,
        Self::TotalRecipients,
        Self::TotalClicks,
        Self::Ctr,
    ];

    /// Snake-case key of the metric.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::UniqueOpens => "unique_opens",
            Self::TotalOpens => "total_opens",
            Self::TotalRecipients => "total_recipients",
            Self::TotalClicks => "total_clicks",
            Self::Ctr => "ctr",
        }
    }

    /// Column header: the key with underscores replaced by spaces, title-cased.
    #[must_use]
    pub fn header(self) -> String {
        title_case(&self.key().replace('_', " "))
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Metric {
    type Err = MetricSelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|metric| metric.key() == key)
            .ok_or_else(|| MetricSelectionError::UnknownMetric(s.trim().to_owned()))
    }
}

/// Value of one metric for one report row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    Count(u64),
    Rate(f64),
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count(count) => write!(f, "{count}"),
            Self::Rate(rate) => write!(f, "{rate}"),
        }
    }
}

/// Ordered mapping from metric to inclusion flag.
///
/// The declared order is the column order; only metrics flagged `true`
/// appear in the report.
///
/// ## Examples
///
/// ```
/// use campaign_report_core::{Metric, MetricSelection};
///
/// let selection = MetricSelection::from_flags([
///     (Metric::UniqueOpens, true),
///     (Metric::Ctr, false),
///     (Metric::TotalClicks, true),
/// ]);
/// let columns: Vec<_> = selection.selected().collect();
/// assert_eq!(columns, [Metric::UniqueOpens, Metric::TotalClicks]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricSelection {
    flags: Vec<(Metric, bool)>,
}

impl MetricSelection {
    /// Build a selection from `(metric, include)` pairs in column order.
    ///
    /// A metric listed twice keeps its first position and its last flag.
    #[must_use]
    pub fn from_flags(flags: impl IntoIterator<Item = (Metric, bool)>) -> Self {
        let mut selection = Self { flags: Vec::new() };
        for (metric, include) in flags {
            selection.set(metric, include);
        }
        selection
    }

    /// Set the inclusion flag for a metric, appending it if not yet declared.
    pub fn set(&mut self, metric: Metric, include: bool) {
        match self.flags.iter_mut().find(|(m, _)| *m == metric) {
            Some((_, flag)) => *flag = include,
            None => self.flags.push((metric, include)),
        }
    }

    /// Included metrics in declared order.
    pub fn selected(&self) -> impl Iterator<Item = Metric> + '_ {
        self.flags
            .iter()
            .filter(|(_, include)| *include)
            .map(|&(metric, _)| metric)
    }

    /// Declared `(metric, include)` pairs in order.
    #[must_use]
    pub fn flags(&self) -> &[(Metric, bool)] {
        &self.flags
    }
}

impl Default for MetricSelection {
    /// Every metric, in default column order.
    fn default() -> Self {
        Self::from_flags(Metric::ALL.map(|metric| (metric, true)))
    }
}

impl FromStr for MetricSelection {
    type Err = MetricSelectionError;

    /// Parse a comma-separated list such as `unique_opens,total_clicks`.
    ///
    /// Listed metrics are included in the given order; the rest are declared
    /// after them as excluded.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut listed: Vec<Metric> = Vec::new();
        for part in s.split(',').filter(|p| !p.trim().is_empty()) {
            let metric: Metric = part.parse()?;
            if listed.contains(&metric) {
                return Err(MetricSelectionError::Duplicate(metric.key().to_owned()));
            }
            listed.push(metric);
        }

        if listed.is_empty() {
            return Err(MetricSelectionError::Empty);
        }

        let excluded = Metric::ALL
            .into_iter()
            .filter(|metric| !listed.contains(metric))
            .map(|metric| (metric, false));
        Ok(Self::from_flags(
            listed.iter().map(|&metric| (metric, true)).chain(excluded),
        ))
    }
}

/// Capitalize the first letter of every word and lowercase the rest.
///
/// A word is a run of alphabetic characters.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}
