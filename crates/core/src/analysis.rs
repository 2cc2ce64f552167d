//! Tracked ad URLs and per-campaign derived metrics.
//!
//! A report tracks one or two ad links. Every click-detail record whose URL
//! contains a tracked substring adds its clicks to that link's counter; a URL
//! containing both substrings counts toward both.

use serde::{Deserialize, Serialize};

use crate::metrics::{Metric, MetricValue};
use crate::{Campaign, ClickRecord};

/// Errors that can occur when building [`TrackedUrls`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackedUrlsError {
    /// The primary ad URL is empty and would match every link.
    #[error("primary ad URL cannot be empty")]
    EmptyPrimary,
}

/// The one or two ad URL substrings a report counts clicks for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedUrls {
    primary: String,
    secondary: Option<String>,
}

impl TrackedUrls {
    /// Create the tracked URL set. An empty secondary URL means "none".
    ///
    /// # Errors
    ///
    /// Returns [`TrackedUrlsError::EmptyPrimary`] if `primary` is empty.
    pub fn new(
        primary: impl Into<String>,
        secondary: Option<String>,
    ) -> Result<Self, TrackedUrlsError> {
        let primary = primary.into();
        if primary.is_empty() {
            return Err(TrackedUrlsError::EmptyPrimary);
        }
        Ok(Self {
            primary,
            secondary: secondary.filter(|url| !url.is_empty()),
        })
    }

    #[must_use]
    pub fn primary(&self) -> &str {
        &self.primary
    }

    #[must_use]
    pub fn secondary(&self) -> Option<&str> {
        self.secondary.as_deref()
    }
}

/// Matched click counters for one campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClickTally {
    pub primary: u64,
    pub secondary: u64,
}

impl ClickTally {
    /// Add a click-detail record to whichever counters its URL matches.
    pub fn record(&mut self, urls: &TrackedUrls, click: &ClickRecord) {
        if click.url.contains(urls.primary()) {
            self.primary = self.primary.saturating_add(click.total_clicks);
        }
        if urls.secondary().is_some_and(|second| click.url.contains(second)) {
            self.secondary = self.secondary.saturating_add(click.total_clicks);
        }
    }

    /// Sum of both counters.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.primary.saturating_add(self.secondary)
    }
}

/// Matched clicks per hundred unique opens.
///
/// Defined as zero when there were no unique opens.
#[must_use]
#[allow(clippy::cast_precision_loss)] // Counts stay far below 2^52
pub fn click_through_rate(total_clicks: u64, unique_opens: u64) -> f64 {
    if unique_opens == 0 {
        return 0.0;
    }
    total_clicks as f64 / unique_opens as f64 * 100.0
}

/// One report row: a campaign that had at least one matched ad click.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedRow {
    /// `YYYY-MM-DD`, or `N/A` for campaigns without a send time.
    pub send_date: String,
    pub unique_opens: u64,
    pub total_opens: u64,
    pub total_recipients: u64,
    pub total_clicks: u64,
    pub ctr: f64,
}

impl AnalyzedRow {
    /// Build the row for a campaign, or `None` if nothing matched.
    #[must_use]
    pub fn from_tally(campaign: &Campaign, tally: ClickTally) -> Option<Self> {
        let total_clicks = tally.total();
        if total_clicks == 0 {
            return None;
        }
        Some(Self {
            send_date: campaign.send_date_label(),
            unique_opens: campaign.unique_opens(),
            total_opens: campaign.total_opens(),
            total_recipients: campaign.recipients(),
            total_clicks,
            ctr: click_through_rate(total_clicks, campaign.unique_opens()),
        })
    }

    /// Value of a metric column for this row.
    #[must_use]
    pub const fn metric(&self, metric: Metric) -> MetricValue {
        match metric {
            Metric::UniqueOpens => MetricValue::Count(self.unique_opens),
            Metric::TotalOpens => MetricValue::Count(self.total_opens),
            Metric::TotalRecipients => MetricValue::Count(self.total_recipients),
            Metric::TotalClicks => MetricValue::Count(self.total_clicks),
            Metric::Ctr => MetricValue::Rate(self.ctr),
        }
    }
}

/// Totals over every analyzed campaign, whether or not it produced a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RunTotals {
    pub grand_total_opens: u64,
    pub total_recipients: u64,
}

impl RunTotals {
    /// Add a campaign's opens and recipients.
    pub const fn add(&mut self, campaign: &Campaign) {
        self.grand_total_opens = self.grand_total_opens.saturating_add(campaign.total_opens());
        self.total_recipients = self.total_recipients.saturating_add(campaign.recipients());
    }
}
