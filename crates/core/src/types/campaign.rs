//! Campaign records from the provider's campaign listing.
//!
//! Only the fields the report needs are modeled. Missing numeric fields
//! default to zero and a missing or empty `send_time` becomes `None`, so a
//! partially populated campaign never fails to decode.

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

use super::{CampaignId, ListPage};

/// Date label used for campaigns without a usable send time.
pub const UNKNOWN_SEND_DATE: &str = "N/A";

/// A sent (or scheduled) email campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: CampaignId,
    #[serde(default)]
    pub settings: CampaignSettings,
    /// ISO-8601 send timestamp, absent for campaigns that were never sent.
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub send_time: Option<String>,
    #[serde(default)]
    pub emails_sent: u64,
    #[serde(default)]
    pub report_summary: ReportSummary,
}

/// Campaign settings. The title is what newsletter categories match against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CampaignSettings {
    #[serde(default)]
    pub title: String,
}

/// Summary statistics the provider attaches to a sent campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ReportSummary {
    #[serde(default)]
    pub unique_opens: u64,
    /// Total opens, including repeat opens by the same subscriber.
    #[serde(default)]
    pub opens: u64,
}

impl Campaign {
    /// Campaign title from its settings.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.settings.title
    }

    #[must_use]
    pub const fn unique_opens(&self) -> u64 {
        self.report_summary.unique_opens
    }

    #[must_use]
    pub const fn total_opens(&self) -> u64 {
        self.report_summary.opens
    }

    /// Number of recipients the campaign was sent to.
    #[must_use]
    pub const fn recipients(&self) -> u64 {
        self.emails_sent
    }

    /// Send time as a wall-clock timestamp in the offset the provider reported.
    ///
    /// Accepts RFC 3339 timestamps (`2024-03-10T14:00:00+00:00`) and naive
    /// ISO-8601 timestamps without an offset. Returns `None` when the send
    /// time is absent or cannot be parsed.
    #[must_use]
    pub fn sent_at(&self) -> Option<NaiveDateTime> {
        let raw = self.send_time.as_deref()?;
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.naive_local())
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f"))
            .ok()
    }

    /// Send date formatted as `YYYY-MM-DD`, or `N/A` without a send time.
    #[must_use]
    pub fn send_date_label(&self) -> String {
        self.sent_at().map_or_else(
            || UNKNOWN_SEND_DATE.to_string(),
            |sent| sent.date().format("%Y-%m-%d").to_string(),
        )
    }
}

/// One page of the campaign listing endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct CampaignPage {
    #[serde(default)]
    pub campaigns: Vec<Campaign>,
    #[serde(default)]
    pub total_items: u64,
}

impl ListPage for CampaignPage {
    type Item = Campaign;

    fn total_items(&self) -> u64 {
        self.total_items
    }

    fn into_items(self) -> Vec<Campaign> {
        self.campaigns
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}
