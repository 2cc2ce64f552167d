//! Click-detail records from a campaign's click report.

use serde::{Deserialize, Serialize};

use super::{CampaignId, ListPage};

/// Click totals for one URL in one campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickRecord {
    #[serde(default)]
    pub campaign_id: Option<CampaignId>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub total_clicks: u64,
}

/// One page of the click-details endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ClickDetailsPage {
    #[serde(default)]
    pub urls_clicked: Vec<ClickRecord>,
    #[serde(default)]
    pub total_items: u64,
}

impl ListPage for ClickDetailsPage {
    type Item = ClickRecord;

    fn total_items(&self) -> u64 {
        self.total_items
    }

    fn into_items(self) -> Vec<ClickRecord> {
        self.urls_clicked
    }
}
