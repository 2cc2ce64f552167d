//! Click Analyzer.
//!
//! Fetches click details for each campaign in turn and tallies clicks on the
//! tracked ad URLs. One [`RetryBudget`] is shared by the whole run, so a
//! campaign that exhausts it leaves none for the campaigns after it.

use campaign_report_core::{
    AnalyzedRow, Campaign, CampaignId, ClickDetailsPage, ClickTally, RunTotals, TrackedUrls,
};
use tracing::{debug, instrument, warn};

use crate::client::Transport;
use crate::fetch::{ListRequest, OnFailure, RetryBudget, fetch_all};

/// Click-details endpoint for a campaign.
#[must_use]
pub fn click_details_path(campaign_id: &CampaignId) -> String {
    format!("/reports/{campaign_id}/click-details")
}

/// Result of analyzing a set of campaigns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClickAnalysis {
    /// One row per campaign with at least one matched click, in input order.
    pub rows: Vec<AnalyzedRow>,
    /// Opens and recipients over every analyzed campaign.
    pub totals: RunTotals,
}

/// Analyze every campaign's clicks against the tracked URLs.
///
/// Campaigns whose click fetch fails keep the clicks gathered before the
/// failure. Campaigns without matched clicks produce no row but still count
/// toward the totals.
#[instrument(skip_all, fields(campaigns = campaigns.len()))]
pub async fn analyze_clicks<T: Transport>(
    transport: &T,
    campaigns: &[Campaign],
    urls: &TrackedUrls,
    budget: &mut RetryBudget,
) -> ClickAnalysis {
    let mut analysis = ClickAnalysis::default();

    for campaign in campaigns {
        let tally = tally_campaign(transport, campaign, urls, budget).await;
        analysis.totals.add(campaign);

        match AnalyzedRow::from_tally(campaign, tally) {
            Some(row) => analysis.rows.push(row),
            None => debug!(campaign_id = %campaign.id, "No matched clicks, skipping row"),
        }
    }

    analysis
}

async fn tally_campaign<T: Transport>(
    transport: &T,
    campaign: &Campaign,
    urls: &TrackedUrls,
    budget: &mut RetryBudget,
) -> ClickTally {
    let request = ListRequest::new(click_details_path(&campaign.id));
    let fetched =
        fetch_all::<ClickDetailsPage, _>(transport, &request, budget, OnFailure::KeepPartial).await;

    if !fetched.is_complete() {
        warn!(
            campaign_id = %campaign.id,
            outcome = ?fetched.outcome,
            records = fetched.items.len(),
            "Click details incomplete, using partial counts"
        );
    }

    let mut tally = ClickTally::default();
    for click in &fetched.items {
        tally.record(urls, click);
    }

    debug!(
        campaign_id = %campaign.id,
        primary = tally.primary,
        secondary = tally.secondary,
        "Tallied clicks"
    );
    tally
}
