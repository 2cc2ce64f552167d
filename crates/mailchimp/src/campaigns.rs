//! Campaign Retriever.

use campaign_report_core::{Campaign, CampaignPage, DateRange};
use tracing::{info, instrument, warn};

use crate::client::Transport;
use crate::fetch::{FetchOutcome, ListRequest, OnFailure, RetryBudget, fetch_all};

/// Campaign listing endpoint.
pub const CAMPAIGNS_PATH: &str = "/campaigns";

/// Fetch every campaign sent within `range`, end date inclusive.
///
/// The listing gets its own retry budget. Any failure, including running out
/// of retries, yields an empty list since a partial listing has nothing
/// meaningful to report.
#[instrument(skip(transport, range), fields(start = %range.start(), end = %range.end()))]
pub async fn fetch_campaigns<T: Transport>(
    transport: &T,
    range: &DateRange,
    max_retries: u32,
) -> Vec<Campaign> {
    let request = ListRequest::new(CAMPAIGNS_PATH)
        .param("since_send_time", range.since_send_time_param())
        .param("before_send_time", range.before_send_time_param());
    let mut budget = RetryBudget::new(max_retries);

    let fetched = fetch_all::<CampaignPage, _>(transport, &request, &mut budget, OnFailure::Discard).await;
    match fetched.outcome {
        FetchOutcome::Complete => {
            info!(count = fetched.items.len(), "Fetched campaigns");
        }
        outcome => {
            warn!(?outcome, "Campaign listing failed, discarding results");
        }
    }
    fetched.items
}
