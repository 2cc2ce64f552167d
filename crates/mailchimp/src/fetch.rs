//! Offset pagination with rate-limit backoff.
//!
//! A [`ListRequest`] names an endpoint and its fixed query parameters;
//! [`fetch_all`] walks it page by page with `offset`/`count` until the
//! provider has nothing more to give. A `429` suspends for the provider's
//! `Retry-After` (60 seconds if absent) and reissues the same page, drawing
//! from a [`RetryBudget`] the caller owns. Any other failure ends the fetch.

use std::time::Duration;

use campaign_report_core::ListPage;
use reqwest::StatusCode;
use tracing::{debug, warn};

use crate::client::Transport;

/// Maximum items requested per page.
pub const PAGE_SIZE: u64 = 1000;

/// Wait applied when a `429` carries no `Retry-After` header.
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Default rate-limit retry budget.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// A bounded number of rate-limit retries.
///
/// The budget is not reset between fetches that share it: once spent, every
/// later `429` ends its fetch immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBudget {
    max_retries: u32,
    used: u32,
}

impl RetryBudget {
    #[must_use]
    pub const fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            used: 0,
        }
    }

    /// Take one retry from the budget. Returns `false` if none are left.
    pub const fn try_consume(&mut self) -> bool {
        if self.used >= self.max_retries {
            return false;
        }
        self.used += 1;
        true
    }

    /// Retries spent so far.
    #[must_use]
    pub const fn used(&self) -> u32 {
        self.used
    }

    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.max_retries.saturating_sub(self.used)
    }
}

impl Default for RetryBudget {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES)
    }
}

/// What a fetch returns when it cannot finish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnFailure {
    /// Drop everything gathered so far.
    Discard,
    /// Return the items gathered before the failure.
    KeepPartial,
}

/// How a fetch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// All pages were received.
    Complete,
    /// A `429` arrived with no retries left.
    RetriesExhausted,
    /// A non-retryable status, transport error or undecodable page.
    Failed,
}

/// Items returned by [`fetch_all`] and how the fetch ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched<T> {
    pub items: Vec<T>,
    pub outcome: FetchOutcome,
}

impl<T> Fetched<T> {
    fn stopped(items: Vec<T>, outcome: FetchOutcome, on_failure: OnFailure) -> Self {
        let items = match on_failure {
            OnFailure::Discard => Vec::new(),
            OnFailure::KeepPartial => items,
        };
        Self { items, outcome }
    }

    #[must_use]
    pub const fn is_complete(&self) -> bool {
        matches!(self.outcome, FetchOutcome::Complete)
    }
}

/// Endpoint and fixed query parameters of one logical list query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRequest {
    path: String,
    params: Vec<(&'static str, String)>,
}

impl ListRequest {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            params: Vec::new(),
        }
    }

    /// Add a fixed query parameter sent with every page.
    #[must_use]
    pub fn param(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.params.push((key, value.into()));
        self
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    fn page_query(&self, offset: u64) -> Vec<(&'static str, String)> {
        let mut query = self.params.clone();
        query.push(("offset", offset.to_string()));
        query.push(("count", PAGE_SIZE.to_string()));
        query
    }
}

/// Fetch every page of `request`, in provider order.
///
/// Stops when a page comes back empty or the accumulated count reaches the
/// page's `total_items`. Rate-limited pages are retried at the same offset
/// while `budget` lasts; when it runs out, or on any other failure, the
/// result follows `on_failure`.
pub async fn fetch_all<P, T>(
    transport: &T,
    request: &ListRequest,
    budget: &mut RetryBudget,
    on_failure: OnFailure,
) -> Fetched<P::Item>
where
    P: ListPage,
    T: Transport,
{
    let mut items: Vec<P::Item> = Vec::new();
    let mut offset: u64 = 0;

    loop {
        let query = request.page_query(offset);
        let reply = match transport.get(request.path(), &query).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(path = request.path(), offset, error = %e, "Request failed, stopping fetch");
                return Fetched::stopped(items, FetchOutcome::Failed, on_failure);
            }
        };

        match reply.status {
            StatusCode::OK => {
                let page: P = match serde_json::from_value(reply.body) {
                    Ok(page) => page,
                    Err(e) => {
                        warn!(path = request.path(), offset, error = %e, "Undecodable page, stopping fetch");
                        return Fetched::stopped(items, FetchOutcome::Failed, on_failure);
                    }
                };

                let total_items = page.total_items();
                let batch = page.into_items();
                let received = batch.len() as u64;
                items.extend(batch);

                debug!(
                    path = request.path(),
                    offset,
                    received,
                    accumulated = items.len(),
                    total_items,
                    "Fetched page"
                );

                if received == 0 || items.len() as u64 >= total_items {
                    return Fetched {
                        items,
                        outcome: FetchOutcome::Complete,
                    };
                }
                offset += received;
            }
            StatusCode::TOO_MANY_REQUESTS => {
                if !budget.try_consume() {
                    warn!(
                        path = request.path(),
                        offset,
                        retries_used = budget.used(),
                        "Rate limited with no retries left, stopping fetch"
                    );
                    return Fetched::stopped(items, FetchOutcome::RetriesExhausted, on_failure);
                }

                let wait = reply.retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS);
                warn!(
                    path = request.path(),
                    offset,
                    wait_secs = wait,
                    retries_left = budget.remaining(),
                    "Rate limited, backing off"
                );
                tokio::time::sleep(Duration::from_secs(wait)).await;
            }
            status => {
                warn!(
                    path = request.path(),
                    offset,
                    status = status.as_u16(),
                    "Unexpected status, stopping fetch"
                );
                return Fetched::stopped(items, FetchOutcome::Failed, on_failure);
            }
        }
    }
}


#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::testing::ScriptedTransport;
    use super::*;
    use crate::MailchimpError;
    use crate::client::ApiReply;
    use campaign_report_core::{Campaign, CampaignPage, ClickDetailsPage, ClickRecord};
    use serde_json::json;
    use tokio::time::Instant;

    fn campaign_page(ids: std::ops::Range<u64>, total_items: u64) -> ApiReply {
        let campaigns: Vec<_> = ids.map(|i| json!({ "id": format!("c{i}") })).collect();
        ApiReply::ok(json!({ "campaigns": campaigns, "total_items": total_items }))
    }

    fn click_page(urls: &[(&str, u64)], total_items: u64) -> ApiReply {
        let urls: Vec<_> = urls
            .iter()
            .map(|(url, clicks)| json!({ "url": url, "total_clicks": clicks }))
            .collect();
        ApiReply::ok(json!({ "urls_clicked": urls, "total_items": total_items }))
    }

    async fn fetch_campaigns(
        transport: &ScriptedTransport,
        budget: &mut RetryBudget,
        on_failure: OnFailure,
    ) -> Fetched<Campaign> {
        fetch_all::<CampaignPage, _>(transport, &ListRequest::new("/campaigns"), budget, on_failure)
            .await
    }

    #[tokio::test]
    async fn test_stops_at_total_items() {
        let transport = ScriptedTransport::new([
            campaign_page(0..1000, 3200),
            campaign_page(1000..2000, 3200),
            campaign_page(2000..3000, 3200),
            campaign_page(3000..3200, 3200),
        ]);
        let mut budget = RetryBudget::default();

        let fetched = fetch_campaigns(&transport, &mut budget, OnFailure::Discard).await;

        assert!(fetched.is_complete());
        assert_eq!(fetched.items.len(), 3200);
        assert_eq!(transport.requests().len(), 4);
        assert_eq!(fetched.items.last().unwrap().id.as_str(), "c3199");
    }

    #[tokio::test]
    async fn test_offsets_advance_by_items_received() {
        let transport = ScriptedTransport::new([
            campaign_page(0..1000, 2500),
            campaign_page(1000..1900, 2500),
            campaign_page(1900..2500, 2500),
        ]);
        let mut budget = RetryBudget::default();

        fetch_campaigns(&transport, &mut budget, OnFailure::Discard).await;

        let offsets: Vec<_> = (0..3)
            .filter_map(|i| transport.query_value(i, "offset"))
            .collect();
        assert_eq!(offsets, ["0", "1000", "1900"]);
        assert_eq!(transport.query_value(0, "count").as_deref(), Some("1000"));
    }

    #[tokio::test]
    async fn test_stops_on_empty_page() {
        let transport = ScriptedTransport::new([
            campaign_page(0..1000, 5000),
            campaign_page(0..0, 5000),
        ]);
        let mut budget = RetryBudget::default();

        let fetched = fetch_campaigns(&transport, &mut budget, OnFailure::Discard).await;

        assert!(fetched.is_complete());
        assert_eq!(fetched.items.len(), 1000);
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_fixed_params_sent_with_every_page() {
        let transport = ScriptedTransport::new([
            campaign_page(0..1000, 1500),
            campaign_page(1000..1500, 1500),
        ]);
        let request = ListRequest::new("/campaigns").param("since_send_time", "2024-03-01T00:00:00");
        let mut budget = RetryBudget::default();

        fetch_all::<CampaignPage, _>(&transport, &request, &mut budget, OnFailure::Discard).await;

        assert_eq!(
            transport.query_value(1, "since_send_time").as_deref(),
            Some("2024-03-01T00:00:00")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_backoff_then_success() {
        let transport = ScriptedTransport::new([
            ApiReply::rate_limited(Some(5)),
            ApiReply::rate_limited(Some(5)),
            campaign_page(0..10, 10),
        ]);
        let mut budget = RetryBudget::new(3);
        let started = Instant::now();

        let fetched = fetch_campaigns(&transport, &mut budget, OnFailure::Discard).await;

        assert!(fetched.is_complete());
        assert_eq!(fetched.items.len(), 10);
        assert_eq!(transport.requests().len(), 3);
        assert_eq!(budget.used(), 2);
        assert_eq!(started.elapsed().as_secs(), 10);
        // The retried page keeps its offset
        assert_eq!(transport.query_value(2, "offset").as_deref(), Some("0"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_retry_after_waits_sixty_seconds() {
        let transport = ScriptedTransport::new([ApiReply::rate_limited(None), campaign_page(0..1, 1)]);
        let mut budget = RetryBudget::default();
        let started = Instant::now();

        fetch_campaigns(&transport, &mut budget, OnFailure::Discard).await;

        assert_eq!(started.elapsed().as_secs(), DEFAULT_RETRY_AFTER_SECS);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_discard_campaigns() {
        let transport = ScriptedTransport::new([
            campaign_page(0..1000, 2000),
            ApiReply::rate_limited(Some(1)),
            ApiReply::rate_limited(Some(1)),
            ApiReply::rate_limited(Some(1)),
            ApiReply::rate_limited(Some(1)),
        ]);
        let mut budget = RetryBudget::new(3);

        let fetched = fetch_campaigns(&transport, &mut budget, OnFailure::Discard).await;

        assert_eq!(fetched.outcome, FetchOutcome::RetriesExhausted);
        assert!(fetched.items.is_empty());
        assert_eq!(transport.requests().len(), 5);
        assert_eq!(budget.remaining(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_keep_partial_clicks() {
        let transport = ScriptedTransport::new([
            click_page(&[("https://ad.example/a", 4)], 2),
            ApiReply::rate_limited(Some(1)),
        ]);
        let mut budget = RetryBudget::new(0);

        let fetched: Fetched<ClickRecord> = fetch_all::<ClickDetailsPage, _>(
            &transport,
            &ListRequest::new("/reports/c1/click-details"),
            &mut budget,
            OnFailure::KeepPartial,
        )
        .await;

        assert_eq!(fetched.outcome, FetchOutcome::RetriesExhausted);
        assert_eq!(fetched.items.len(), 1);
    }

    #[tokio::test]
    async fn test_other_status_stops_immediately() {
        let transport = ScriptedTransport::new([
            campaign_page(0..1000, 3000),
            ApiReply::status(StatusCode::INTERNAL_SERVER_ERROR),
            campaign_page(1000..2000, 3000),
        ]);
        let mut budget = RetryBudget::default();

        let discarded = fetch_campaigns(&transport, &mut budget, OnFailure::Discard).await;
        assert_eq!(discarded.outcome, FetchOutcome::Failed);
        assert!(discarded.items.is_empty());
        assert_eq!(transport.requests().len(), 2);
        assert_eq!(budget.used(), 0);
    }

    #[tokio::test]
    async fn test_other_status_keeps_partial() {
        let transport = ScriptedTransport::new([
            campaign_page(0..1000, 3000),
            ApiReply::status(StatusCode::SERVICE_UNAVAILABLE),
        ]);
        let mut budget = RetryBudget::default();

        let kept = fetch_campaigns(&transport, &mut budget, OnFailure::KeepPartial).await;
        assert_eq!(kept.outcome, FetchOutcome::Failed);
        assert_eq!(kept.items.len(), 1000);
    }

    #[tokio::test]
    async fn test_transport_error_stops_fetch() {
        let transport = ScriptedTransport::new([campaign_page(0..1000, 2000)]);
        transport.push_error(MailchimpError::Parse("connection reset".to_string()));
        let mut budget = RetryBudget::default();

        let fetched = fetch_campaigns(&transport, &mut budget, OnFailure::KeepPartial).await;

        assert_eq!(fetched.outcome, FetchOutcome::Failed);
        assert_eq!(fetched.items.len(), 1000);
    }

    #[tokio::test]
    async fn test_undecodable_page_stops_fetch() {
        let transport = ScriptedTransport::new([ApiReply::ok(json!({ "campaigns": "nope" }))]);
        let mut budget = RetryBudget::default();

        let fetched = fetch_campaigns(&transport, &mut budget, OnFailure::Discard).await;

        assert_eq!(fetched.outcome, FetchOutcome::Failed);
        assert!(fetched.items.is_empty());
    }

    #[test]
    fn test_retry_budget() {
        let mut budget = RetryBudget::new(2);
        assert!(budget.try_consume());
        assert!(budget.try_consume());
        assert!(!budget.try_consume());
        assert_eq!(budget.used(), 2);
        assert_eq!(budget.remaining(), 0);
    }
}
