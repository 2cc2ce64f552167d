//! Integration tests for Campaign Report.
//!
//! Provides [`MockMailchimp`], an in-process axum server that imitates the
//! two Mailchimp endpoints the report uses. It checks the bearer credential,
//! filters campaigns by `since_send_time`/`before_send_time`, paginates with
//! `offset`/`count`, and can be scripted to rate-limit or fail a path.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p campaign-report-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `client` - reqwest adapter against a real socket
//! - `pipeline` - retriever, analyzer and full report runs

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use campaign_report_core::Campaign;
use campaign_report_mailchimp::{ConfigError, MailchimpConfig};
use chrono::NaiveDateTime;
use serde_json::{Map, Value, json};
use tokio::net::TcpListener;

/// API key the mock accepts.
pub const TEST_API_KEY: &str = "3f9a1c7e5b2d4086af1e9c3b7d5a2e48-us6";

const API_ROOT: &str = "/3.0";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const DEFAULT_COUNT: usize = 10;

/// A request as the mock received it. `path` is relative to the API root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub path: String,
    pub query: HashMap<String, String>,
    pub authorization: Option<String>,
}

impl RecordedRequest {
    #[must_use]
    pub fn param(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy)]
struct RateLimit {
    remaining: u32,
    retry_after: Option<u64>,
}

/// Builder for a [`MockMailchimp`] server.
#[derive(Debug, Default)]
pub struct MockMailchimpBuilder {
    campaigns: Vec<Value>,
    clicks: HashMap<String, Vec<Value>>,
    rate_limits: HashMap<String, RateLimit>,
    failures: HashMap<String, StatusCode>,
}

impl MockMailchimpBuilder {
    /// Add a campaign in the listing's JSON shape.
    #[must_use]
    pub fn campaign(mut self, campaign: Value) -> Self {
        self.campaigns.push(campaign);
        self
    }

    /// Set the click-detail records for a campaign.
    #[must_use]
    pub fn clicks(mut self, campaign_id: &str, urls: &[(&str, u64)]) -> Self {
        let records = urls
            .iter()
            .map(|(url, total_clicks)| {
                json!({ "campaign_id": campaign_id, "url": url, "total_clicks": total_clicks })
            })
            .collect();
        self.clicks.insert(campaign_id.to_string(), records);
        self
    }

    /// Answer the next `times` requests to `path` with `429`.
    #[must_use]
    pub fn rate_limit(mut self, path: &str, times: u32, retry_after: Option<u64>) -> Self {
        self.rate_limits.insert(
            path.to_string(),
            RateLimit {
                remaining: times,
                retry_after,
            },
        );
        self
    }

    /// Answer every request to `path` with `status`.
    #[must_use]
    pub fn fail(mut self, path: &str, status: StatusCode) -> Self {
        self.failures.insert(path.to_string(), status);
        self
    }

    /// Bind to an ephemeral port and start serving.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn start(self) -> std::io::Result<MockMailchimp> {
        let state = Arc::new(MockState {
            expected_auth: format!("Bearer {TEST_API_KEY}"),
            campaigns: self.campaigns,
            clicks: self.clicks,
            rate_limits: Mutex::new(self.rate_limits),
            failures: self.failures,
            requests: Mutex::default(),
        });

        let app = Router::new()
            .route(&format!("{API_ROOT}/campaigns"), get(list_campaigns))
            .route(
                &format!("{API_ROOT}/reports/{{campaign_id}}/click-details"),
                get(click_details),
            )
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("Mock server stopped: {e}");
            }
        });

        Ok(MockMailchimp { addr, state })
    }
}

/// A running mock Mailchimp API.
#[derive(Debug, Clone)]
pub struct MockMailchimp {
    addr: SocketAddr,
    state: Arc<MockState>,
}

impl MockMailchimp {
    #[must_use]
    pub fn builder() -> MockMailchimpBuilder {
        MockMailchimpBuilder::default()
    }

    /// API root, as `MAILCHIMP_BASE_URL` would be set.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}{API_ROOT}", self.addr)
    }

    /// Client configuration pointing at this server with the accepted key.
    ///
    /// # Errors
    ///
    /// Returns an error if the test key is rejected.
    pub fn config(&self) -> Result<MailchimpConfig, ConfigError> {
        Ok(MailchimpConfig::from_api_key(TEST_API_KEY)?.with_base_url(self.base_url()))
    }

    /// Requests received so far, in arrival order.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state
            .requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Requests received for `path`.
    #[must_use]
    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.path == path)
            .collect()
    }
}

#[derive(Debug)]
struct MockState {
    expected_auth: String,
    campaigns: Vec<Value>,
    clicks: HashMap<String, Vec<Value>>,
    rate_limits: Mutex<HashMap<String, RateLimit>>,
    failures: HashMap<String, StatusCode>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockState {
    fn record(&self, request: RecordedRequest) {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);
    }

    /// `Some(retry_after)` if this request should be rate limited.
    fn take_rate_limit(&self, path: &str) -> Option<Option<u64>> {
        let mut limits = self
            .rate_limits
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let limit = limits.get_mut(path).filter(|limit| limit.remaining > 0)?;
        limit.remaining -= 1;
        Some(limit.retry_after)
    }

    /// Record the request and apply auth, scripted failures and rate limits.
    fn gate(
        &self,
        path: &str,
        headers: &HeaderMap,
        query: &HashMap<String, String>,
    ) -> Option<Response> {
        let authorization = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let authorized = authorization.as_deref() == Some(self.expected_auth.as_str());

        self.record(RecordedRequest {
            path: path.to_string(),
            query: query.clone(),
            authorization,
        });

        if !authorized {
            return Some(problem(StatusCode::UNAUTHORIZED, "API Key Invalid"));
        }
        if let Some(&status) = self.failures.get(path) {
            return Some(problem(status, "Scripted failure"));
        }
        if let Some(retry_after) = self.take_rate_limit(path) {
            let mut response = problem(StatusCode::TOO_MANY_REQUESTS, "Too Many Requests");
            if let Some(secs) = retry_after {
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(secs));
            }
            return Some(response);
        }
        None
    }
}

async fn list_campaigns(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if let Some(response) = state.gate("/campaigns", &headers, &query) {
        return response;
    }

    let since = timestamp_param(&query, "since_send_time");
    let before = timestamp_param(&query, "before_send_time");
    let matching: Vec<Value> = state
        .campaigns
        .iter()
        .filter(|campaign| sent_between(campaign, since, before))
        .cloned()
        .collect();

    page("campaigns", &matching, &query)
}

async fn click_details(
    State(state): State<Arc<MockState>>,
    Path(campaign_id): Path<String>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let path = format!("/reports/{campaign_id}/click-details");
    if let Some(response) = state.gate(&path, &headers, &query) {
        return response;
    }

    match state.clicks.get(&campaign_id) {
        Some(records) => page("urls_clicked", records, &query),
        None => problem(StatusCode::NOT_FOUND, "Resource Not Found"),
    }
}

/// One page of `items` in the provider's list envelope.
fn page(key: &str, items: &[Value], query: &HashMap<String, String>) -> Response {
    let offset = usize_param(query, "offset").unwrap_or(0);
    let count = usize_param(query, "count").unwrap_or(DEFAULT_COUNT);
    let slice: Vec<Value> = items.iter().skip(offset).take(count).cloned().collect();

    let mut body = Map::new();
    body.insert(key.to_string(), Value::Array(slice));
    body.insert("total_items".to_string(), json!(items.len()));
    Json(Value::Object(body)).into_response()
}

fn problem(status: StatusCode, title: &str) -> Response {
    (
        status,
        Json(json!({ "title": title, "status": status.as_u16() })),
    )
        .into_response()
}

fn usize_param(query: &HashMap<String, String>, key: &str) -> Option<usize> {
    query.get(key).and_then(|v| v.parse().ok())
}

fn timestamp_param(query: &HashMap<String, String>, key: &str) -> Option<NaiveDateTime> {
    query
        .get(key)
        .and_then(|v| NaiveDateTime::parse_from_str(v, TIMESTAMP_FORMAT).ok())
}

/// Both bounds inclusive. Unsent campaigns never match a time filter.
fn sent_between(
    campaign: &Value,
    since: Option<NaiveDateTime>,
    before: Option<NaiveDateTime>,
) -> bool {
    if since.is_none() && before.is_none() {
        return true;
    }
    let Some(sent_at) = serde_json::from_value::<Campaign>(campaign.clone())
        .ok()
        .and_then(|c| c.sent_at())
    else {
        return false;
    };
    since.is_none_or(|since| sent_at >= since) && before.is_none_or(|before| sent_at <= before)
}

/// A campaign in the listing's JSON shape.
#[must_use]
pub fn campaign_json(
    id: &str,
    title: &str,
    send_time: Option<&str>,
    emails_sent: u64,
    unique_opens: u64,
    opens: u64,
) -> Value {
    json!({
        "id": id,
        "settings": { "title": title },
        "send_time": send_time.unwrap_or_default(),
        "emails_sent": emails_sent,
        "report_summary": { "unique_opens": unique_opens, "opens": opens }
    })
}
