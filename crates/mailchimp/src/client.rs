//! HTTP adapter for the Mailchimp Marketing API.

use std::future::Future;
use std::sync::Arc;

use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue, RETRY_AFTER};
use serde_json::Value;
use tracing::instrument;
use url::Url;

use crate::MailchimpError;
use crate::config::MailchimpConfig;

/// A decoded API reply: status, optional `Retry-After` seconds and JSON body.
///
/// Non-JSON bodies (typically on error statuses) decode to `Value::Null`.
#[derive(Debug, Clone)]
pub struct ApiReply {
    pub status: StatusCode,
    pub retry_after: Option<u64>,
    pub body: Value,
}

impl ApiReply {
    /// A `200 OK` reply carrying `body`.
    #[must_use]
    pub const fn ok(body: Value) -> Self {
        Self {
            status: StatusCode::OK,
            retry_after: None,
            body,
        }
    }

    /// A `429 Too Many Requests` reply.
    #[must_use]
    pub const fn rate_limited(retry_after: Option<u64>) -> Self {
        Self {
            status: StatusCode::TOO_MANY_REQUESTS,
            retry_after,
            body: Value::Null,
        }
    }

    /// A reply with an arbitrary status and no body.
    #[must_use]
    pub const fn status(status: StatusCode) -> Self {
        Self {
            status,
            retry_after: None,
            body: Value::Null,
        }
    }
}

/// Issues GET requests against the versioned API.
///
/// `path` is relative to the API root (e.g. `/campaigns`). The production
/// implementation is [`MailchimpClient`]; tests substitute scripted replies.
pub trait Transport {
    /// Send a GET request and return the reply, whatever its status.
    ///
    /// # Errors
    ///
    /// Returns an error only when no HTTP reply could be obtained or a
    /// successful reply body is not valid JSON.
    fn get(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> impl Future<Output = Result<ApiReply, MailchimpError>> + Send;
}

/// Mailchimp Marketing API client.
///
/// Every request carries `Authorization: Bearer <api key>`.
#[derive(Clone)]
pub struct MailchimpClient {
    inner: Arc<MailchimpClientInner>,
}

struct MailchimpClientInner {
    client: reqwest::Client,
    base_url: String,
    data_center: String,
}

impl MailchimpClient {
    /// Create a new Mailchimp API client.
    ///
    /// # Errors
    ///
    /// Returns error if the API key is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &MailchimpConfig) -> Result<Self, MailchimpError> {
        let mut headers = HeaderMap::new();

        let mut auth_value = HeaderValue::from_str(&config.bearer())
            .map_err(|e| MailchimpError::InvalidApiKey(e.to_string()))?;
        auth_value.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_value);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(MailchimpClientInner {
                client,
                base_url: config.base_url.clone(),
                data_center: config.data_center.clone(),
            }),
        })
    }

    fn url(&self, path: &str, query: &[(&str, String)]) -> Result<Url, MailchimpError> {
        let mut url = Url::parse(&format!("{}{path}", self.inner.base_url))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }
}

impl Transport for MailchimpClient {
    #[instrument(skip(self, query), fields(dc = %self.inner.data_center))]
    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<ApiReply, MailchimpError> {
        let url = self.url(path, query)?;
        let response = self.inner.client.get(url).send().await?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse().ok());

        let body = if status == StatusCode::OK {
            response
                .json()
                .await
                .map_err(|e| MailchimpError::Parse(format!("Failed to parse response: {e}")))?
        } else {
            let text = response.text().await.unwrap_or_default();
            serde_json::from_str(&text).unwrap_or(Value::Null)
        };

        Ok(ApiReply {
            status,
            retry_after,
            body,
        })
    }
}

impl std::fmt::Debug for MailchimpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailchimpClient")
            .field("base_url", &self.inner.base_url)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client() -> MailchimpClient {
        let config = MailchimpConfig::from_api_key("3f9a1c7e5b2d4086af1e9c3b7d5a2e48-us6").unwrap();
        MailchimpClient::new(&config).unwrap()
    }

    #[test]
    fn test_url_appends_query() {
        let url = client()
            .url(
                "/campaigns",
                &[
                    ("since_send_time", "2024-03-01T00:00:00".to_string()),
                    ("count", "1000".to_string()),
                ],
            )
            .unwrap();

        assert_eq!(
            url.as_str(),
            "https://us6.api.mailchimp.com/3.0/campaigns?since_send_time=2024-03-01T00%3A00%3A00&count=1000"
        );
    }

    #[test]
    fn test_url_without_query() {
        let url = client().url("/reports/abc/click-details", &[]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://us6.api.mailchimp.com/3.0/reports/abc/click-details"
        );
    }

    #[test]
    fn test_debug_hides_credentials() {
        let debug_output = format!("{:?}", client());
        assert!(debug_output.contains("us6.api.mailchimp.com"));
        assert!(!debug_output.contains("3f9a1c7e"));
    }
}
