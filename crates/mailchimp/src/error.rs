//! Errors raised by the Mailchimp HTTP adapter.

use thiserror::Error;

/// Errors that can occur when talking to the Mailchimp API.
///
/// These never escape the report pipeline: the paginated fetcher logs them
/// and stops the affected fetch.
#[derive(Debug, Error)]
pub enum MailchimpError {
    /// HTTP request failed (connection, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Request URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// API key cannot be used as a bearer credential.
    #[error("Invalid API key format: {0}")]
    InvalidApiKey(String),

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}
