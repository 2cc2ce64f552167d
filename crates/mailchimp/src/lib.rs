//! Campaign Report Mailchimp - Provider client and report pipeline.
//!
//! Talks to the Mailchimp Marketing API v3 over plain REST:
//! - `GET /campaigns` filtered by send time
//! - `GET /reports/{campaign_id}/click-details`
//!
//! # Architecture
//!
//! Network access goes through the [`Transport`] trait. [`MailchimpClient`]
//! implements it with reqwest; everything above it (pagination, backoff,
//! click analysis and the pipeline) is generic over the transport and never
//! returns transport errors to the caller. Failures are logged and end the
//! affected fetch early.
//!
//! # Modules
//!
//! - [`config`] - Environment configuration and data-center derivation
//! - [`client`] - HTTP adapter
//! - [`fetch`] - Offset pagination with rate-limit backoff
//! - [`campaigns`] - Campaign listing for a date range
//! - [`clicks`] - Per-campaign click analysis
//! - [`pipeline`] - The end-to-end report run

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod campaigns;
pub mod clicks;
pub mod client;
pub mod config;
mod error;
pub mod fetch;
pub mod pipeline;

pub use campaigns::fetch_campaigns;
pub use clicks::{ClickAnalysis, analyze_clicks};
pub use client::{ApiReply, MailchimpClient, Transport};
pub use config::{ConfigError, MailchimpConfig};
pub use error::MailchimpError;
pub use fetch::{FetchOutcome, Fetched, ListRequest, OnFailure, RetryBudget, fetch_all};
pub use pipeline::{
    NoDataReason, PipelineStage, Report, ReportOutcome, ReportRequest, RunCounts, run_report,
};
