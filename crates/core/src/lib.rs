//! Campaign Report Core - Domain types and report math.
//!
//! This crate provides the pieces of the campaign click report that do not
//! talk to the network:
//! - `mailchimp` - Provider client, paginated fetching and click analysis
//! - `cli` - Command-line front end and CSV export
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no sleeping. Everything here can be exercised with plain values.
//!
//! # Modules
//!
//! - [`types`] - Provider records (campaigns, click details, list pages) and date ranges
//! - [`category`] - Newsletter category filter
//! - [`analysis`] - Tracked URL matching and per-campaign derived metrics
//! - [`metrics`] - Ordered metric selection
//! - [`report`] - Report table assembly

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod analysis;
pub mod category;
pub mod metrics;
pub mod report;
pub mod types;

pub use analysis::{AnalyzedRow, ClickTally, RunTotals, TrackedUrls, TrackedUrlsError};
pub use category::NewsletterCategory;
pub use metrics::{Metric, MetricSelection, MetricSelectionError, MetricValue};
pub use report::ReportTable;
pub use types::*;
