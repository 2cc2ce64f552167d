//! Core types for the campaign report.
//!
//! This module provides typed records for the provider's JSON payloads and
//! the date range used to query them.

pub mod campaign;
pub mod click;
pub mod date_range;
pub mod id;
pub mod page;

pub use campaign::{Campaign, CampaignPage, CampaignSettings, ReportSummary};
pub use click::{ClickDetailsPage, ClickRecord};
pub use date_range::{DateRange, DateRangeError};
pub use id::CampaignId;
pub use page::ListPage;
