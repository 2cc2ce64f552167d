//! The report pipeline.
//!
//! One run moves through the stages in order:
//!
//! ```text
//! Idle -> FetchingCampaigns -> Filtering -> AnalyzingClicks -> AssemblingReport -> Done
//! ```
//!
//! An empty campaign listing ends the run after `FetchingCampaigns`; a run
//! whose analysis yields no rows ends after `AnalyzingClicks`. Both surface as
//! [`ReportOutcome::NoData`], never as an error.

use std::fmt;

use campaign_report_core::{
    AnalyzedRow, DateRange, MetricSelection, NewsletterCategory, ReportTable, RunTotals,
    TrackedUrls,
};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::campaigns::fetch_campaigns;
use crate::client::Transport;
use crate::clicks::analyze_clicks;
use crate::fetch::RetryBudget;

/// Everything one report run needs.
#[derive(Debug, Clone)]
pub struct ReportRequest {
    pub category: NewsletterCategory,
    pub date_range: DateRange,
    pub tracked_urls: TrackedUrls,
    pub metrics: MetricSelection,
    /// Rate-limit retries for the campaign listing, and separately for the
    /// whole click analysis.
    pub max_retries: u32,
}

/// Pipeline stage, logged on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PipelineStage {
    Idle,
    FetchingCampaigns,
    Filtering,
    AnalyzingClicks,
    AssemblingReport,
    Done,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::FetchingCampaigns => "fetching campaigns",
            Self::Filtering => "filtering",
            Self::AnalyzingClicks => "analyzing clicks",
            Self::AssemblingReport => "assembling report",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// Why a run produced no report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NoDataReason {
    /// The campaign listing was empty or failed.
    EmptySource,
    /// No campaign in the category had a matched ad click.
    NoRows,
}

impl fmt::Display for NoDataReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptySource => f.write_str("no campaigns were sent in the date range"),
            Self::NoRows => f.write_str("no campaign had clicks on the tracked ad URLs"),
        }
    }
}

/// Campaign counts at each filtering step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RunCounts {
    /// Campaigns returned by the listing.
    pub fetched: usize,
    /// Campaigns in the requested category.
    pub matched: usize,
    /// Campaigns with a report row.
    pub reported: usize,
}

/// A finished report.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub table: ReportTable,
    pub rows: Vec<AnalyzedRow>,
    pub totals: RunTotals,
    pub counts: RunCounts,
}

/// Result of one run.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportOutcome {
    Ready(Report),
    NoData {
        reason: NoDataReason,
        counts: RunCounts,
    },
}

/// Tracks the current stage and logs transitions.
struct StageTracker {
    stage: PipelineStage,
}

impl StageTracker {
    const fn new() -> Self {
        Self {
            stage: PipelineStage::Idle,
        }
    }

    fn enter(&mut self, next: PipelineStage) {
        info!(from = %self.stage, to = %next, "Pipeline stage");
        self.stage = next;
    }
}

/// Run the report pipeline once.
#[instrument(skip_all, fields(category = %request.category))]
pub async fn run_report<T: Transport>(transport: &T, request: &ReportRequest) -> ReportOutcome {
    let mut stages = StageTracker::new();
    let mut counts = RunCounts::default();

    stages.enter(PipelineStage::FetchingCampaigns);
    let campaigns = fetch_campaigns(transport, &request.date_range, request.max_retries).await;
    counts.fetched = campaigns.len();
    if campaigns.is_empty() {
        warn!(stage = %stages.stage, "No campaigns found");
        return ReportOutcome::NoData {
            reason: NoDataReason::EmptySource,
            counts,
        };
    }

    stages.enter(PipelineStage::Filtering);
    let campaigns = request.category.filter_campaigns(campaigns);
    counts.matched = campaigns.len();
    info!(
        fetched = counts.fetched,
        matched = counts.matched,
        "Filtered campaigns by category"
    );

    stages.enter(PipelineStage::AnalyzingClicks);
    let mut budget = RetryBudget::new(request.max_retries);
    let analysis = analyze_clicks(transport, &campaigns, &request.tracked_urls, &mut budget).await;
    counts.reported = analysis.rows.len();
    if analysis.rows.is_empty() {
        warn!(
            stage = %stages.stage,
            matched = counts.matched,
            "No campaigns with matched clicks"
        );
        return ReportOutcome::NoData {
            reason: NoDataReason::NoRows,
            counts,
        };
    }

    stages.enter(PipelineStage::AssemblingReport);
    let table = ReportTable::assemble(&analysis.rows, &request.metrics);

    stages.enter(PipelineStage::Done);
    info!(
        fetched = counts.fetched,
        matched = counts.matched,
        reported = counts.reported,
        grand_total_opens = analysis.totals.grand_total_opens,
        total_recipients = analysis.totals.total_recipients,
        retries_used = budget.used(),
        "Report ready"
    );

    ReportOutcome::Ready(Report {
        table,
        rows: analysis.rows,
        totals: analysis.totals,
        counts,
    })
}
