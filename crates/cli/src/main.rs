//! Campaign Report CLI - Newsletter ad click reports from Mailchimp.
//!
//! # Usage
//!
//! ```bash
//! # Clicks on one sponsor link in HC newsletters sent in March
//! campaign-report -n HC -s 2024-03-01 -e 2024-03-31 --ad-url sponsor.com/spring
//!
//! # Two tracked links, selected columns, explicit file name
//! campaign-report -n "Breaking News" -s 2024-03-01 -e 2024-03-31 \
//!     --ad-url acme.com/a --second-ad-url acme.com/b \
//!     --metrics unique_opens,total_clicks,ctr --output acme-march
//! ```
//!
//! Requires `MAILCHIMP_API_KEY` (a `.env` file is honored). `REPORT_OUTPUT_DIR`
//! sets where the CSV is written and `LOG_FORMAT=json` switches to JSON logs.
//!
//! # Exit status
//!
//! - `0` - report written
//! - `1` - invalid input, configuration or write failure
//! - `2` - nothing to report

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;
use std::process::ExitCode;

use campaign_report_core::{DateRange, MetricSelection, NewsletterCategory, TrackedUrls};
use campaign_report_mailchimp::{
    MailchimpClient, MailchimpConfig, ReportOutcome, ReportRequest, run_report,
};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod export;

const EXIT_NO_DATA: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "campaign-report")]
#[command(author, version, about = "Newsletter ad click reports from Mailchimp")]
struct Cli {
    /// Newsletter category (AM, PM, Energy, HC, Breaking News) or any title text
    #[arg(short, long)]
    newsletter: NewsletterCategory,

    /// First send date to include (YYYY-MM-DD)
    #[arg(short, long)]
    start: String,

    /// Last send date to include (YYYY-MM-DD)
    #[arg(short, long)]
    end: String,

    /// Ad URL substring to count clicks for
    #[arg(short = 'u', long)]
    ad_url: String,

    /// Optional second ad URL substring
    #[arg(long)]
    second_ad_url: Option<String>,

    /// Comma-separated metric columns in output order
    /// (`unique_opens`, `total_opens`, `total_recipients`, `total_clicks`, `ctr`)
    #[arg(short, long)]
    metrics: Option<MetricSelection>,

    /// Advertiser name used in the default file name
    #[arg(short, long)]
    advertiser: Option<String>,

    /// Output file name; `.csv` is appended if missing
    #[arg(short, long)]
    output: Option<String>,

    /// Directory the report is written to
    #[arg(long, env = "REPORT_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Rate-limit retry budget (overrides `MAILCHIMP_MAX_RETRIES`)
    #[arg(long)]
    max_retries: Option<u32>,
}

impl Cli {
    /// File name for the report, defaulting to `<advertiser>-<newsletter>-<today>.csv`.
    fn filename(&self) -> String {
        self.output.as_deref().map_or_else(
            || {
                export::default_filename(
                    self.advertiser.as_deref(),
                    &self.newsletter,
                    chrono::Local::now().date_naive(),
                )
            },
            export::normalize_filename,
        )
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env before reading LOG_FORMAT and REPORT_OUTPUT_DIR
    let _ = dotenvy::dotenv();

    init_tracing();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(Some(_)) => ExitCode::SUCCESS,
        Ok(None) => ExitCode::from(EXIT_NO_DATA),
        Err(e) => {
            tracing::error!("Report failed: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    // Defaults to info level if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());

    let is_json = std::env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));
    let json_layer = is_json.then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!is_json).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}

/// Run one report. Returns the written file, or `None` when there was nothing to report.
async fn run(cli: Cli) -> Result<Option<PathBuf>, Box<dyn std::error::Error>> {
    let date_range = DateRange::parse(&cli.start, &cli.end)?;
    let tracked_urls = TrackedUrls::new(cli.ad_url.clone(), cli.second_ad_url.clone())?;
    let filename = cli.filename();

    let mut config = MailchimpConfig::from_env()?;
    if let Some(max_retries) = cli.max_retries {
        config = config.with_max_retries(max_retries);
    }
    let client = MailchimpClient::new(&config)?;

    let request = ReportRequest {
        category: cli.newsletter,
        date_range,
        tracked_urls,
        metrics: cli.metrics.unwrap_or_default(),
        max_retries: config.max_retries,
    };

    match run_report(&client, &request).await {
        ReportOutcome::Ready(report) => {
            let path = export::write_report(&report.table, &cli.output_dir, &filename)?;
            info!(
                path = %path.display(),
                rows = report.counts.reported,
                grand_total_opens = report.totals.grand_total_opens,
                total_recipients = report.totals.total_recipients,
                "Report written"
            );
            Ok(Some(path))
        }
        ReportOutcome::NoData { reason, counts } => {
            warn!(
                %reason,
                fetched = counts.fetched,
                matched = counts.matched,
                "No data to report, no file written"
            );
            Ok(None)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use campaign_report_core::Metric;

    fn parse(args: &[&str]) -> Cli {
        let base = ["campaign-report", "-n", "hc", "-s", "2024-03-01", "-e", "2024-03-10", "-u", "sponsor.com"];
        Cli::try_parse_from(base.iter().chain(args)).unwrap()
    }

    #[test]
    fn test_category_parsed_case_insensitively() {
        assert_eq!(parse(&[]).newsletter, NewsletterCategory::Hc);
    }

    #[test]
    fn test_free_text_category() {
        let cli = Cli::try_parse_from([
            "campaign-report", "-n", "Weekend Edition", "-s", "2024-03-01", "-e", "2024-03-10", "-u", "x",
        ])
        .unwrap();
        assert_eq!(cli.newsletter, NewsletterCategory::Custom("Weekend Edition".to_string()));
    }

    #[test]
    fn test_metrics_default_to_all() {
        let cli = parse(&[]);
        assert!(cli.metrics.is_none());
        assert_eq!(cli.metrics.unwrap_or_default(), MetricSelection::default());
    }

    #[test]
    fn test_metrics_list() {
        let cli = parse(&["--metrics", "ctr,unique_opens"]);
        let selected: Vec<_> = cli.metrics.unwrap().selected().collect();
        assert_eq!(selected, [Metric::Ctr, Metric::UniqueOpens]);
    }

    #[test]
    fn test_unknown_metric_rejected() {
        let base = ["campaign-report", "-n", "AM", "-s", "2024-03-01", "-e", "2024-03-10", "-u", "x"];
        let result = Cli::try_parse_from(base.iter().chain(&["--metrics", "bounces"]));
        assert!(result.is_err());
    }

    #[test]
    fn test_ad_url_required() {
        let result = Cli::try_parse_from(["campaign-report", "-n", "AM", "-s", "2024-03-01", "-e", "2024-03-10"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_output_filename_normalized() {
        assert_eq!(parse(&["-o", "march"]).filename(), "march.csv");
        assert_eq!(parse(&["-o", "march.csv"]).filename(), "march.csv");
    }

    #[test]
    fn test_default_filename_uses_advertiser_and_category() {
        let filename = parse(&["-a", "Acme"]).filename();
        assert!(filename.starts_with("Acme-HC-"));
        assert!(filename.ends_with(".csv"));
    }
}
