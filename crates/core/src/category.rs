//! Newsletter categories and the campaign title filter.

use core::convert::Infallible;
use core::fmt;

use crate::Campaign;

/// Newsletter category a report is run for.
///
/// Campaign titles carry the newsletter name, so selecting a category is a
/// case-insensitive substring match on the title. `HC` additionally matches
/// titles that spell out "health care".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NewsletterCategory {
    Am,
    Pm,
    Energy,
    /// Health care. Matches `hc` or `health care`.
    Hc,
    BreakingNews,
    /// Free-text category matched literally.
    Custom(String),
}

impl NewsletterCategory {
    /// The predefined categories in display order.
    pub const PREDEFINED: [Self; 5] = [
        Self::Am,
        Self::Pm,
        Self::Energy,
        Self::Hc,
        Self::BreakingNews,
    ];

    /// Human-readable label, also used in generated file names.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Am => "AM",
            Self::Pm => "PM",
            Self::Energy => "Energy",
            Self::Hc => "HC",
            Self::BreakingNews => "Breaking News",
            Self::Custom(label) => label,
        }
    }

    /// Whether a campaign title belongs to this category.
    #[must_use]
    pub fn matches(&self, title: &str) -> bool {
        let title = title.to_lowercase();
        match self {
            Self::Hc => title.contains("hc") || title.contains("health care"),
            other => title.contains(&other.label().to_lowercase()),
        }
    }

    /// Keep only the campaigns whose title matches this category.
    #[must_use]
    pub fn filter_campaigns(&self, campaigns: Vec<Campaign>) -> Vec<Campaign> {
        campaigns
            .into_iter()
            .filter(|campaign| self.matches(campaign.title()))
            .collect()
    }
}

impl fmt::Display for NewsletterCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for NewsletterCategory {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let category = Self::PREDEFINED
            .into_iter()
            .find(|known| known.label().eq_ignore_ascii_case(s))
            .unwrap_or_else(|| Self::Custom(s.to_owned()));
        Ok(category)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::{CampaignId, CampaignSettings, ReportSummary};

    fn campaign(title: &str) -> Campaign {
        Campaign {
            id: CampaignId::new(title),
            settings: CampaignSettings {
                title: title.to_string(),
            },
            send_time: None,
            emails_sent: 0,
            report_summary: ReportSummary::default(),
        }
    }

    #[test]
    fn test_hc_matches_alias() {
        let hc = NewsletterCategory::Hc;

        assert!(hc.matches("Weekly HC Update"));
        assert!(hc.matches("Health Care Digest"));
        assert!(!hc.matches("AM Roundup"));
    }

    #[test]
    fn test_label_match_is_case_insensitive() {
        assert!(NewsletterCategory::Am.matches("am roundup"));
        assert!(NewsletterCategory::Energy.matches("ENERGY WEEKLY"));
        assert!(NewsletterCategory::BreakingNews.matches("Breaking news: rates"));
        assert!(!NewsletterCategory::BreakingNews.matches("Breaking-News"));
    }

    #[test]
    fn test_custom_category_matches_substring() {
        let custom = NewsletterCategory::Custom("Tech".to_string());
        assert!(custom.matches("Fintech Friday"));
        assert!(!custom.matches("Energy Weekly"));
    }

    #[test]
    fn test_parse_predefined_case_insensitive() {
        assert_eq!("hc".parse::<NewsletterCategory>().unwrap(), NewsletterCategory::Hc);
        assert_eq!("Pm".parse::<NewsletterCategory>().unwrap(), NewsletterCategory::Pm);
        assert_eq!(
            "breaking news".parse::<NewsletterCategory>().unwrap(),
            NewsletterCategory::BreakingNews
        );
    }

    #[test]
    fn test_parse_free_text() {
        let parsed: NewsletterCategory = "Weekend Edition".parse().unwrap();
        assert_eq!(parsed, NewsletterCategory::Custom("Weekend Edition".to_string()));
        assert_eq!(parsed.to_string(), "Weekend Edition");
    }

    #[test]
    fn test_filter_campaigns_keeps_order() {
        let campaigns = vec![
            campaign("Health Care Digest"),
            campaign("AM Roundup"),
            campaign("Weekly HC Update"),
        ];

        let kept: Vec<_> = NewsletterCategory::Hc
            .filter_campaigns(campaigns)
            .into_iter()
            .map(|c| c.settings.title)
            .collect();

        assert_eq!(kept, ["Health Care Digest", "Weekly HC Update"]);
    }
}
