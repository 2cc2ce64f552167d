//! Provider-assigned identifiers.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Campaign identifier as assigned by the provider.
///
/// Unique per account. Used to build the per-campaign click report path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct CampaignId(String);

impl CampaignId {
    /// Create a new campaign ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the ID and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for CampaignId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for CampaignId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CampaignId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for CampaignId {
    fn from(id: String) -> Self {
        Self(id)
    }
}
