use chrono::{DateTime, Utc};
use serde::Serialize;

/// Notification broadcast to observers after the snapshot was replaced.
///
/// Serializes as `{"name": "portfolioDataUpdated", "timestamp": ..., "silent": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "name", rename = "portfolioDataUpdated")]
pub struct PortfolioDataUpdated {
    pub timestamp: DateTime<Utc>,

    /// `true` when the update came from a background (silent) refresh
    pub silent: bool,
}

impl PortfolioDataUpdated {
    pub const NAME: &'static str = "portfolioDataUpdated";

    pub fn silent(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            silent: true,
        }
    }

    pub fn name(&self) -> &'static str {
        Self::NAME
    }
}
