use serde::Serialize;
use std::collections::BTreeMap;

/// Aggregate statistics over the merged assets of one refresh cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PortfolioSummary {
    /// Number of distinct symbols across all exchanges
    pub unique_asset_count: usize,

    /// Sum of all known merged totals, rounded to 2 decimals
    pub total_value: f64,

    /// Number of exchanges holding a symbol → number of such symbols
    pub count_by_exchange_presence: BTreeMap<usize, usize>,

    /// Highest-value symbols, descending
    pub top_assets_by_value: Vec<TopAsset>,
}

/// Entry of the top-assets ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopAsset {
    /// Key into the merged assets.
    pub key: String,
    pub symbol: String,
    pub value: f64,
    pub exchange_count: usize,
}
