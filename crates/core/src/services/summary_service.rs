use std::collections::BTreeMap;

use crate::models::merged::MergedAssets;
use crate::models::summary::{PortfolioSummary, TopAsset};
use crate::numeric::{round_to, VALUE_DECIMALS};

/// Default length of the top-assets ranking.
pub const DEFAULT_TOP_ASSETS: usize = 10;

/// Derives portfolio statistics from the merged assets.
pub struct SummaryCalculator {
    top_n: usize,
}

impl SummaryCalculator {
    pub fn new(top_n: usize) -> Self {
        Self { top_n }
    }

    /// Compute the summary. Empty input yields the empty summary.
    pub fn summarize(&self, merged: &MergedAssets) -> PortfolioSummary {
        let mut total_value = 0.0;
        let mut count_by_exchange_presence: BTreeMap<usize, usize> = BTreeMap::new();
        let mut ranked: Vec<TopAsset> = Vec::new();

        for asset in merged {
            *count_by_exchange_presence
                .entry(asset.exchange_count())
                .or_insert(0) += 1;

            if let Some(value) = asset.total_value {
                total_value += value;
                ranked.push(TopAsset {
                    key: asset.key.clone(),
                    symbol: asset.symbol.clone(),
                    value,
                    exchange_count: asset.exchange_count(),
                });
            }
        }

        // sort_by is stable: equal values keep merge order
        ranked.sort_by(|a, b| {
            b.value
                .partial_cmp(&a.value)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        ranked.truncate(self.top_n);

        PortfolioSummary {
            unique_asset_count: merged.len(),
            total_value: round_to(total_value, VALUE_DECIMALS),
            count_by_exchange_presence,
            top_assets_by_value: ranked,
        }
    }

    /// Keys held on more than one exchange, in merge order.
    pub fn multi_exchange_symbols(merged: &MergedAssets) -> Vec<String> {
        merged
            .iter()
            .filter(|a| a.exchange_count() > 1)
            .map(|a| a.key.clone())
            .collect()
    }
}

impl Default for SummaryCalculator {
    fn default() -> Self {
        Self::new(DEFAULT_TOP_ASSETS)
    }
}
