use chrono::{DateTime, Utc};
use serde::Serialize;

use super::exchange::ExchangeAssets;
use super::merged::MergedAssets;
use super::summary::PortfolioSummary;

/// The result of one complete aggregation pass.
///
/// Published as a whole: readers holding an `Arc<PortfolioSnapshot>` never
/// observe a partially updated value.
#[derive(Debug, Clone, Serialize)]
pub struct PortfolioSnapshot {
    /// Raw per-exchange data, in fetch order
    pub raw_by_exchange: Vec<ExchangeAssets>,

    /// Symbol → merged cross-exchange asset
    pub merged_assets: MergedAssets,

    pub summary: PortfolioSummary,

    /// Symbols held on two or more exchanges
    pub multi_exchange_symbols: Vec<String>,

    pub timestamp: DateTime<Utc>,
}
