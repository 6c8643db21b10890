use async_trait::async_trait;

use crate::errors::CoreError;
use crate::models::exchange::RawExchangeAsset;
use crate::models::hourly::DailySeries;

/// Trait abstraction over the proxy backend serving exchange holdings.
///
/// The HTTP implementation talks to the real proxy; tests and embedders can
/// plug in their own source without touching the refresh logic.
#[async_trait]
pub trait ExchangeDataSource: Send + Sync {
    /// Human-readable name of this source (for logs/errors).
    fn name(&self) -> &str;

    /// Fetch the current holdings behind one exchange route, in upstream order.
    async fn fetch_exchange_assets(&self, route: &str) -> Result<Vec<RawExchangeAsset>, CoreError>;

    /// Fetch the multi-day hourly portfolio-value series.
    async fn fetch_hourly_series(&self) -> Result<DailySeries, CoreError>;
}
