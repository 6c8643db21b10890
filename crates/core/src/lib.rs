pub mod errors;
pub mod models;
pub mod numeric;
pub mod providers;
pub mod services;

use models::{
    event::PortfolioDataUpdated, hourly::PeriodChange, settings::Settings,
    snapshot::PortfolioSnapshot,
};
use providers::{http_client::HttpExchangeClient, traits::ExchangeDataSource};
use services::{
    progress::LoadingIndicator, refresh_service::RefreshScheduler,
    snapshot_store::SnapshotStore,
};
use std::sync::Arc;
use tokio::sync::broadcast;

use errors::CoreError;

/// Main entry point for the portfolio aggregation core.
///
/// Owns the refresh scheduler and exposes the operations the rendering layer
/// uses. Nothing runs until [`PortfolioDashboard::initialize`] is called.
#[must_use]
pub struct PortfolioDashboard {
    scheduler: Arc<RefreshScheduler>,
}

impl std::fmt::Debug for PortfolioDashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortfolioDashboard")
            .field("state", &self.scheduler.state())
            .field("background", &self.scheduler.is_background_running())
            .field("has_snapshot", &self.scheduler.store().get().is_some())
            .finish()
    }
}

impl PortfolioDashboard {
    /// Dashboard talking to the HTTP proxy described by `settings`.
    pub fn from_settings(
        settings: &Settings,
        indicator: Arc<dyn LoadingIndicator>,
    ) -> Result<Self, CoreError> {
        settings.validate()?;
        let client = HttpExchangeClient::new(&settings.server)?;
        Ok(Self::with_source(settings, Arc::new(client), indicator))
    }

    /// Dashboard over any data source (tests, embedders).
    pub fn with_source(
        settings: &Settings,
        source: Arc<dyn ExchangeDataSource>,
        indicator: Arc<dyn LoadingIndicator>,
    ) -> Self {
        Self {
            scheduler: Arc::new(RefreshScheduler::new(settings, source, indicator)),
        }
    }

    // ── Lifecycle ───────────────────────────────────────────────────

    /// First manual refresh, then start the background refresh timer.
    pub async fn initialize(&self) -> Result<Arc<PortfolioSnapshot>, CoreError> {
        RefreshScheduler::initialize(&self.scheduler).await
    }

    /// Cancel the background timer. Idempotent.
    pub fn stop_background_refresh(&self) {
        self.scheduler.stop_background_refresh();
    }

    pub fn is_background_running(&self) -> bool {
        self.scheduler.is_background_running()
    }

    // ── Refresh ─────────────────────────────────────────────────────

    /// Run a manual refresh and return the fresh snapshot.
    pub async fn get_complete_portfolio_data(&self) -> Result<Arc<PortfolioSnapshot>, CoreError> {
        self.scheduler.refresh_manual().await
    }

    /// Run one silent refresh now, outside the timer.
    pub async fn refresh_silently(&self) -> Option<Arc<PortfolioSnapshot>> {
        self.scheduler.refresh_silent().await
    }

    // ── Published state ─────────────────────────────────────────────

    #[must_use]
    pub fn current_snapshot(&self) -> Option<Arc<PortfolioSnapshot>> {
        self.scheduler.store().get()
    }

    #[must_use]
    pub fn current_period_change(&self) -> Option<PeriodChange> {
        self.scheduler.store().period_change()
    }

    /// Read-only handle for rendering collaborators.
    pub fn store(&self) -> SnapshotStore {
        self.scheduler.store()
    }

    /// Notifications emitted after each successful silent refresh.
    pub fn subscribe(&self) -> broadcast::Receiver<PortfolioDataUpdated> {
        self.scheduler.subscribe()
    }
}
