use chrono::Utc;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::errors::CoreError;
use crate::models::event::PortfolioDataUpdated;
use crate::models::exchange::ExchangeAssets;
use crate::models::settings::{RefreshSettings, Settings};
use crate::models::snapshot::PortfolioSnapshot;
use crate::providers::registry::ExchangeRegistry;
use crate::providers::traits::ExchangeDataSource;
use crate::services::hourly_change_service::HourlyChangeCalculator;
use crate::services::merge_service::AssetMerger;
use crate::services::progress::LoadingIndicator;
use crate::services::snapshot_store::SnapshotStore;
use crate::services::summary_service::SummaryCalculator;

/// Buffered update notifications per subscriber.
const UPDATE_CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshMode {
    /// First load or user action: loading indicator, pacing, all-or-nothing.
    Manual,
    /// Background timer: no indicator, failing exchanges are skipped.
    Silent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    Idle,
    Refreshing(RefreshMode),
}

/// Marks a cycle as in flight; returns the scheduler to `Idle` when dropped.
struct InFlight<'a> {
    state: &'a Mutex<RefreshState>,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = RefreshState::Idle;
    }
}

/// Hides the loading indicator when dropped, including when a manual cycle
/// is cancelled part-way.
struct VisibleIndicator<'a> {
    indicator: &'a dyn LoadingIndicator,
}

impl Drop for VisibleIndicator<'_> {
    fn drop(&mut self) {
        self.indicator.hide();
    }
}

struct BackgroundTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Drives refresh cycles and owns the published portfolio state.
///
/// Manual refresh (first load, user action):
/// 1. Show the loading indicator.
/// 2. Fetch every configured exchange in order, pausing after each one.
/// 3. Refresh the 24h change.
/// 4. Merge, summarize and publish. Any exchange failure aborts the cycle,
///    leaves the previous snapshot untouched and is returned to the caller.
///
/// Silent refresh (background timer): same steps without indicator or
/// pacing; failing exchanges are logged and left out of the merge, and
/// observers are notified after publishing. Nothing escapes the cycle.
///
/// At most one cycle runs at a time.
pub struct RefreshScheduler {
    source: Arc<dyn ExchangeDataSource>,
    registry: ExchangeRegistry,
    merger: AssetMerger,
    summarizer: SummaryCalculator,
    hourly: HourlyChangeCalculator,
    store: SnapshotStore,
    indicator: Arc<dyn LoadingIndicator>,
    updates: broadcast::Sender<PortfolioDataUpdated>,
    timing: RefreshSettings,
    state: Mutex<RefreshState>,
    background: Mutex<Option<BackgroundTask>>,
}

impl RefreshScheduler {
    pub fn new(
        settings: &Settings,
        source: Arc<dyn ExchangeDataSource>,
        indicator: Arc<dyn LoadingIndicator>,
    ) -> Self {
        let registry = ExchangeRegistry::from_exchanges(settings.exchanges.clone());
        let aggregation = &settings.aggregation;
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);

        Self {
            merger: AssetMerger::new(registry.clone(), aggregation.accumulation),
            summarizer: SummaryCalculator::new(aggregation.top_assets_limit),
            hourly: HourlyChangeCalculator::new(aggregation.hourly_window, aggregation.hourly_days),
            registry,
            source,
            store: SnapshotStore::new(),
            indicator,
            updates,
            timing: settings.refresh.clone(),
            state: Mutex::new(RefreshState::Idle),
            background: Mutex::new(None),
        }
    }

    /// Read handle on the published state.
    pub fn store(&self) -> SnapshotStore {
        self.store.clone()
    }

    pub fn state(&self) -> RefreshState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Receive a notification after every successful silent refresh.
    pub fn subscribe(&self) -> broadcast::Receiver<PortfolioDataUpdated> {
        self.updates.subscribe()
    }

    pub fn is_background_running(&self) -> bool {
        self.background
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .is_some_and(|task| !task.handle.is_finished())
    }

    /// First manual refresh; on success the background timer starts.
    pub async fn initialize(this: &Arc<Self>) -> Result<Arc<PortfolioSnapshot>, CoreError> {
        let snapshot = this.refresh_manual().await?;
        Self::start_background_refresh(this);
        Ok(snapshot)
    }

    /// Run a manual cycle and return the freshly published snapshot.
    pub async fn refresh_manual(&self) -> Result<Arc<PortfolioSnapshot>, CoreError> {
        let _in_flight = self.begin(RefreshMode::Manual)?;

        self.indicator.show("Initializing connection...");
        let _visible = VisibleIndicator {
            indicator: &*self.indicator,
        };
        let result = self.run_manual_cycle().await;

        if let Err(e) = &result {
            error!(error = %e, "manual refresh failed; previous snapshot kept");
            self.indicator.error("Error loading data...");
            pause(self.timing.error_display()).await;
        }

        result
    }

    async fn run_manual_cycle(&self) -> Result<Arc<PortfolioSnapshot>, CoreError> {
        let total = self.registry.len();
        let mut raw = Vec::with_capacity(total);

        for (i, exchange) in self.registry.exchanges().iter().enumerate() {
            self.indicator.update(&format!(
                "Loading {} data... ({}/{})",
                exchange.name,
                i + 1,
                total
            ));

            let assets = self.source.fetch_exchange_assets(&exchange.route).await?;
            debug!(exchange = %exchange.name, assets = assets.len(), "exchange loaded");
            raw.push(ExchangeAssets::new(exchange.key.clone(), assets));

            pause(self.timing.manual_pacing()).await;
        }

        self.indicator.update("Processing and combining data...");
        pause(self.timing.processing_delay()).await;

        self.refresh_period_change().await;

        Ok(self.publish(raw))
    }

    /// Run a silent cycle. Returns the published snapshot, or `None` when the
    /// cycle was skipped or nothing could be fetched.
    pub async fn refresh_silent(&self) -> Option<Arc<PortfolioSnapshot>> {
        let _in_flight = match self.begin(RefreshMode::Silent) {
            Ok(guard) => guard,
            Err(e) => {
                debug!(error = %e, "silent refresh skipped");
                return None;
            }
        };

        let mut raw = Vec::with_capacity(self.registry.len());
        for exchange in self.registry.exchanges() {
            match self.source.fetch_exchange_assets(&exchange.route).await {
                Ok(assets) => raw.push(ExchangeAssets::new(exchange.key.clone(), assets)),
                Err(e) => {
                    warn!(exchange = %exchange.name, error = %e, "exchange left out of silent refresh")
                }
            }
        }

        self.refresh_period_change().await;

        if raw.is_empty() {
            warn!("silent refresh fetched no exchange; previous snapshot kept");
            return None;
        }

        let snapshot = self.publish(raw);
        // Having no subscribers is not an error.
        let _ = self
            .updates
            .send(PortfolioDataUpdated::silent(snapshot.timestamp));
        Some(snapshot)
    }

    /// Cancel the background timer. Safe to call repeatedly; a cycle already
    /// running is allowed to finish.
    pub fn stop_background_refresh(&self) {
        let task = self
            .background
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(task) = task {
            task.cancel.cancel();
            info!("background refresh stopped");
        }
    }

    fn start_background_refresh(this: &Arc<Self>) {
        let mut slot = this.background.lock().unwrap_or_else(|e| e.into_inner());
        if slot.as_ref().is_some_and(|task| !task.handle.is_finished()) {
            return;
        }

        let period = this.timing.interval();
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let weak = Arc::downgrade(this);

        let handle = tokio::spawn(async move {
            let mut ticker = time::interval_at(time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        let Some(scheduler) = weak.upgrade() else { break };
                        scheduler.refresh_silent().await;
                    }
                }
            }
        });

        info!(interval_secs = period.as_secs(), "background refresh started");
        *slot = Some(BackgroundTask { cancel, handle });
    }

    fn begin(&self, mode: RefreshMode) -> Result<InFlight<'_>, CoreError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if let RefreshState::Refreshing(current) = *state {
            debug!(?current, requested = ?mode, "refresh already in flight");
            return Err(CoreError::RefreshInProgress);
        }
        *state = RefreshState::Refreshing(mode);
        Ok(InFlight { state: &self.state })
    }

    /// Fetch the hourly series and replace the 24h change. Failures keep the
    /// previous value and never affect the asset snapshot.
    async fn refresh_period_change(&self) {
        let result = self
            .source
            .fetch_hourly_series()
            .await
            .and_then(|series| self.hourly.compute_change(&series));

        match result {
            Ok(change) => {
                debug!(
                    percent = change.percent_change_24h,
                    pnl = change.absolute_pnl_24h,
                    "24h change updated"
                );
                self.store.replace_period_change(change);
            }
            Err(e) => warn!(error = %e, "24h change not updated; previous value kept"),
        }
    }

    fn publish(&self, raw: Vec<ExchangeAssets>) -> Arc<PortfolioSnapshot> {
        let merged_assets = self.merger.merge(&raw);
        let summary = self.summarizer.summarize(&merged_assets);
        let multi_exchange_symbols = SummaryCalculator::multi_exchange_symbols(&merged_assets);

        let snapshot = self.store.replace(PortfolioSnapshot {
            raw_by_exchange: raw,
            merged_assets,
            summary,
            multi_exchange_symbols,
            timestamp: Utc::now(),
        });

        info!(
            assets = snapshot.summary.unique_asset_count,
            total_value = snapshot.summary.total_value,
            "portfolio snapshot published"
        );
        snapshot
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.stop_background_refresh();
    }
}

async fn pause(duration: Duration) {
    if !duration.is_zero() {
        time::sleep(duration).await;
    }
}
