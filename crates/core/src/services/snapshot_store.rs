use std::sync::{Arc, RwLock};

use crate::models::hourly::PeriodChange;
use crate::models::snapshot::PortfolioSnapshot;

#[derive(Debug, Default)]
struct Slots {
    snapshot: Option<Arc<PortfolioSnapshot>>,
    period_change: Option<PeriodChange>,
}

/// Shared "current portfolio" state.
///
/// Cloning yields another handle to the same slots. The refresh scheduler is
/// the only writer; rendering code receives a clone and only reads.
#[derive(Debug, Clone, Default)]
pub struct SnapshotStore {
    slots: Arc<RwLock<Slots>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current snapshot, if a refresh has ever completed.
    pub fn get(&self) -> Option<Arc<PortfolioSnapshot>> {
        self.slots
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .snapshot
            .clone()
    }

    /// The current 24h change, if one has ever been computed.
    pub fn period_change(&self) -> Option<PeriodChange> {
        self.slots
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .period_change
    }

    /// Publish a complete snapshot, replacing the previous one.
    pub fn replace(&self, snapshot: PortfolioSnapshot) -> Arc<PortfolioSnapshot> {
        let snapshot = Arc::new(snapshot);
        self.slots
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .snapshot = Some(Arc::clone(&snapshot));
        snapshot
    }

    pub fn replace_period_change(&self, change: PeriodChange) {
        self.slots
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .period_change = Some(change);
    }
}
