use tracing::{error, info};

/// The loading overlay shown during a manual refresh.
///
/// Rendering lives outside this crate; the scheduler only drives the
/// overlay through these calls.
pub trait LoadingIndicator: Send + Sync {
    /// Show the overlay with an initial message.
    fn show(&self, message: &str);

    /// Replace the message of the visible overlay.
    fn update(&self, message: &str);

    /// Switch the overlay to its error state.
    fn error(&self, message: &str);

    /// Hide the overlay.
    fn hide(&self);
}

/// Indicator that does nothing (headless use).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopIndicator;

impl LoadingIndicator for NoopIndicator {
    fn show(&self, _message: &str) {}
    fn update(&self, _message: &str) {}
    fn error(&self, _message: &str) {}
    fn hide(&self) {}
}

/// Indicator that reports progress through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogIndicator;

impl LoadingIndicator for LogIndicator {
    fn show(&self, message: &str) {
        info!(target: "loading", "{message}");
    }

    fn update(&self, message: &str) {
        info!(target: "loading", "{message}");
    }

    fn error(&self, message: &str) {
        error!(target: "loading", "{message}");
    }

    fn hide(&self) {}
}
