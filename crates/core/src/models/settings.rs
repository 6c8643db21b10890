use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use super::exchange::ExchangeInfo;
use crate::errors::CoreError;

/// Environment variable holding the proxy API key.
pub const API_KEY_ENV: &str = "PORTFOLIO_API_KEY";
/// Environment variable overriding the proxy base URL.
pub const BASE_URL_ENV: &str = "PORTFOLIO_BASE_URL";

/// All runtime configuration. Every field has a default, so an empty TOML
/// file is a valid configuration (apart from the API key).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub refresh: RefreshSettings,
    pub aggregation: AggregationSettings,

    /// Exchanges polled on every refresh, in fetch order.
    pub exchanges: Vec<ExchangeInfo>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            refresh: RefreshSettings::default(),
            aggregation: AggregationSettings::default(),
            exchanges: default_exchanges(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Proxy base URL; routes are appended as `{base_url}/{route}`.
    pub base_url: String,

    /// Header carrying the API key.
    pub api_key_header: String,

    /// API key. Usually supplied through `PORTFOLIO_API_KEY` instead of the file.
    pub api_key: Option<String>,

    /// Route of the hourly portfolio-value series.
    pub hourly_route: String,

    /// Transport timeout for a single request.
    pub request_timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5001".to_string(),
            api_key_header: "X-API-KEY".to_string(),
            api_key: None,
            hourly_route: "calcs-data".to_string(),
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshSettings {
    /// Period of the background (silent) refresh.
    pub interval_secs: u64,

    /// Pause after each exchange during a manual refresh.
    pub manual_pacing_ms: u64,

    /// Pause before merging during a manual refresh.
    pub processing_delay_ms: u64,

    /// How long a manual-refresh error stays on the loading indicator.
    pub error_display_ms: u64,
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            manual_pacing_ms: 300,
            processing_delay_ms: 500,
            error_display_ms: 1000,
        }
    }
}

impl RefreshSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn manual_pacing(&self) -> Duration {
        Duration::from_millis(self.manual_pacing_ms)
    }

    pub fn processing_delay(&self) -> Duration {
        Duration::from_millis(self.processing_delay_ms)
    }

    pub fn error_display(&self) -> Duration {
        Duration::from_millis(self.error_display_ms)
    }

    /// No pacing or display delays; the background interval is kept.
    pub fn without_delays(mut self) -> Self {
        self.manual_pacing_ms = 0;
        self.processing_delay_ms = 0;
        self.error_display_ms = 0;
        self
    }
}

/// How merged amounts and values are accumulated across exchanges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccumulationMode {
    /// Every step reads back the previous step's display-rounded output.
    #[default]
    DisplayRounded,
    /// Running sums stay unrounded; only written fields are rounded.
    Precise,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationSettings {
    pub accumulation: AccumulationMode,

    /// Length of the top-assets ranking.
    pub top_assets_limit: usize,

    /// Number of hourly samples in the change window.
    pub hourly_window: usize,

    /// Number of trailing days the hourly window is drawn from.
    pub hourly_days: usize,
}

impl Default for AggregationSettings {
    fn default() -> Self {
        Self {
            accumulation: AccumulationMode::DisplayRounded,
            top_assets_limit: 10,
            hourly_window: 24,
            hourly_days: 2,
        }
    }
}

/// The four exchange accounts the dashboard tracks.
pub fn default_exchanges() -> Vec<ExchangeInfo> {
    vec![
        ExchangeInfo::new("binanceAsset", "Binance", "binance-data"),
        ExchangeInfo::new("bitgetAsset", "Bitget", "bitget-assets"),
        ExchangeInfo::new("gate_ioAssets", "Gate.io", "gate-assets"),
        ExchangeInfo::new("bybitAssets", "Bybit", "bybit-assets"),
    ]
}

impl Settings {
    /// Parse settings from TOML text. Missing sections fall back to defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, CoreError> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a TOML file, then apply `.env` and environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let mut settings = Self::from_toml_str(&content)?;
        settings.apply_env_overrides();
        settings.validate()?;
        Ok(settings)
    }

    /// Defaults plus `.env` and environment overrides (no config file).
    pub fn from_env() -> Result<Self, CoreError> {
        let mut settings = Self::default();
        settings.apply_env_overrides();
        settings.validate()?;
        Ok(settings)
    }

    /// Read `PORTFOLIO_API_KEY` and `PORTFOLIO_BASE_URL`, loading `.env` first if present.
    pub fn apply_env_overrides(&mut self) {
        // A missing .env file is the normal case.
        let _ = dotenvy::dotenv();

        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                self.server.api_key = Some(key);
            }
        }
        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            if !url.trim().is_empty() {
                self.server.base_url = url;
            }
        }
    }

    /// Reject configurations the engine cannot run with.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.server.base_url.trim().is_empty() {
            return Err(CoreError::Config("server.base_url must not be empty".into()));
        }
        if self.server.api_key_header.trim().is_empty() {
            return Err(CoreError::Config(
                "server.api_key_header must not be empty".into(),
            ));
        }
        if self.server.request_timeout_secs == 0 {
            return Err(CoreError::Config(
                "server.request_timeout_secs must be greater than zero".into(),
            ));
        }
        if self.refresh.interval_secs == 0 {
            return Err(CoreError::Config(
                "refresh.interval_secs must be greater than zero".into(),
            ));
        }
        if self.aggregation.top_assets_limit == 0 {
            return Err(CoreError::Config(
                "aggregation.top_assets_limit must be greater than zero".into(),
            ));
        }
        if self.aggregation.hourly_window == 0 || self.aggregation.hourly_days == 0 {
            return Err(CoreError::Config(
                "aggregation.hourly_window and aggregation.hourly_days must be greater than zero"
                    .into(),
            ));
        }
        if self.exchanges.is_empty() {
            return Err(CoreError::Config("at least one exchange must be configured".into()));
        }

        let mut seen = HashSet::new();
        for exchange in &self.exchanges {
            if exchange.key.trim().is_empty() || exchange.route.trim().is_empty() {
                return Err(CoreError::Config(format!(
                    "exchange {:?} needs a non-empty key and route",
                    exchange.name
                )));
            }
            if !seen.insert(exchange.key.as_str()) {
                return Err(CoreError::Config(format!(
                    "duplicate exchange key {:?}",
                    exchange.key
                )));
            }
        }
        Ok(())
    }
}
