use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::traits::ExchangeDataSource;
use crate::errors::CoreError;
use crate::models::exchange::RawExchangeAsset;
use crate::models::hourly::{DailySeries, DaySeries, HourlySample};
use crate::models::settings::ServerSettings;
use crate::numeric::deserialize_optional_f64;

/// HTTP client for the exchange proxy.
///
/// - **Auth**: static API key sent in a header (default `X-API-KEY`) on every request.
/// - **Endpoints**: one route per exchange returning `{"assets": {...}}`, plus
///   an hourly route (default `calcs-data`) returning `{"days": {...}}`.
/// - **Retries**: none. The refresh scheduler decides what a failure means.
pub struct HttpExchangeClient {
    client: Client,
    base_url: String,
    api_key_header: String,
    api_key: String,
    hourly_route: String,
}

impl HttpExchangeClient {
    pub fn new(settings: &ServerSettings) -> Result<Self, CoreError> {
        let api_key = settings
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                CoreError::Config(format!(
                    "missing API key: set server.api_key or {}",
                    crate::models::settings::API_KEY_ENV
                ))
            })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .map_err(|e| CoreError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key_header: settings.api_key_header.clone(),
            api_key,
            hourly_route: settings.hourly_route.clone(),
        })
    }

    /// Full URL of a proxy route.
    pub fn url_for(&self, route: &str) -> String {
        format!("{}/{}", self.base_url, route.trim_start_matches('/'))
    }

    /// GET a route and return the body of a successful response.
    async fn get_body(&self, route: &str) -> Result<String, CoreError> {
        let url = self.url_for(route);
        debug!(route, "fetching from proxy");

        let resp = self
            .client
            .get(&url)
            .header(self.api_key_header.as_str(), self.api_key.as_str())
            .send()
            .await
            .map_err(|e| CoreError::fetch(route, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(CoreError::Fetch {
                route: route.to_string(),
                message: format!("HTTP status {status}"),
            });
        }

        resp.text().await.map_err(|e| CoreError::fetch(route, e))
    }
}

// ── Proxy response types ────────────────────────────────────────────

#[derive(Deserialize)]
struct AssetsResponse {
    assets: serde_json::Map<String, serde_json::Value>,
}

#[derive(Deserialize)]
struct AssetEntry {
    #[serde(default)]
    symbol: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_f64")]
    free: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_optional_f64")]
    amount: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_optional_f64")]
    usd_value: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_optional_f64")]
    price: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_optional_f64")]
    price_change_24h: Option<f64>,
}

#[derive(Deserialize)]
struct HourlyResponse {
    days: serde_json::Map<String, serde_json::Value>,
}

/// Decode an exchange route body into raw assets, keeping the upstream key order.
///
/// The map key is the merge identity; the `symbol` field is only displayed and
/// falls back to the key when missing. The quantity comes from
/// `free`, falling back to `amount`, then 0.
pub fn parse_assets_body(route: &str, body: &str) -> Result<Vec<RawExchangeAsset>, CoreError> {
    let resp: AssetsResponse = serde_json::from_str(body)
        .map_err(|e| CoreError::malformed(route, format!("expected an `assets` object: {e}")))?;

    resp.assets
        .into_iter()
        .map(|(key, value)| {
            let entry: AssetEntry = serde_json::from_value(value)
                .map_err(|e| CoreError::malformed(route, format!("asset {key}: {e}")))?;
            let symbol = entry
                .symbol
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| key.clone());
            Ok(RawExchangeAsset {
                key,
                symbol,
                free_amount: entry.free.or(entry.amount).unwrap_or(0.0),
                usd_value: entry.usd_value,
                price: entry.price,
                price_change_24h_percent: entry.price_change_24h.unwrap_or(0.0),
            })
        })
        .collect()
}

/// Decode the hourly route body into a day-ordered series.
pub fn parse_hourly_body(route: &str, body: &str) -> Result<DailySeries, CoreError> {
    let resp: HourlyResponse = serde_json::from_str(body)
        .map_err(|e| CoreError::malformed(route, format!("expected a `days` object: {e}")))?;

    let days = resp
        .days
        .into_iter()
        .map(|(day, value)| {
            let samples: Vec<HourlySample> = serde_json::from_value(value)
                .map_err(|e| CoreError::malformed(route, format!("day {day}: {e}")))?;
            Ok(DaySeries { day, samples })
        })
        .collect::<Result<Vec<_>, CoreError>>()?;

    Ok(DailySeries { days })
}

#[async_trait]
impl ExchangeDataSource for HttpExchangeClient {
    fn name(&self) -> &str {
        "ExchangeProxy"
    }

    async fn fetch_exchange_assets(&self, route: &str) -> Result<Vec<RawExchangeAsset>, CoreError> {
        let body = self.get_body(route).await?;
        parse_assets_body(route, &body)
    }

    async fn fetch_hourly_series(&self) -> Result<DailySeries, CoreError> {
        let body = self.get_body(&self.hourly_route).await?;
        parse_hourly_body(&self.hourly_route, &body)
    }
}
