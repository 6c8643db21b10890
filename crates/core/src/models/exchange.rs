use serde::{Deserialize, Serialize};

/// A configured exchange account behind the proxy.
///
/// `key` identifies the exchange in raw data (`binanceAsset`), `name` is the
/// display name (`Binance`) and `route` is the proxy path (`binance-data`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeInfo {
    pub key: String,
    pub name: String,
    pub route: String,
}

impl ExchangeInfo {
    pub fn new(key: impl Into<String>, name: impl Into<String>, route: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            route: route.into(),
        }
    }
}

/// One asset holding as reported by a single exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawExchangeAsset {
    /// Upstream map key; entries are merged on it.
    pub key: String,

    /// Display symbol (the entry's `symbol` field, else the key).
    pub symbol: String,

    /// Quantity held (0 when the exchange omits it).
    pub free_amount: f64,

    /// USD value; `None` when the exchange does not price the asset.
    pub usd_value: Option<f64>,

    /// Unit price, if reported.
    pub price: Option<f64>,

    /// 24h price change in percent (0 when absent).
    pub price_change_24h_percent: f64,
}

impl RawExchangeAsset {
    /// Holding whose display symbol equals its key.
    pub fn new(symbol: impl Into<String>, free_amount: f64) -> Self {
        let symbol = symbol.into();
        Self {
            key: symbol.clone(),
            symbol,
            free_amount,
            usd_value: None,
            price: None,
            price_change_24h_percent: 0.0,
        }
    }

    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = symbol.into();
        self
    }

    pub fn with_value(mut self, usd_value: f64) -> Self {
        self.usd_value = Some(usd_value);
        self
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_change(mut self, percent: f64) -> Self {
        self.price_change_24h_percent = percent;
        self
    }
}

/// Raw holdings of one exchange for one refresh cycle, in upstream order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeAssets {
    pub exchange_key: String,
    pub assets: Vec<RawExchangeAsset>,
}

impl ExchangeAssets {
    pub fn new(exchange_key: impl Into<String>, assets: Vec<RawExchangeAsset>) -> Self {
        Self {
            exchange_key: exchange_key.into(),
            assets,
        }
    }
}
