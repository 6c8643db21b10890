use crate::models::exchange::ExchangeInfo;
use crate::models::settings::default_exchanges;

/// Ordered table of the exchanges polled on each refresh.
///
/// Fetch order follows registration order. Also resolves raw exchange keys
/// (`gate_ioAssets`) to display names (`Gate.io`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeRegistry {
    exchanges: Vec<ExchangeInfo>,
}

impl ExchangeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            exchanges: Vec::new(),
        }
    }

    /// Binance, Bitget, Gate.io and Bybit, in that order.
    pub fn new_with_defaults() -> Self {
        Self::from_exchanges(default_exchanges())
    }

    pub fn from_exchanges(exchanges: Vec<ExchangeInfo>) -> Self {
        let mut registry = Self::new();
        for exchange in exchanges {
            registry.register(exchange);
        }
        registry
    }

    /// Register an exchange. A second registration with the same key replaces the first in place.
    pub fn register(&mut self, exchange: ExchangeInfo) {
        match self.exchanges.iter_mut().find(|e| e.key == exchange.key) {
            Some(existing) => *existing = exchange,
            None => self.exchanges.push(exchange),
        }
    }

    pub fn exchanges(&self) -> &[ExchangeInfo] {
        &self.exchanges
    }

    pub fn get(&self, key: &str) -> Option<&ExchangeInfo> {
        self.exchanges.iter().find(|e| e.key == key)
    }

    /// Display name for a raw exchange key; unknown keys pass through unchanged.
    pub fn display_name<'a>(&'a self, key: &'a str) -> &'a str {
        self.get(key).map(|e| e.name.as_str()).unwrap_or(key)
    }

    pub fn len(&self) -> usize {
        self.exchanges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }
}

impl Default for ExchangeRegistry {
    fn default() -> Self {
        Self::new_with_defaults()
    }
}
