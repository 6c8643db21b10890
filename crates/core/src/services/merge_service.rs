use std::collections::HashMap;

use crate::models::exchange::{ExchangeAssets, RawExchangeAsset};
use crate::models::merged::{ExchangeContribution, MergedAsset, MergedAssets};
use crate::models::settings::AccumulationMode;
use crate::numeric::{round_to, AMOUNT_DECIMALS, PRICE_DECIMALS, VALUE_DECIMALS};
use crate::providers::registry::ExchangeRegistry;

/// Combines per-exchange holdings into one entry per upstream key.
///
/// Entries are grouped on [`RawExchangeAsset::key`]; the display symbol of a
/// merged entry is the one reported by its latest contribution.
///
/// Merge rules, applied per exchange and per key in the order supplied:
/// - amounts are summed;
/// - values are summed only over exchanges that report one, so an exchange
///   without a USD value never zeroes a known total;
/// - the price is blended as `total_value / total_amount` when both are known
///   and positive, otherwise the latest per-exchange price wins;
/// - the 24h change keeps the latest non-zero reading.
///
/// In [`AccumulationMode::DisplayRounded`] each step starts from the previous
/// step's rounded output (amount 8, value 2, price 8 decimals), matching the
/// figures the dashboard has always shown. [`AccumulationMode::Precise`] keeps
/// unrounded running sums and only rounds what it writes.
pub struct AssetMerger {
    registry: ExchangeRegistry,
    mode: AccumulationMode,
}

/// Running state of one key during a merge pass.
struct Accumulator {
    asset: MergedAsset,
    exact_amount: f64,
    exact_value: Option<f64>,
}

impl AssetMerger {
    pub fn new(registry: ExchangeRegistry, mode: AccumulationMode) -> Self {
        Self { registry, mode }
    }

    pub fn mode(&self) -> AccumulationMode {
        self.mode
    }

    /// Build the merged view from one cycle's raw data. Nothing is carried
    /// over from earlier cycles.
    pub fn merge(&self, exchanges: &[ExchangeAssets]) -> MergedAssets {
        let mut order: Vec<String> = Vec::new();
        let mut running: HashMap<String, Accumulator> = HashMap::new();

        for exchange in exchanges {
            let exchange_name = self.registry.display_name(&exchange.exchange_key);

            for raw in &exchange.assets {
                let contribution = Self::contribution(exchange_name, raw);

                match running.get_mut(&raw.key) {
                    Some(acc) => self.accumulate(acc, raw, contribution),
                    None => {
                        order.push(raw.key.clone());
                        running.insert(raw.key.clone(), Self::seed(raw, contribution));
                    }
                }
            }
        }

        let mut merged = MergedAssets::new();
        for key in order {
            if let Some(acc) = running.remove(&key) {
                merged.insert(acc.asset);
            }
        }
        merged
    }

    fn contribution(exchange_name: &str, raw: &RawExchangeAsset) -> ExchangeContribution {
        ExchangeContribution {
            exchange: exchange_name.to_string(),
            amount: round_to(raw.free_amount, AMOUNT_DECIMALS),
            value: raw.usd_value.map(|v| round_to(v, VALUE_DECIMALS)),
            price: raw.price.map(|p| round_to(p, PRICE_DECIMALS)),
        }
    }

    fn seed(raw: &RawExchangeAsset, contribution: ExchangeContribution) -> Accumulator {
        Accumulator {
            asset: MergedAsset {
                key: raw.key.clone(),
                symbol: raw.symbol.clone(),
                total_amount: round_to(raw.free_amount, AMOUNT_DECIMALS),
                total_value: raw.usd_value.map(|v| round_to(v, VALUE_DECIMALS)),
                price: raw.price.map(|p| round_to(p, PRICE_DECIMALS)),
                change_24h_percent: raw.price_change_24h_percent,
                contributions: vec![contribution],
            },
            exact_amount: raw.free_amount,
            exact_value: raw.usd_value,
        }
    }

    fn accumulate(
        &self,
        acc: &mut Accumulator,
        raw: &RawExchangeAsset,
        contribution: ExchangeContribution,
    ) {
        let (base_amount, base_value) = match self.mode {
            AccumulationMode::DisplayRounded => (acc.asset.total_amount, acc.asset.total_value),
            AccumulationMode::Precise => (acc.exact_amount, acc.exact_value),
        };

        acc.exact_amount = base_amount + raw.free_amount;
        acc.asset.total_amount = round_to(acc.exact_amount, AMOUNT_DECIMALS);

        if let Some(value) = raw.usd_value {
            let sum = base_value.unwrap_or(0.0) + value;
            acc.exact_value = Some(sum);
            acc.asset.total_value = Some(round_to(sum, VALUE_DECIMALS));
        }

        let (amount, value) = match self.mode {
            AccumulationMode::DisplayRounded => (acc.asset.total_amount, acc.asset.total_value),
            AccumulationMode::Precise => (acc.exact_amount, acc.exact_value),
        };
        acc.asset.price = match value {
            Some(v) if v > 0.0 && amount > 0.0 => Some(round_to(v / amount, PRICE_DECIMALS)),
            _ => raw
                .price
                .map(|p| round_to(p, PRICE_DECIMALS))
                .or(acc.asset.price),
        };

        // Sticky: a later zero reading never clears an earlier non-zero one.
        if raw.price_change_24h_percent != 0.0 {
            acc.asset.change_24h_percent = raw.price_change_24h_percent;
        }

        acc.asset.symbol.clone_from(&raw.symbol);
        acc.asset.contributions.push(contribution);
    }
}

impl Default for AssetMerger {
    fn default() -> Self {
        Self::new(ExchangeRegistry::new_with_defaults(), AccumulationMode::default())
    }
}
