use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::collections::HashMap;

/// One exchange's share of a merged asset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExchangeContribution {
    /// Display name of the exchange (e.g. "Gate.io")
    pub exchange: String,
    pub amount: f64,
    pub value: Option<f64>,
    pub price: Option<f64>,
}

/// Cross-exchange view of one asset symbol.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedAsset {
    /// Upstream key shared by every contribution.
    pub key: String,

    /// Display symbol from the latest contribution.
    pub symbol: String,

    /// Sum of contributed amounts, 8 decimals.
    pub total_amount: f64,

    /// Sum of reported USD values, 2 decimals. `None` if no exchange priced it.
    pub total_value: Option<f64>,

    /// Blended price, 8 decimals.
    pub price: Option<f64>,

    /// Latest non-zero 24h change reading.
    pub change_24h_percent: f64,

    /// One entry per reporting exchange, in merge order.
    pub contributions: Vec<ExchangeContribution>,
}

impl MergedAsset {
    pub fn exchange_count(&self) -> usize {
        self.contributions.len()
    }
}

/// Merged assets keyed by upstream key, kept in first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedAssets {
    assets: Vec<MergedAsset>,
    index: HashMap<String, usize>,
}

impl MergedAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&MergedAsset> {
        self.index.get(key).map(|&i| &self.assets[i])
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut MergedAsset> {
        self.index.get(key).map(|&i| &mut self.assets[i])
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Insert a new asset, or replace the existing one in place (keeping its position).
    pub fn insert(&mut self, asset: MergedAsset) {
        match self.index.get(&asset.key) {
            Some(&i) => self.assets[i] = asset,
            None => {
                self.index.insert(asset.key.clone(), self.assets.len());
                self.assets.push(asset);
            }
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MergedAsset> {
        self.assets.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.assets.iter().map(|a| a.key.as_str())
    }
}

impl<'a> IntoIterator for &'a MergedAssets {
    type Item = &'a MergedAsset;
    type IntoIter = std::slice::Iter<'a, MergedAsset>;

    fn into_iter(self) -> Self::IntoIter {
        self.assets.iter()
    }
}

impl Serialize for MergedAssets {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.assets.len()))?;
        for asset in &self.assets {
            map.serialize_entry(&asset.key, asset)?;
        }
        map.end()
    }
}
