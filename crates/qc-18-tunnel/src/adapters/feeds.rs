//! In-memory price feed.

use crate::domain::Price;
use crate::ports::{FeedsKeeper, KvStore};
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// Price feed holding one current price per signal.
#[derive(Debug, Default)]
pub struct InMemoryFeeds {
    prices: RwLock<BTreeMap<String, Price>>,
}

impl InMemoryFeeds {
    /// Empty feed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or replace the current price of a signal.
    pub fn set_price(&self, price: Price) {
        let mut prices = self.prices.write();
        prices.insert(price.signal_id.clone(), price);
    }

    /// Drop a signal from the feed.
    pub fn remove(&self, signal_id: &str) {
        let mut prices = self.prices.write();
        prices.remove(signal_id);
    }
}

impl FeedsKeeper for InMemoryFeeds {
    fn all_prices(&self, _store: &dyn KvStore) -> Vec<Price> {
        let prices = self.prices.read();
        prices.values().cloned().collect()
    }
}
