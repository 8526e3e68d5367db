//! # Domain Entities
//!
//! Tunnels, deposits, price snapshots and packets.

use super::route::{PacketReceipt, Route};
use super::value_objects::{Address, Coins};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-signal deviation bands, in basis points.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalDeviation {
    /// Feed signal ID (e.g. `CS:BTC-USD`).
    pub signal_id: String,
    /// Deviation that includes the price in the next packet.
    pub soft_deviation_bps: u64,
    /// Deviation that forces a packet to be sent.
    pub hard_deviation_bps: u64,
}

impl SignalDeviation {
    /// Create a new signal deviation.
    pub fn new(signal_id: impl Into<String>, soft_deviation_bps: u64, hard_deviation_bps: u64) -> Self {
        Self {
            signal_id: signal_id.into(),
            soft_deviation_bps,
            hard_deviation_bps,
        }
    }
}

/// Status of a feed price.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceStatus {
    /// Signal is not part of the current feeds.
    #[default]
    NotInCurrentFeeds,
    /// Signal is fed but no price could be aggregated.
    Unavailable,
    /// Price is available.
    Available,
}

impl PriceStatus {
    /// Lowercase name used in memos and events.
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceStatus::NotInCurrentFeeds => "not_in_current_feeds",
            PriceStatus::Unavailable => "unavailable",
            PriceStatus::Available => "available",
        }
    }
}

/// A price observation for one signal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Status of the observation.
    pub status: PriceStatus,
    /// Signal ID.
    pub signal_id: String,
    /// Price (0 when not available).
    pub price: u64,
    /// Unix time of the observation.
    pub timestamp: i64,
}

impl Price {
    /// Create a new price.
    pub fn new(status: PriceStatus, signal_id: impl Into<String>, price: u64, timestamp: i64) -> Self {
        Self {
            status,
            signal_id: signal_id.into(),
            price,
            timestamp,
        }
    }

    /// Placeholder for a signal with no usable feed price.
    pub fn missing(signal_id: impl Into<String>) -> Self {
        Self::new(PriceStatus::NotInCurrentFeeds, signal_id, 0, 0)
    }
}

/// Index prices by signal ID.
pub fn prices_by_signal(prices: &[Price]) -> BTreeMap<String, Price> {
    prices
        .iter()
        .map(|p| (p.signal_id.clone(), p.clone()))
        .collect()
}

/// A standing relay subscription.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tunnel {
    /// Tunnel ID, assigned sequentially from 1.
    pub id: u64,
    /// Last produced packet sequence (0 before the first packet).
    pub sequence: u64,
    /// Delivery route.
    pub route: Route,
    /// Derived account paying packet fees.
    pub fee_payer: Address,
    /// Signals relayed and their bands.
    pub signal_deviations: Vec<SignalDeviation>,
    /// Seconds between full emissions.
    pub interval: u64,
    /// Sum of all deposits.
    pub total_deposit: Coins,
    /// Member of the active set.
    pub is_active: bool,
    /// Unix time of registration.
    pub created_at: i64,
    /// Registering account.
    pub creator: Address,
}

impl Tunnel {
    /// Signal IDs in configuration order.
    pub fn signal_ids(&self) -> Vec<String> {
        self.signal_deviations
            .iter()
            .map(|sd| sd.signal_id.clone())
            .collect()
    }
}

/// One depositor's contribution to a tunnel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deposit {
    /// Tunnel ID.
    pub tunnel_id: u64,
    /// Depositor address.
    pub depositor: Address,
    /// Deposited amount.
    pub amount: Coins,
}

/// Last relayed prices of a tunnel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatestPrices {
    /// Tunnel ID.
    pub tunnel_id: u64,
    /// Last relayed price per signal.
    pub prices: Vec<Price>,
    /// Unix time of the last full emission.
    pub last_interval: i64,
}

impl LatestPrices {
    /// Zero snapshot for the configured signals.
    pub fn reset(tunnel_id: u64, signal_deviations: &[SignalDeviation]) -> Self {
        Self {
            tunnel_id,
            prices: signal_deviations
                .iter()
                .map(|sd| Price::missing(sd.signal_id.clone()))
                .collect(),
            last_interval: 0,
        }
    }

    /// Merge relayed prices into the snapshot.
    pub fn update_prices(&mut self, new_prices: &[Price]) {
        for new_price in new_prices {
            match self
                .prices
                .iter_mut()
                .find(|p| p.signal_id == new_price.signal_id)
            {
                Some(existing) => *existing = new_price.clone(),
                None => self.prices.push(new_price.clone()),
            }
        }
    }
}

/// A produced price-update record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Packet {
    /// Tunnel ID.
    pub tunnel_id: u64,
    /// Sequence, contiguous per tunnel from 1.
    pub sequence: u64,
    /// Prices included.
    pub prices: Vec<Price>,
    /// Base fee charged.
    pub base_fee: Coins,
    /// Route fee attached.
    pub route_fee: Coins,
    /// Unix time of creation.
    pub created_at: i64,
    /// Delivery receipt, set once the route accepted the packet.
    pub receipt: Option<PacketReceipt>,
}

/// Running total of collected base fees.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalFees {
    /// Sum of every base packet fee charged.
    pub total_base_packet_fee: Coins,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_prices_reset_zeroes_every_signal() {
        let sds = vec![
            SignalDeviation::new("CS:BTC-USD", 100, 300),
            SignalDeviation::new("CS:ETH-USD", 100, 300),
        ];
        let latest = LatestPrices::reset(7, &sds);
        assert_eq!(latest.prices.len(), 2);
        assert!(latest.prices.iter().all(|p| p.price == 0));
        assert_eq!(latest.last_interval, 0);
    }

    #[test]
    fn test_update_prices_merges() {
        let sds = vec![SignalDeviation::new("CS:BTC-USD", 100, 300)];
        let mut latest = LatestPrices::reset(1, &sds);
        latest.update_prices(&[
            Price::new(PriceStatus::Available, "CS:BTC-USD", 50_000, 10),
            Price::new(PriceStatus::Available, "CS:ETH-USD", 3_000, 10),
        ]);

        let map = prices_by_signal(&latest.prices);
        assert_eq!(map["CS:BTC-USD"].price, 50_000);
        assert_eq!(map["CS:ETH-USD"].price, 3_000);
        assert_eq!(latest.prices.len(), 2);
    }
}
