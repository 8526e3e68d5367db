//! # Deviation Trigger
//!
//! Decides which signal prices go into the next packet.
//!
//! A signal whose price moved by at least its soft band is included; the
//! packet is only produced if some signal crossed its hard band or the
//! tunnel's interval elapsed (`send_all`). Soft-only movement never
//! produces a packet by itself.

use crate::domain::{Price, PriceStatus, SignalDeviation};
use std::collections::BTreeMap;
use tracing::debug;

/// Deviation reported when the previous price is zero.
pub const MAX_DEVIATION_BPS: u64 = i64::MAX as u64;

/// Relative move between two prices, `|new - old| * 10000 / old`.
pub fn deviation_bps(old_price: u64, new_price: u64) -> u64 {
    if old_price == new_price {
        return 0;
    }
    if old_price == 0 {
        return MAX_DEVIATION_BPS;
    }

    let diff = u128::from(old_price.abs_diff(new_price));
    let bps = diff * 10_000 / u128::from(old_price);
    u64::try_from(bps).unwrap_or(u64::MAX)
}

/// Feed price of `signal_id` as it would be relayed.
///
/// Missing signals become `NotInCurrentFeeds`; any non-available price is
/// carried with price 0.
fn feed_price(signal_id: &str, feed_prices: &BTreeMap<String, Price>) -> Price {
    match feed_prices.get(signal_id) {
        Some(p) if p.status == PriceStatus::Available => p.clone(),
        Some(p) => Price::new(p.status, signal_id, 0, p.timestamp),
        None => Price::missing(signal_id),
    }
}

/// Select the prices to relay.
///
/// Returns an empty list when no packet should be produced this cycle.
pub fn generate_new_prices(
    signal_deviations: &[SignalDeviation],
    latest_prices: &BTreeMap<String, Price>,
    feed_prices: &BTreeMap<String, Price>,
    send_all: bool,
) -> Vec<Price> {
    let mut new_prices = Vec::with_capacity(signal_deviations.len());
    let mut should_send = send_all;

    for sd in signal_deviations {
        let old_price = latest_prices.get(&sd.signal_id).map_or(0, |p| p.price);
        let price = feed_price(&sd.signal_id, feed_prices);
        let deviation = deviation_bps(old_price, price.price);

        if send_all || deviation >= sd.hard_deviation_bps {
            should_send = true;
            new_prices.push(price);
        } else if deviation >= sd.soft_deviation_bps {
            new_prices.push(price);
        } else {
            continue;
        }

        debug!(
            signal_id = %sd.signal_id,
            old_price,
            deviation_bps = deviation,
            "[qc-18] Signal included"
        );
    }

    if should_send {
        new_prices
    } else {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::prices_by_signal;

    fn available(signal_id: &str, price: u64) -> Price {
        Price::new(PriceStatus::Available, signal_id, price, 1_000)
    }

    #[test]
    fn test_deviation_bps() {
        assert_eq!(deviation_bps(50_000, 48_500), 300);
        assert_eq!(deviation_bps(50_000, 49_000), 200);
        assert_eq!(deviation_bps(50_000, 51_000), 200);
        assert_eq!(deviation_bps(7, 7), 0);
        assert_eq!(deviation_bps(0, 0), 0);
        assert_eq!(deviation_bps(0, 1), MAX_DEVIATION_BPS);
    }

    #[test]
    fn test_deviation_bps_large_prices() {
        assert_eq!(deviation_bps(u64::MAX, 0), 10_000);
        assert_eq!(deviation_bps(1, u64::MAX), u64::MAX);
    }

    #[test]
    fn test_hard_band_forces_send() {
        let sds = vec![SignalDeviation::new("CS:BTC-USD", 100, 300)];
        let latest = prices_by_signal(&[available("CS:BTC-USD", 50_000)]);
        let feeds = prices_by_signal(&[available("CS:BTC-USD", 48_500)]);

        let prices = generate_new_prices(&sds, &latest, &feeds, false);
        assert_eq!(prices, vec![available("CS:BTC-USD", 48_500)]);
    }

    #[test]
    fn test_soft_only_does_not_send() {
        let sds = vec![
            SignalDeviation::new("CS:BTC-USD", 100, 300),
            SignalDeviation::new("CS:ETH-USD", 100, 300),
        ];
        let latest = prices_by_signal(&[
            available("CS:BTC-USD", 50_000),
            available("CS:ETH-USD", 3_000),
        ]);
        let feeds = prices_by_signal(&[
            available("CS:BTC-USD", 49_000),
            available("CS:ETH-USD", 3_060),
        ]);

        assert!(generate_new_prices(&sds, &latest, &feeds, false).is_empty());
    }

    #[test]
    fn test_soft_signal_rides_along_with_hard() {
        let sds = vec![
            SignalDeviation::new("CS:BTC-USD", 100, 300),
            SignalDeviation::new("CS:ETH-USD", 100, 300),
            SignalDeviation::new("CS:BAND-USD", 100, 300),
        ];
        let latest = prices_by_signal(&[
            available("CS:BTC-USD", 50_000),
            available("CS:ETH-USD", 3_000),
            available("CS:BAND-USD", 1_000),
        ]);
        let feeds = prices_by_signal(&[
            available("CS:BTC-USD", 49_000),
            available("CS:ETH-USD", 3_300),
            available("CS:BAND-USD", 1_001),
        ]);

        let prices = generate_new_prices(&sds, &latest, &feeds, false);
        let ids: Vec<_> = prices.iter().map(|p| p.signal_id.as_str()).collect();
        assert_eq!(ids, vec!["CS:BTC-USD", "CS:ETH-USD"]);
    }

    #[test]
    fn test_send_all_includes_everything() {
        let sds = vec![
            SignalDeviation::new("CS:BTC-USD", 100, 300),
            SignalDeviation::new("CS:ETH-USD", 100, 300),
        ];
        let latest = prices_by_signal(&[
            available("CS:BTC-USD", 50_000),
            available("CS:ETH-USD", 3_000),
        ]);
        let feeds = prices_by_signal(&[available("CS:BTC-USD", 50_000)]);

        let prices = generate_new_prices(&sds, &latest, &feeds, true);
        assert_eq!(prices.len(), 2);
        assert_eq!(prices[1], Price::missing("CS:ETH-USD"));
    }

    #[test]
    fn test_unavailable_price_relayed_as_zero() {
        let sds = vec![SignalDeviation::new("CS:BTC-USD", 100, 300)];
        let latest = prices_by_signal(&[available("CS:BTC-USD", 50_000)]);
        let feeds = prices_by_signal(&[Price::new(PriceStatus::Unavailable, "CS:BTC-USD", 123, 9)]);

        let prices = generate_new_prices(&sds, &latest, &feeds, false);
        assert_eq!(prices, vec![Price::new(PriceStatus::Unavailable, "CS:BTC-USD", 0, 9)]);
    }

    #[test]
    fn test_first_price_after_reset_is_hard() {
        let sds = vec![SignalDeviation::new("CS:BTC-USD", 100, 300)];
        let latest = prices_by_signal(&[Price::missing("CS:BTC-USD")]);
        let feeds = prices_by_signal(&[available("CS:BTC-USD", 1)]);

        assert_eq!(generate_new_prices(&sds, &latest, &feeds, false).len(), 1);
    }
}
