//! Module parameters for the Tunnel subsystem

use crate::domain::{Coins, Result, SignalDeviation, TunnelError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Default accepted deposit denom.
pub const DEFAULT_DENOM: &str = "uband";

/// Tunnel module parameters.
///
/// Loaded once per operation and passed down as a snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TunnelParams {
    /// Deposit required to activate; its denoms are the accepted deposit denoms.
    pub min_deposit: Coins,
    /// Minimum interval in seconds.
    pub min_interval: u64,
    /// Maximum interval in seconds.
    pub max_interval: u64,
    /// Lowest allowed deviation band (bps).
    pub min_deviation_bps: u64,
    /// Highest allowed deviation band (bps).
    pub max_deviation_bps: u64,
    /// Maximum signals per tunnel.
    pub max_signals: u64,
    /// Fee charged per packet.
    pub base_packet_fee: Coins,
    /// GMP route plumbing.
    pub routes: RouteConfig,
}

/// Transport settings for the GMP-style routes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteConfig {
    /// Transfer channel towards Axelar.
    pub axelar_ibc_channel: String,
    /// Axelar GMP account receiving transfers.
    pub axelar_gmp_account: String,
    /// Axelar relayer fee recipient.
    pub axelar_fee_recipient: String,
    /// Transfer channel towards the Router chain.
    pub router_ibc_channel: String,
    /// Transfer channel towards Stride.
    pub hyperlane_stride_ibc_channel: String,
    /// Hyperlane integration contract on Stride.
    pub hyperlane_stride_integration_contract: String,
}

impl Default for TunnelParams {
    fn default() -> Self {
        Self {
            min_deposit: Coins::single(DEFAULT_DENOM, 1_000_000_000),
            min_interval: 60,
            max_interval: 3600,
            min_deviation_bps: 50,
            max_deviation_bps: 3000,
            max_signals: 25,
            base_packet_fee: Coins::single(DEFAULT_DENOM, 10),
            routes: RouteConfig::default(),
        }
    }
}

impl TunnelParams {
    /// Validate the parameter set.
    pub fn validate(&self) -> Result<()> {
        if let Some(denom) = self.min_deposit.invalid_denom() {
            return Err(TunnelError::InvalidParams(format!("invalid min deposit denom: {denom}")));
        }
        if let Some(denom) = self.base_packet_fee.invalid_denom() {
            return Err(TunnelError::InvalidParams(format!("invalid base fee denom: {denom}")));
        }
        if self.min_interval == 0 || self.min_interval > self.max_interval {
            return Err(TunnelError::InvalidParams(format!(
                "invalid interval range: [{}, {}]",
                self.min_interval, self.max_interval
            )));
        }
        if self.min_deviation_bps == 0 || self.min_deviation_bps > self.max_deviation_bps {
            return Err(TunnelError::InvalidParams(format!(
                "invalid deviation range: [{}, {}]",
                self.min_deviation_bps, self.max_deviation_bps
            )));
        }
        if self.max_signals == 0 {
            return Err(TunnelError::InvalidParams("max signals must be positive".into()));
        }
        Ok(())
    }

    /// Validate a tunnel's signal configuration.
    pub fn validate_signal_deviations(&self, signal_deviations: &[SignalDeviation]) -> Result<()> {
        if signal_deviations.is_empty() {
            return Err(TunnelError::EmptySignals);
        }
        if signal_deviations.len() as u64 > self.max_signals {
            return Err(TunnelError::MaxSignalsExceeded {
                got: signal_deviations.len(),
                max: self.max_signals,
            });
        }

        let mut seen = HashSet::with_capacity(signal_deviations.len());
        for sd in signal_deviations {
            if !seen.insert(sd.signal_id.as_str()) {
                return Err(TunnelError::DuplicateSignal(sd.signal_id.clone()));
            }

            let range = self.min_deviation_bps..=self.max_deviation_bps;
            if !range.contains(&sd.soft_deviation_bps) || !range.contains(&sd.hard_deviation_bps) {
                return Err(TunnelError::DeviationOutOfRange {
                    signal_id: sd.signal_id.clone(),
                    soft_bps: sd.soft_deviation_bps,
                    hard_bps: sd.hard_deviation_bps,
                    min_bps: self.min_deviation_bps,
                    max_bps: self.max_deviation_bps,
                });
            }
        }
        Ok(())
    }

    /// Validate a tunnel interval.
    pub fn validate_interval(&self, interval: u64) -> Result<()> {
        if interval < self.min_interval || interval > self.max_interval {
            return Err(TunnelError::IntervalOutOfRange {
                interval,
                min: self.min_interval,
                max: self.max_interval,
            });
        }
        Ok(())
    }

    /// Reject deposits in denoms outside `min_deposit`.
    pub fn validate_deposit_denom(&self, amount: &Coins) -> Result<()> {
        for denom in amount.denoms() {
            if self.min_deposit.amount_of(denom) == 0 {
                return Err(TunnelError::InvalidDepositDenom {
                    denom: denom.to_string(),
                    accepted: self.min_deposit.denoms().map(str::to_string).collect(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params_are_valid() {
        let params = TunnelParams::default();
        assert!(params.validate().is_ok());
        assert_eq!(params.min_interval, 60);
        assert_eq!(params.max_signals, 25);
    }

    #[test]
    fn test_invalid_interval_range() {
        let params = TunnelParams {
            min_interval: 100,
            max_interval: 10,
            ..Default::default()
        };
        assert!(matches!(params.validate(), Err(TunnelError::InvalidParams(_))));
    }

    #[test]
    fn test_signal_deviation_bounds() {
        let params = TunnelParams::default();
        let ok = vec![SignalDeviation::new("CS:BTC-USD", 100, 300)];
        assert!(params.validate_signal_deviations(&ok).is_ok());

        let too_low = vec![SignalDeviation::new("CS:BTC-USD", 10, 300)];
        assert!(matches!(
            params.validate_signal_deviations(&too_low),
            Err(TunnelError::DeviationOutOfRange { .. })
        ));

        let too_high = vec![SignalDeviation::new("CS:BTC-USD", 100, 5000)];
        assert!(params.validate_signal_deviations(&too_high).is_err());
    }

    #[test]
    fn test_duplicate_and_empty_signals() {
        let params = TunnelParams::default();
        assert_eq!(params.validate_signal_deviations(&[]), Err(TunnelError::EmptySignals));

        let dup = vec![
            SignalDeviation::new("CS:BTC-USD", 100, 300),
            SignalDeviation::new("CS:BTC-USD", 100, 300),
        ];
        assert_eq!(
            params.validate_signal_deviations(&dup),
            Err(TunnelError::DuplicateSignal("CS:BTC-USD".into()))
        );
    }

    #[test]
    fn test_max_signals() {
        let params = TunnelParams {
            max_signals: 1,
            ..Default::default()
        };
        let sds = vec![
            SignalDeviation::new("CS:BTC-USD", 100, 300),
            SignalDeviation::new("CS:ETH-USD", 100, 300),
        ];
        assert!(matches!(
            params.validate_signal_deviations(&sds),
            Err(TunnelError::MaxSignalsExceeded { got: 2, max: 1 })
        ));
    }

    #[test]
    fn test_interval_bounds() {
        let params = TunnelParams::default();
        assert!(params.validate_interval(60).is_ok());
        assert!(params.validate_interval(59).is_err());
        assert!(params.validate_interval(3601).is_err());
    }

    #[test]
    fn test_deposit_denom() {
        let params = TunnelParams::default();
        assert!(params.validate_deposit_denom(&Coins::single("uband", 5)).is_ok());
        assert!(matches!(
            params.validate_deposit_denom(&Coins::single("uatom", 5)),
            Err(TunnelError::InvalidDepositDenom { .. })
        ));
    }
}
