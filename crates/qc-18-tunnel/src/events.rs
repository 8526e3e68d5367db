//! # Tunnel Events
//!
//! Events emitted by tunnel operations. They are buffered on the execution
//! context and only released when the surrounding write set commits.

use crate::domain::{Address, Coins, SignalDeviation};
use serde::{Deserialize, Serialize};

/// Why a tunnel left the active set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeactivationReason {
    /// Creator request.
    Requested,
    /// Fee payer cannot cover the next packet.
    InsufficientFunds,
    /// A withdrawal dropped the deposit below the minimum.
    DepositBelowMinimum,
}

/// Events published by the tunnel subsystem.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TunnelEvent {
    /// A tunnel was registered.
    TunnelCreated {
        /// Tunnel ID
        tunnel_id: u64,
        /// Route description
        route: String,
        /// Interval (seconds)
        interval: u64,
        /// Derived fee payer
        fee_payer: Address,
        /// Creator
        creator: Address,
        /// Configured signals
        signal_deviations: Vec<SignalDeviation>,
    },
    /// Signals and interval were replaced.
    SignalsAndIntervalUpdated {
        /// Tunnel ID
        tunnel_id: u64,
        /// New interval
        interval: u64,
        /// New signals
        signal_deviations: Vec<SignalDeviation>,
    },
    /// Tunnel joined the active set.
    TunnelActivated {
        /// Tunnel ID
        tunnel_id: u64,
    },
    /// Tunnel left the active set.
    TunnelDeactivated {
        /// Tunnel ID
        tunnel_id: u64,
        /// Reason
        reason: DeactivationReason,
    },
    /// Deposit added.
    DepositAdded {
        /// Tunnel ID
        tunnel_id: u64,
        /// Depositor
        depositor: Address,
        /// Amount
        amount: Coins,
    },
    /// Deposit withdrawn.
    DepositWithdrawn {
        /// Tunnel ID
        tunnel_id: u64,
        /// Withdrawer
        withdrawer: Address,
        /// Amount
        amount: Coins,
    },
    /// A packet was produced and handed to its route.
    PacketProduced {
        /// Tunnel ID
        tunnel_id: u64,
        /// Packet sequence
        sequence: u64,
    },
    /// Packet production failed and was rolled back.
    PacketProductionFailed {
        /// Tunnel ID
        tunnel_id: u64,
        /// Error message
        reason: String,
    },
    /// Creator triggered a tunnel manually.
    TunnelTriggered {
        /// Tunnel ID
        tunnel_id: u64,
    },
    /// Module params replaced.
    ParamsUpdated,
}

impl TunnelEvent {
    /// Tunnel the event refers to, if any.
    pub fn tunnel_id(&self) -> Option<u64> {
        match self {
            TunnelEvent::TunnelCreated { tunnel_id, .. }
            | TunnelEvent::SignalsAndIntervalUpdated { tunnel_id, .. }
            | TunnelEvent::TunnelActivated { tunnel_id }
            | TunnelEvent::TunnelDeactivated { tunnel_id, .. }
            | TunnelEvent::DepositAdded { tunnel_id, .. }
            | TunnelEvent::DepositWithdrawn { tunnel_id, .. }
            | TunnelEvent::PacketProduced { tunnel_id, .. }
            | TunnelEvent::PacketProductionFailed { tunnel_id, .. }
            | TunnelEvent::TunnelTriggered { tunnel_id } => Some(*tunnel_id),
            TunnelEvent::ParamsUpdated => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tunnel_id_accessor() {
        let event = TunnelEvent::TunnelDeactivated {
            tunnel_id: 4,
            reason: DeactivationReason::InsufficientFunds,
        };
        assert_eq!(event.tunnel_id(), Some(4));
        assert_eq!(TunnelEvent::ParamsUpdated.tunnel_id(), None);
    }
}
