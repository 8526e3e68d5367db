//! # QC-18 Price Tunnels
//!
//! Standing, user-funded subscriptions that relay oracle prices to other
//! chains whenever they move enough, or on a fixed heartbeat.
//!
//! **Subsystem ID:** 18
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//! **Status:** Production-Ready
//!
//! ## Purpose
//!
//! - Register tunnels with per-signal soft/hard deviation bands and an interval
//! - Escrow deposits and charge per-packet fees to a derived fee-payer account
//! - Evaluate every active tunnel once per block and produce sequenced packets
//! - Deliver packets over TSS, IBC, IBC hooks, Axelar, Router or Hyperlane
//!
//! ## Failure Isolation
//!
//! | Situation | Outcome |
//! |-----------|---------|
//! | Fee payer cannot cover the next packet | Tunnel deactivated, committed |
//! | Route send fails or faults | That tunnel's attempt rolled back, event emitted |
//! | Unreadable record inside one tunnel's attempt | Same as a failed send |
//! | Missing tunnel behind an active ID | Batch aborts with a fatal error |
//!
//! ## Module Structure
//!
//! ```text
//! qc-18-tunnel/
//! ├── domain/          # Tunnel, Packet, Route, Coins, errors, store keys
//! ├── algorithms/      # Deviation triggers, ABI, memos, fee-payer derivation
//! ├── ports/           # TunnelApi, KvStore, bank/feeds/tss/transport traits
//! ├── adapters/        # In-memory store, cache store, collaborator doubles
//! ├── application/     # TunnelKeeper: registry, ledger, packets, dispatch
//! ├── config.rs        # TunnelParams
//! └── events.rs        # TunnelEvent
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod application;
pub mod config;
pub mod domain;
pub mod events;
pub mod ports;

// Re-exports
pub use application::{
    apply_if_no_error, BatchSummary, BlockInfo, Collaborators, Context, TunnelFilter,
    TunnelKeeper,
};
pub use config::{RouteConfig, TunnelParams};
pub use domain::{
    Address, AxelarRoute, Coin, Coins, Deposit, HyperlaneStrideRoute, IbcHookRoute, IbcRoute,
    LatestPrices, Packet, PacketReceipt, Price, PriceStatus, Result, Route, RouterRoute,
    SignalDeviation, TotalFees, TssRoute, Tunnel, TunnelError,
};
pub use events::{DeactivationReason, TunnelEvent};
pub use ports::{CreateTunnelRequest, KvStore, TunnelApi, UpdateSignalsRequest};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    #[allow(clippy::const_is_empty)]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
