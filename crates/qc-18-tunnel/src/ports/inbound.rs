//! # Inbound Ports (Driving Side)
//!
//! Message-style entry points of the tunnel subsystem. Every mutating call
//! is all-or-nothing: on error no write and no event survives.

use crate::application::{BatchSummary, Context};
use crate::config::TunnelParams;
use crate::domain::{Address, Coins, Result, Route, SignalDeviation};

/// Register a new tunnel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateTunnelRequest {
    /// Creator (and initial depositor).
    pub creator: Address,
    /// Delivery route.
    pub route: Route,
    /// Signals and their bands.
    pub signal_deviations: Vec<SignalDeviation>,
    /// Interval in seconds.
    pub interval: u64,
    /// Deposit made by the creator right after registration. May be empty.
    pub initial_deposit: Coins,
}

/// Replace a tunnel's signals and interval.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpdateSignalsRequest {
    /// Tunnel ID.
    pub tunnel_id: u64,
    /// Caller, must be the tunnel creator.
    pub creator: Address,
    /// New signals and bands.
    pub signal_deviations: Vec<SignalDeviation>,
    /// New interval in seconds.
    pub interval: u64,
}

/// Primary API for the tunnel subsystem.
pub trait TunnelApi {
    /// Register a tunnel, returning its ID.
    fn create_tunnel(&self, ctx: &mut Context<'_>, request: CreateTunnelRequest) -> Result<u64>;

    /// Replace signals and interval and reset the price snapshot.
    fn update_signals_and_interval(
        &self,
        ctx: &mut Context<'_>,
        request: UpdateSignalsRequest,
    ) -> Result<()>;

    /// Add a deposit.
    fn deposit(
        &self,
        ctx: &mut Context<'_>,
        tunnel_id: u64,
        depositor: Address,
        amount: Coins,
    ) -> Result<()>;

    /// Withdraw part or all of a deposit.
    fn withdraw(
        &self,
        ctx: &mut Context<'_>,
        tunnel_id: u64,
        withdrawer: Address,
        amount: Coins,
    ) -> Result<()>;

    /// Activate an inactive tunnel.
    fn activate(&self, ctx: &mut Context<'_>, tunnel_id: u64, creator: Address) -> Result<()>;

    /// Deactivate an active tunnel.
    fn deactivate(&self, ctx: &mut Context<'_>, tunnel_id: u64, creator: Address) -> Result<()>;

    /// Produce a packet now with every signal included.
    fn trigger(&self, ctx: &mut Context<'_>, tunnel_id: u64, creator: Address) -> Result<()>;

    /// Replace module params. Only the configured authority may call this.
    fn update_params(
        &self,
        ctx: &mut Context<'_>,
        authority: Address,
        params: TunnelParams,
    ) -> Result<()>;

    /// Per-block driver: produce packets for every active tunnel.
    ///
    /// Per-tunnel failures are absorbed into the summary; an error here
    /// means the active set references a missing tunnel.
    fn end_block(&self, ctx: &mut Context<'_>) -> Result<BatchSummary>;
}
