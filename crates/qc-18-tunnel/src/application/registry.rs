//! # Tunnel Registry
//!
//! Registration, configuration edits and the `Inactive <-> Active`
//! transitions.

use super::context::Context;
use super::keeper::TunnelKeeper;
use crate::algorithms::derive_fee_payer;
use crate::config::TunnelParams;
use crate::domain::{
    port_id_for_tunnel, Address, Coins, LatestPrices, Result, Route, SignalDeviation, Tunnel,
    TunnelError, TRANSFER_PORT,
};
use crate::events::{DeactivationReason, TunnelEvent};
use crate::ports::KvStore;
use tracing::{error, info, warn};

impl TunnelKeeper {
    /// Register a new inactive tunnel with a freshly derived fee payer.
    pub fn add_tunnel(
        &self,
        ctx: &mut Context<'_>,
        params: &TunnelParams,
        route: Route,
        signal_deviations: Vec<SignalDeviation>,
        interval: u64,
        creator: Address,
    ) -> Result<Tunnel> {
        route.validate()?;
        params.validate_signal_deviations(&signal_deviations)?;
        params.validate_interval(interval)?;

        let tunnel_id = self.tunnel_count(ctx.store())? + 1;
        let fee_payer = self.generate_tunnel_account(ctx, tunnel_id)?;

        let tunnel = Tunnel {
            id: tunnel_id,
            sequence: 0,
            route,
            fee_payer,
            signal_deviations,
            interval,
            total_deposit: Coins::new(),
            is_active: false,
            created_at: ctx.block_time(),
            creator,
        };

        let store = ctx.store_mut();
        self.set_tunnel(store, &tunnel)?;
        self.set_tunnel_count(store, tunnel_id)?;
        self.set_latest_prices(store, &LatestPrices::reset(tunnel_id, &tunnel.signal_deviations))?;

        info!(
            tunnel_id,
            route = tunnel.route.kind(),
            interval,
            signals = tunnel.signal_deviations.len(),
            fee_payer = %fee_payer,
            "[qc-18] Tunnel created"
        );
        ctx.emit(TunnelEvent::TunnelCreated {
            tunnel_id,
            route: tunnel.route.to_string(),
            interval,
            fee_payer,
            creator,
            signal_deviations: tunnel.signal_deviations.clone(),
        });

        Ok(tunnel)
    }

    /// Replace signals and interval; the price snapshot restarts from zero.
    pub fn update_and_reset_tunnel(
        &self,
        ctx: &mut Context<'_>,
        params: &TunnelParams,
        tunnel_id: u64,
        signal_deviations: Vec<SignalDeviation>,
        interval: u64,
    ) -> Result<()> {
        params.validate_signal_deviations(&signal_deviations)?;
        params.validate_interval(interval)?;

        let mut tunnel = self.get_tunnel(ctx.store(), tunnel_id)?;
        tunnel.signal_deviations = signal_deviations;
        tunnel.interval = interval;

        let store = ctx.store_mut();
        self.set_tunnel(store, &tunnel)?;
        self.set_latest_prices(store, &LatestPrices::reset(tunnel_id, &tunnel.signal_deviations))?;

        info!(tunnel_id, interval, "[qc-18] Tunnel signals and interval updated");
        ctx.emit(TunnelEvent::SignalsAndIntervalUpdated {
            tunnel_id,
            interval,
            signal_deviations: tunnel.signal_deviations,
        });
        Ok(())
    }

    /// Move a tunnel into the active set.
    ///
    /// Requires the total deposit to cover `min_deposit` and the route to
    /// report ready.
    pub fn activate_tunnel(
        &self,
        ctx: &mut Context<'_>,
        params: &TunnelParams,
        tunnel_id: u64,
    ) -> Result<()> {
        let mut tunnel = self.get_tunnel(ctx.store(), tunnel_id)?;

        if !tunnel.total_deposit.is_all_gte(&params.min_deposit) {
            return Err(TunnelError::InsufficientDeposit {
                required: params.min_deposit.to_string(),
                available: tunnel.total_deposit.to_string(),
            });
        }
        if !self.is_route_ready(ctx.store(), params, &tunnel) {
            return Err(TunnelError::RouteNotReady(tunnel_id));
        }

        tunnel.is_active = true;
        let store = ctx.store_mut();
        self.set_active_tunnel_id(store, tunnel_id);
        self.set_tunnel(store, &tunnel)?;

        info!(tunnel_id, "[qc-18] Tunnel activated");
        ctx.emit(TunnelEvent::TunnelActivated { tunnel_id });
        Ok(())
    }

    /// Remove a tunnel from the active set. Safe on an inactive tunnel.
    pub fn deactivate_tunnel(
        &self,
        ctx: &mut Context<'_>,
        tunnel_id: u64,
        reason: DeactivationReason,
    ) -> Result<()> {
        let mut tunnel = self.get_tunnel(ctx.store(), tunnel_id)?;

        tunnel.is_active = false;
        let store = ctx.store_mut();
        self.delete_active_tunnel_id(store, tunnel_id);
        self.set_tunnel(store, &tunnel)?;

        match reason {
            DeactivationReason::Requested => info!(tunnel_id, "[qc-18] Tunnel deactivated"),
            _ => warn!(tunnel_id, reason = ?reason, "[qc-18] Tunnel deactivated automatically"),
        }
        ctx.emit(TunnelEvent::TunnelDeactivated { tunnel_id, reason });
        Ok(())
    }

    /// Whether the tunnel's route can accept packets now.
    pub fn is_route_ready(
        &self,
        store: &dyn KvStore,
        params: &TunnelParams,
        tunnel: &Tunnel,
    ) -> bool {
        let transfer_channel_open = |channel_id: &str| {
            !channel_id.is_empty()
                && self.deps.channels.has_channel(store, TRANSFER_PORT, channel_id)
        };

        match &tunnel.route {
            Route::Tss(_) => self.deps.tss.is_ready(store),
            Route::Ibc(r) => {
                self.deps
                    .channels
                    .has_capability(store, &port_id_for_tunnel(tunnel.id), &r.channel_id)
            }
            Route::IbcHook(r) => transfer_channel_open(&r.channel_id),
            Route::Axelar(_) => transfer_channel_open(&params.routes.axelar_ibc_channel),
            Route::Router(_) => transfer_channel_open(&params.routes.router_ibc_channel),
            Route::HyperlaneStride(_) => {
                transfer_channel_open(&params.routes.hyperlane_stride_ibc_channel)
            }
        }
    }

    /// Derive and register the fee-payer account of a new tunnel.
    ///
    /// A collision with an existing account is an invariant violation.
    pub fn generate_tunnel_account(
        &self,
        ctx: &mut Context<'_>,
        tunnel_id: u64,
    ) -> Result<Address> {
        let block = ctx.block();
        let address = derive_fee_payer(tunnel_id, &block.app_hash, &block.data_hash);

        if self.deps.accounts.has_account(ctx.store(), &address) {
            error!(
                tunnel_id,
                address = %address,
                "[qc-18] Derived fee payer collides with an existing account"
            );
            return Err(TunnelError::AccountAlreadyExists(address.to_string()));
        }

        self.deps.accounts.new_account(ctx.store_mut(), &address)?;
        Ok(address)
    }
}
