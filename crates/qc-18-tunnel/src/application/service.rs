//! Inbound message handlers. Each runs against a cached context and commits
//! all of its writes and events, or none of them.

use super::context::{apply_if_no_error, Context};
use super::keeper::TunnelKeeper;
use super::packet::BatchSummary;
use crate::config::TunnelParams;
use crate::domain::{prices_by_signal, Address, Coins, Result, Tunnel, TunnelError};
use crate::events::{DeactivationReason, TunnelEvent};
use crate::ports::{CreateTunnelRequest, KvStore, TunnelApi, UpdateSignalsRequest};
use tracing::info;

impl TunnelKeeper {
    /// Store the initial params of a fresh chain.
    pub fn init_genesis(&self, store: &mut dyn KvStore, params: &TunnelParams) -> Result<()> {
        self.set_params(store, params)?;
        info!(
            min_deposit = %params.min_deposit,
            base_packet_fee = %params.base_packet_fee,
            "[qc-18] Genesis params stored"
        );
        Ok(())
    }

    fn creator_tunnel(
        &self,
        store: &dyn KvStore,
        tunnel_id: u64,
        caller: &Address,
    ) -> Result<Tunnel> {
        let tunnel = self.get_tunnel(store, tunnel_id)?;
        if tunnel.creator != *caller {
            return Err(TunnelError::InvalidTunnelCreator {
                tunnel_id,
                caller: caller.to_string(),
            });
        }
        Ok(tunnel)
    }
}

impl TunnelApi for TunnelKeeper {
    fn create_tunnel(&self, ctx: &mut Context<'_>, request: CreateTunnelRequest) -> Result<u64> {
        apply_if_no_error(ctx, |ctx| {
            let params = self.params(ctx.store())?;
            let tunnel = self.add_tunnel(
                ctx,
                &params,
                request.route,
                request.signal_deviations,
                request.interval,
                request.creator,
            )?;

            if !request.initial_deposit.is_zero() {
                self.add_deposit(
                    ctx,
                    &params,
                    tunnel.id,
                    request.creator,
                    request.initial_deposit,
                )?;
            }
            Ok(tunnel.id)
        })
    }

    fn update_signals_and_interval(
        &self,
        ctx: &mut Context<'_>,
        request: UpdateSignalsRequest,
    ) -> Result<()> {
        apply_if_no_error(ctx, |ctx| {
            let params = self.params(ctx.store())?;
            self.creator_tunnel(ctx.store(), request.tunnel_id, &request.creator)?;
            self.update_and_reset_tunnel(
                ctx,
                &params,
                request.tunnel_id,
                request.signal_deviations,
                request.interval,
            )
        })
    }

    fn deposit(
        &self,
        ctx: &mut Context<'_>,
        tunnel_id: u64,
        depositor: Address,
        amount: Coins,
    ) -> Result<()> {
        apply_if_no_error(ctx, |ctx| {
            let params = self.params(ctx.store())?;
            self.add_deposit(ctx, &params, tunnel_id, depositor, amount)
        })
    }

    fn withdraw(
        &self,
        ctx: &mut Context<'_>,
        tunnel_id: u64,
        withdrawer: Address,
        amount: Coins,
    ) -> Result<()> {
        apply_if_no_error(ctx, |ctx| {
            let params = self.params(ctx.store())?;
            self.withdraw_deposit(ctx, &params, tunnel_id, amount, withdrawer)
        })
    }

    fn activate(&self, ctx: &mut Context<'_>, tunnel_id: u64, creator: Address) -> Result<()> {
        apply_if_no_error(ctx, |ctx| {
            let params = self.params(ctx.store())?;
            let tunnel = self.creator_tunnel(ctx.store(), tunnel_id, &creator)?;
            if tunnel.is_active {
                return Err(TunnelError::AlreadyActive(tunnel_id));
            }
            self.activate_tunnel(ctx, &params, tunnel_id)
        })
    }

    fn deactivate(&self, ctx: &mut Context<'_>, tunnel_id: u64, creator: Address) -> Result<()> {
        apply_if_no_error(ctx, |ctx| {
            let tunnel = self.creator_tunnel(ctx.store(), tunnel_id, &creator)?;
            if !tunnel.is_active {
                return Err(TunnelError::AlreadyInactive(tunnel_id));
            }
            self.deactivate_tunnel(ctx, tunnel_id, DeactivationReason::Requested)
        })
    }

    fn trigger(&self, ctx: &mut Context<'_>, tunnel_id: u64, creator: Address) -> Result<()> {
        apply_if_no_error(ctx, |ctx| {
            let params = self.params(ctx.store())?;
            let tunnel = self.creator_tunnel(ctx.store(), tunnel_id, &creator)?;
            if !tunnel.is_active {
                return Err(TunnelError::InactiveTunnel(tunnel_id));
            }

            let required = self.packet_fee(ctx.store(), &params, &tunnel)?;
            let available = self.deps.bank.spendable_coins(ctx.store(), &tunnel.fee_payer)?;
            if !available.is_all_gte(&required) {
                return Err(TunnelError::InsufficientFunds {
                    address: tunnel.fee_payer.to_string(),
                    required: required.to_string(),
                    available: available.to_string(),
                });
            }

            let feed_prices = prices_by_signal(
                &self
                    .deps
                    .feeds
                    .current_prices(ctx.store(), &tunnel.signal_ids()),
            );
            self.produce_packet(ctx, &params, tunnel_id, &feed_prices, true)?;

            info!(tunnel_id, "[qc-18] Tunnel triggered");
            ctx.emit(TunnelEvent::TunnelTriggered { tunnel_id });
            Ok(())
        })
    }

    fn update_params(
        &self,
        ctx: &mut Context<'_>,
        authority: Address,
        params: TunnelParams,
    ) -> Result<()> {
        if authority != *self.authority() {
            return Err(TunnelError::InvalidAuthority {
                expected: self.authority().to_string(),
                got: authority.to_string(),
            });
        }

        apply_if_no_error(ctx, |ctx| {
            self.set_params(ctx.store_mut(), &params)?;
            info!(
                min_deposit = %params.min_deposit,
                min_interval = params.min_interval,
                max_interval = params.max_interval,
                "[qc-18] Params updated"
            );
            ctx.emit(TunnelEvent::ParamsUpdated);
            Ok(())
        })
    }

    fn end_block(&self, ctx: &mut Context<'_>) -> Result<BatchSummary> {
        self.produce_active_tunnel_packets(ctx)
    }
}
