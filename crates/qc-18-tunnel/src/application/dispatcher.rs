//! # Route Dispatcher
//!
//! Encodes a packet for its route's wire protocol and hands it to the
//! matching transport. A fault anywhere below [`TunnelKeeper::send_to_route`]
//! is caught there and returned as [`TunnelError::SendPacketPanic`]; the
//! writes staged by the faulting send are discarded.

use super::context::{apply_if_no_error, Context};
use super::keeper::TunnelKeeper;
use crate::algorithms::encode_packet;
use crate::algorithms::memo;
use crate::config::TunnelParams;
use crate::domain::{
    hook_denom, port_id_for_tunnel, AxelarRoute, Coins, HyperlaneStrideRoute, IbcHookRoute,
    IbcRoute, Packet, PacketReceipt, Result, Route, RouterRoute, TssRoute, Tunnel, TunnelError,
    TRANSFER_PORT,
};
use crate::ports::{SigningRequest, TransferRequest};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, warn};

const NANOS_PER_SECOND: u64 = 1_000_000_000;

/// Timeout of an outgoing message: `now + 2 * interval`, in unix nanoseconds.
pub fn timeout_timestamp(now: i64, interval: u64) -> Result<u64> {
    let now = u64::try_from(now)
        .map_err(|_| TunnelError::Encoding(format!("negative block time {now}")))?;

    interval
        .checked_mul(2)
        .and_then(|span| span.checked_add(now))
        .and_then(|secs| secs.checked_mul(NANOS_PER_SECOND))
        .ok_or_else(|| TunnelError::Encoding("timeout timestamp overflow".into()))
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl TunnelKeeper {
    /// Send `packet` over `tunnel`'s route and return the receipt.
    pub fn send_to_route(
        &self,
        ctx: &mut Context<'_>,
        params: &TunnelParams,
        tunnel: &Tunnel,
        packet: &Packet,
    ) -> Result<PacketReceipt> {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            apply_if_no_error(ctx, |child| self.dispatch(child, params, tunnel, packet))
        }));

        match outcome {
            Ok(result) => result,
            Err(payload) => {
                let reason = panic_reason(payload.as_ref());
                warn!(
                    tunnel_id = tunnel.id,
                    sequence = packet.sequence,
                    route = tunnel.route.kind(),
                    reason = %reason,
                    "[qc-18] Route send panicked"
                );
                Err(TunnelError::SendPacketPanic(reason))
            }
        }
    }

    fn dispatch(
        &self,
        ctx: &mut Context<'_>,
        params: &TunnelParams,
        tunnel: &Tunnel,
        packet: &Packet,
    ) -> Result<PacketReceipt> {
        let receipt = match &tunnel.route {
            Route::Tss(route) => self.send_tss_packet(ctx, route, tunnel, packet)?,
            Route::Ibc(route) => self.send_ibc_packet(ctx, route, tunnel, packet)?,
            Route::IbcHook(route) => self.send_ibc_hook_packet(ctx, route, tunnel, packet)?,
            Route::Axelar(route) => self.send_axelar_packet(ctx, params, route, tunnel, packet)?,
            Route::Router(route) => self.send_router_packet(ctx, params, route, tunnel, packet)?,
            Route::HyperlaneStride(route) => {
                self.send_hyperlane_stride_packet(ctx, params, route, tunnel, packet)?
            }
        };

        debug!(
            tunnel_id = tunnel.id,
            sequence = packet.sequence,
            receipt = ?receipt,
            "[qc-18] Packet dispatched"
        );
        Ok(receipt)
    }

    fn send_tss_packet(
        &self,
        ctx: &mut Context<'_>,
        route: &TssRoute,
        tunnel: &Tunnel,
        packet: &Packet,
    ) -> Result<PacketReceipt> {
        let request = SigningRequest {
            tunnel_id: tunnel.id,
            destination_chain_id: route.destination_chain_id.clone(),
            destination_contract_address: route.destination_contract_address.clone(),
            fee_payer: tunnel.fee_payer,
            payload: encode_packet(packet),
            fee_limit: packet.route_fee.clone(),
        };
        let signing_id = self.deps.tss.request_signing(ctx.store_mut(), request)?;
        Ok(PacketReceipt::Tss { signing_id })
    }

    fn send_ibc_packet(
        &self,
        ctx: &mut Context<'_>,
        route: &IbcRoute,
        tunnel: &Tunnel,
        packet: &Packet,
    ) -> Result<PacketReceipt> {
        let timeout = timeout_timestamp(ctx.block_time(), tunnel.interval)?;
        let sequence = self.deps.channels.send_packet(
            ctx.store_mut(),
            &port_id_for_tunnel(tunnel.id),
            &route.channel_id,
            timeout,
            encode_packet(packet),
        )?;
        Ok(PacketReceipt::Ibc { sequence })
    }

    fn send_ibc_hook_packet(
        &self,
        ctx: &mut Context<'_>,
        route: &IbcHookRoute,
        tunnel: &Tunnel,
        packet: &Packet,
    ) -> Result<PacketReceipt> {
        let hook_coin = Coins::single(hook_denom(tunnel.id), 1);
        self.deps
            .bank
            .mint_coins(ctx.store_mut(), &tunnel.fee_payer, &hook_coin)?;

        let sequence = self.transfer_with_memo(
            ctx,
            tunnel,
            &route.channel_id,
            hook_coin,
            route.destination_contract_address.clone(),
            memo::ibc_hook_memo(route, packet),
        )?;
        Ok(PacketReceipt::IbcHook { sequence })
    }

    fn send_axelar_packet(
        &self,
        ctx: &mut Context<'_>,
        params: &TunnelParams,
        route: &AxelarRoute,
        tunnel: &Tunnel,
        packet: &Packet,
    ) -> Result<PacketReceipt> {
        let memo = memo::axelar_memo(
            route,
            &route.fee,
            &params.routes.axelar_fee_recipient,
            &tunnel.fee_payer.to_string(),
            &encode_packet(packet),
        );
        let sequence = self.transfer_with_memo(
            ctx,
            tunnel,
            &params.routes.axelar_ibc_channel,
            Coins::from(route.fee.clone()),
            params.routes.axelar_gmp_account.clone(),
            memo,
        )?;
        Ok(PacketReceipt::Axelar { sequence })
    }

    fn send_router_packet(
        &self,
        ctx: &mut Context<'_>,
        params: &TunnelParams,
        route: &RouterRoute,
        tunnel: &Tunnel,
        packet: &Packet,
    ) -> Result<PacketReceipt> {
        let sequence = self.transfer_with_memo(
            ctx,
            tunnel,
            &params.routes.router_ibc_channel,
            Coins::from(route.fee.clone()),
            route.bridge_contract_address.clone(),
            memo::router_memo(route, &encode_packet(packet)),
        )?;
        Ok(PacketReceipt::Router { sequence })
    }

    fn send_hyperlane_stride_packet(
        &self,
        ctx: &mut Context<'_>,
        params: &TunnelParams,
        route: &HyperlaneStrideRoute,
        tunnel: &Tunnel,
        packet: &Packet,
    ) -> Result<PacketReceipt> {
        let contract = &params.routes.hyperlane_stride_integration_contract;
        let sequence = self.transfer_with_memo(
            ctx,
            tunnel,
            &params.routes.hyperlane_stride_ibc_channel,
            Coins::from(route.fee.clone()),
            contract.clone(),
            memo::hyperlane_stride_memo(route, contract, &encode_packet(packet)),
        )?;
        Ok(PacketReceipt::HyperlaneStride { sequence })
    }

    fn transfer_with_memo(
        &self,
        ctx: &mut Context<'_>,
        tunnel: &Tunnel,
        channel_id: &str,
        token: Coins,
        receiver: String,
        memo: String,
    ) -> Result<u64> {
        if channel_id.is_empty() {
            return Err(TunnelError::RouteNotReady(tunnel.id));
        }

        let request = TransferRequest {
            source_port: TRANSFER_PORT.to_string(),
            source_channel: channel_id.to_string(),
            token,
            sender: tunnel.fee_payer,
            receiver,
            timeout_timestamp: timeout_timestamp(ctx.block_time(), tunnel.interval)?,
            memo,
        };
        self.deps.transfer.transfer(ctx.store_mut(), request)
    }
}
