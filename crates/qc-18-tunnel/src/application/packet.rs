//! # Packet Factory and Batch Scheduler
//!
//! Per-block packet production for the active set. Each tunnel's attempt
//! runs in its own cached context: either every write of the attempt
//! (fee charge, sequence, packet, receipt, price snapshot) commits, or none
//! does.

use super::context::{apply_if_no_error, Context};
use super::keeper::TunnelKeeper;
use crate::algorithms::generate_new_prices;
use crate::config::TunnelParams;
use crate::domain::{prices_by_signal, Packet, Price, Result, TunnelError};
use crate::events::{DeactivationReason, TunnelEvent};
use std::collections::BTreeMap;
use tracing::{debug, error, info, warn};

/// Outcome of one batch run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// `(tunnel_id, sequence)` of each produced packet.
    pub produced: Vec<(u64, u64)>,
    /// Tunnels whose attempt was rolled back.
    pub failed: Vec<u64>,
    /// Tunnels deactivated for lack of funds.
    pub deactivated: Vec<u64>,
}

impl TunnelKeeper {
    /// Produce packets for every active tunnel, in ascending ID order.
    ///
    /// Every error raised by one tunnel's attempt is absorbed: the attempt
    /// is rolled back and a `PacketProductionFailed` event is emitted. Only
    /// an active ID without a tunnel record aborts the batch.
    pub fn produce_active_tunnel_packets(&self, ctx: &mut Context<'_>) -> Result<BatchSummary> {
        let params = self.params(ctx.store())?;
        let ids = self.active_tunnel_ids(ctx.store())?;
        let feed_prices = prices_by_signal(&self.deps.feeds.all_prices(ctx.store()));

        let mut summary = BatchSummary::default();
        for tunnel_id in ids {
            let tunnel = self.get_tunnel(ctx.store(), tunnel_id).map_err(|err| {
                error!(tunnel_id, error = %err, "[qc-18] Active set references a missing tunnel");
                TunnelError::CorruptedState(format!("active tunnel {tunnel_id} not found"))
            })?;

            let funded = self.has_enough_fund_to_create_packet(ctx.store(), &params, &tunnel);
            let attempt = match funded {
                Ok(true) => apply_if_no_error(ctx, |child| {
                    self.produce_packet(child, &params, tunnel_id, &feed_prices, false)
                }),
                Ok(false) => {
                    self.deactivate_tunnel(ctx, tunnel_id, DeactivationReason::InsufficientFunds)?;
                    summary.deactivated.push(tunnel_id);
                    continue;
                }
                Err(err) => Err(err),
            };

            match attempt {
                Ok(Some(packet)) => summary.produced.push((tunnel_id, packet.sequence)),
                Ok(None) => {}
                Err(err) => {
                    if err.is_fatal() {
                        error!(tunnel_id, error = %err, "[qc-18] Tunnel state corrupted");
                    } else {
                        warn!(tunnel_id, error = %err, "[qc-18] Packet production failed");
                    }
                    ctx.emit(TunnelEvent::PacketProductionFailed {
                        tunnel_id,
                        reason: err.to_string(),
                    });
                    summary.failed.push(tunnel_id);
                }
            }
        }

        if !summary.produced.is_empty() || !summary.failed.is_empty() {
            info!(
                height = ctx.block().height,
                produced = summary.produced.len(),
                failed = summary.failed.len(),
                deactivated = summary.deactivated.len(),
                "[qc-18] Batch complete"
            );
        }
        Ok(summary)
    }

    /// Evaluate triggers for one tunnel and, if due, create and send a
    /// packet. Returns `None` when no price qualified.
    ///
    /// Callers run this inside [`apply_if_no_error`]; on error the partial
    /// writes must be discarded.
    pub fn produce_packet(
        &self,
        ctx: &mut Context<'_>,
        params: &TunnelParams,
        tunnel_id: u64,
        feed_prices: &BTreeMap<String, Price>,
        force_send_all: bool,
    ) -> Result<Option<Packet>> {
        let now = ctx.block_time();
        let tunnel = self.get_tunnel(ctx.store(), tunnel_id)?;
        let mut latest = self.latest_prices(ctx.store(), tunnel_id)?;

        let interval = i64::try_from(tunnel.interval).unwrap_or(i64::MAX);
        let send_all = force_send_all || now >= latest.last_interval.saturating_add(interval);

        let new_prices = generate_new_prices(
            &tunnel.signal_deviations,
            &prices_by_signal(&latest.prices),
            feed_prices,
            send_all,
        );
        if new_prices.is_empty() {
            debug!(tunnel_id, "[qc-18] No price crossed a hard band");
            return Ok(None);
        }

        let packet = self.create_packet(ctx, params, tunnel_id, new_prices.clone())?;
        let packet = self.send_packet(ctx, params, packet)?;

        latest.update_prices(&new_prices);
        if send_all {
            latest.last_interval = now;
        }
        self.set_latest_prices(ctx.store_mut(), &latest)?;

        info!(
            tunnel_id,
            sequence = packet.sequence,
            prices = new_prices.len(),
            send_all,
            "[qc-18] Packet produced"
        );
        ctx.emit(TunnelEvent::PacketProduced {
            tunnel_id,
            sequence: packet.sequence,
        });
        Ok(Some(packet))
    }

    /// Charge the base fee, assign the next sequence and store the packet.
    ///
    /// The fee charge and the sequence increment commit together.
    pub fn create_packet(
        &self,
        ctx: &mut Context<'_>,
        params: &TunnelParams,
        tunnel_id: u64,
        prices: Vec<Price>,
    ) -> Result<Packet> {
        apply_if_no_error(ctx, |ctx| {
            let mut tunnel = self.get_tunnel(ctx.store(), tunnel_id)?;

            self.deduct_base_packet_fee(ctx, params, &tunnel.fee_payer)?;
            let route_fee = self.route_fee(ctx.store(), &tunnel.route)?;

            tunnel.sequence = tunnel.sequence.checked_add(1).ok_or_else(|| {
                TunnelError::CorruptedState(format!("tunnel {tunnel_id} sequence overflow"))
            })?;

            let packet = Packet {
                tunnel_id,
                sequence: tunnel.sequence,
                prices,
                base_fee: params.base_packet_fee.clone(),
                route_fee,
                created_at: ctx.block_time(),
                receipt: None,
            };

            let store = ctx.store_mut();
            self.set_tunnel(store, &tunnel)?;
            self.set_packet(store, &packet)?;
            Ok(packet)
        })
    }

    /// Hand a stored packet to its route and record the receipt.
    pub fn send_packet(
        &self,
        ctx: &mut Context<'_>,
        params: &TunnelParams,
        mut packet: Packet,
    ) -> Result<Packet> {
        let tunnel = self.get_tunnel(ctx.store(), packet.tunnel_id)?;

        let receipt = self.send_to_route(ctx, params, &tunnel, &packet)?;
        packet.receipt = Some(receipt);
        self.set_packet(ctx.store_mut(), &packet)?;
        Ok(packet)
    }
}
