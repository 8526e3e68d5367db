//! # Domain Invariants
//!
//! State rules every committed write set must preserve.

use super::entities::{Deposit, Packet, Tunnel};
use super::errors::{Result, TunnelError};
use super::value_objects::Coins;

/// Invariant: deposit conservation.
///
/// The deposits recorded for a tunnel sum exactly to its total deposit.
pub fn invariant_deposit_conservation(tunnel: &Tunnel, deposits: &[Deposit]) -> Result<()> {
    let sum = deposits
        .iter()
        .filter(|d| d.tunnel_id == tunnel.id)
        .try_fold(Coins::new(), |acc, d| acc.checked_add(&d.amount))
        .ok_or_else(|| {
            TunnelError::CorruptedState(format!("tunnel {} deposits overflow", tunnel.id))
        })?;

    if sum != tunnel.total_deposit {
        return Err(TunnelError::CorruptedState(format!(
            "tunnel {} deposits sum to {sum} but total deposit is {}",
            tunnel.id, tunnel.total_deposit
        )));
    }
    Ok(())
}

/// Invariant: packet sequences are exactly `1..=tunnel.sequence`.
///
/// `packets` must be in ascending sequence order.
pub fn invariant_contiguous_sequences(tunnel: &Tunnel, packets: &[Packet]) -> Result<()> {
    if packets.len() as u64 != tunnel.sequence {
        return Err(TunnelError::CorruptedState(format!(
            "tunnel {} has sequence {} but {} packets",
            tunnel.id,
            tunnel.sequence,
            packets.len()
        )));
    }
    for (expected, packet) in (1u64..).zip(packets) {
        if packet.tunnel_id != tunnel.id || packet.sequence != expected {
            return Err(TunnelError::CorruptedState(format!(
                "tunnel {} packet gap: expected sequence {expected}, found {}",
                tunnel.id, packet.sequence
            )));
        }
    }
    Ok(())
}
