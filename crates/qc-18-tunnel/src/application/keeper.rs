//! # Tunnel Keeper
//!
//! Owns the tunnel store layout and the collaborator handles. The
//! lifecycle, ledger, packet and dispatch operations are implemented on
//! [`TunnelKeeper`] in their own modules; this file holds state access and
//! queries.

use crate::algorithms::account::MODULE_NAME;
use crate::config::TunnelParams;
use crate::domain::keys::{self, ACTIVE_SENTINEL, ACTIVE_TUNNEL_PREFIX, TUNNEL_PREFIX};
use crate::domain::{
    invariant_contiguous_sequences, invariant_deposit_conservation, Address, Deposit,
    LatestPrices, Packet, Result, TotalFees, Tunnel, TunnelError,
};
use crate::ports::{
    AccountKeeper, BankKeeper, ChannelKeeper, FeedsKeeper, KvStore, TransferKeeper,
    TssCoordinator,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

/// External collaborators of the tunnel module.
#[derive(Clone)]
pub struct Collaborators {
    /// Balance ledger.
    pub bank: Arc<dyn BankKeeper>,
    /// Account registry.
    pub accounts: Arc<dyn AccountKeeper>,
    /// Price feed.
    pub feeds: Arc<dyn FeedsKeeper>,
    /// Threshold-signing coordinator.
    pub tss: Arc<dyn TssCoordinator>,
    /// Channel transport.
    pub channels: Arc<dyn ChannelKeeper>,
    /// Token transfer transport.
    pub transfer: Arc<dyn TransferKeeper>,
}

/// Tunnel filter for [`TunnelKeeper::tunnels`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TunnelFilter {
    /// Every tunnel.
    #[default]
    All,
    /// Active tunnels only.
    Active,
    /// Inactive tunnels only.
    Inactive,
}

/// Tunnel subsystem keeper.
pub struct TunnelKeeper {
    pub(crate) deps: Collaborators,
    authority: Address,
}

pub(crate) fn get_record<T: DeserializeOwned>(
    store: &dyn KvStore,
    key: &[u8],
) -> Result<Option<T>> {
    store
        .get(key)
        .map(|bytes| bincode::deserialize(&bytes))
        .transpose()
        .map_err(Into::into)
}

pub(crate) fn set_record<T: Serialize>(
    store: &mut dyn KvStore,
    key: &[u8],
    value: &T,
) -> Result<()> {
    store.set(key, bincode::serialize(value)?);
    Ok(())
}

impl TunnelKeeper {
    /// Create a keeper whose params may only be changed by `authority`.
    pub fn new(deps: Collaborators, authority: Address) -> Self {
        Self { deps, authority }
    }

    /// Params authority.
    pub fn authority(&self) -> &Address {
        &self.authority
    }

    /// Escrow account holding deposits and collected fees.
    pub fn module_address() -> Address {
        Address::module(MODULE_NAME)
    }

    // =========================================================================
    // Params
    // =========================================================================

    /// Stored params, or the defaults before any were set.
    pub fn params(&self, store: &dyn KvStore) -> Result<TunnelParams> {
        Ok(get_record(store, keys::PARAMS_KEY)?.unwrap_or_default())
    }

    /// Validate and store params.
    pub fn set_params(&self, store: &mut dyn KvStore, params: &TunnelParams) -> Result<()> {
        params.validate()?;
        set_record(store, keys::PARAMS_KEY, params)
    }

    // =========================================================================
    // Tunnels
    // =========================================================================

    /// Number of tunnels ever registered (also the last assigned ID).
    pub fn tunnel_count(&self, store: &dyn KvStore) -> Result<u64> {
        Ok(get_record(store, keys::TUNNEL_COUNT_KEY)?.unwrap_or(0))
    }

    pub(crate) fn set_tunnel_count(&self, store: &mut dyn KvStore, count: u64) -> Result<()> {
        set_record(store, keys::TUNNEL_COUNT_KEY, &count)
    }

    /// Tunnel by ID.
    pub fn get_tunnel(&self, store: &dyn KvStore, tunnel_id: u64) -> Result<Tunnel> {
        get_record(store, &keys::tunnel_key(tunnel_id))?
            .ok_or(TunnelError::TunnelNotFound(tunnel_id))
    }

    pub(crate) fn set_tunnel(&self, store: &mut dyn KvStore, tunnel: &Tunnel) -> Result<()> {
        set_record(store, &keys::tunnel_key(tunnel.id), tunnel)
    }

    /// Tunnels in ascending ID order.
    pub fn tunnels(&self, store: &dyn KvStore, filter: TunnelFilter) -> Result<Vec<Tunnel>> {
        let mut tunnels = Vec::new();
        for (_, bytes) in store.prefix_scan(&[TUNNEL_PREFIX]) {
            let tunnel: Tunnel = bincode::deserialize(&bytes)?;
            let keep = match filter {
                TunnelFilter::All => true,
                TunnelFilter::Active => tunnel.is_active,
                TunnelFilter::Inactive => !tunnel.is_active,
            };
            if keep {
                tunnels.push(tunnel);
            }
        }
        Ok(tunnels)
    }

    // =========================================================================
    // Active set
    // =========================================================================

    /// Active tunnel IDs in ascending order.
    pub fn active_tunnel_ids(&self, store: &dyn KvStore) -> Result<Vec<u64>> {
        store
            .prefix_scan(&[ACTIVE_TUNNEL_PREFIX])
            .into_iter()
            .map(|(key, _)| {
                keys::tunnel_id_from_key(&key).ok_or_else(|| {
                    TunnelError::CorruptedState(format!(
                        "malformed active key {}",
                        hex::encode(&key)
                    ))
                })
            })
            .collect()
    }

    pub(crate) fn set_active_tunnel_id(&self, store: &mut dyn KvStore, tunnel_id: u64) {
        store.set(&keys::active_tunnel_key(tunnel_id), ACTIVE_SENTINEL.to_vec());
    }

    pub(crate) fn delete_active_tunnel_id(&self, store: &mut dyn KvStore, tunnel_id: u64) {
        store.delete(&keys::active_tunnel_key(tunnel_id));
    }

    // =========================================================================
    // Deposits
    // =========================================================================

    /// Deposit of `depositor` on a tunnel.
    pub fn get_deposit(
        &self,
        store: &dyn KvStore,
        tunnel_id: u64,
        depositor: &Address,
    ) -> Result<Deposit> {
        get_record(store, &keys::deposit_key(tunnel_id, depositor))?.ok_or_else(|| {
            TunnelError::DepositNotFound {
                tunnel_id,
                depositor: depositor.to_string(),
            }
        })
    }

    pub(crate) fn set_deposit(&self, store: &mut dyn KvStore, deposit: &Deposit) -> Result<()> {
        set_record(store, &keys::deposit_key(deposit.tunnel_id, &deposit.depositor), deposit)
    }

    pub(crate) fn delete_deposit(
        &self,
        store: &mut dyn KvStore,
        tunnel_id: u64,
        depositor: &Address,
    ) {
        store.delete(&keys::deposit_key(tunnel_id, depositor));
    }

    /// All deposits of a tunnel, ordered by depositor address.
    pub fn deposits(&self, store: &dyn KvStore, tunnel_id: u64) -> Result<Vec<Deposit>> {
        store
            .prefix_scan(&keys::deposits_prefix(tunnel_id))
            .into_iter()
            .map(|(_, bytes)| bincode::deserialize(&bytes).map_err(Into::into))
            .collect()
    }

    // =========================================================================
    // Latest prices
    // =========================================================================

    /// Last relayed prices of a tunnel.
    pub fn latest_prices(&self, store: &dyn KvStore, tunnel_id: u64) -> Result<LatestPrices> {
        get_record(store, &keys::latest_prices_key(tunnel_id))?.ok_or_else(|| {
            TunnelError::CorruptedState(format!("latest prices missing for tunnel {tunnel_id}"))
        })
    }

    pub(crate) fn set_latest_prices(
        &self,
        store: &mut dyn KvStore,
        latest: &LatestPrices,
    ) -> Result<()> {
        set_record(store, &keys::latest_prices_key(latest.tunnel_id), latest)
    }

    // =========================================================================
    // Packets
    // =========================================================================

    /// Packet by tunnel and sequence.
    pub fn get_packet(&self, store: &dyn KvStore, tunnel_id: u64, sequence: u64) -> Result<Packet> {
        get_record(store, &keys::packet_key(tunnel_id, sequence))?
            .ok_or(TunnelError::PacketNotFound { tunnel_id, sequence })
    }

    pub(crate) fn set_packet(&self, store: &mut dyn KvStore, packet: &Packet) -> Result<()> {
        set_record(store, &keys::packet_key(packet.tunnel_id, packet.sequence), packet)
    }

    /// All packets of a tunnel in sequence order.
    pub fn packets(&self, store: &dyn KvStore, tunnel_id: u64) -> Result<Vec<Packet>> {
        store
            .prefix_scan(&keys::packets_prefix(tunnel_id))
            .into_iter()
            .map(|(_, bytes)| bincode::deserialize(&bytes).map_err(Into::into))
            .collect()
    }

    // =========================================================================
    // Total fees
    // =========================================================================

    /// Running total of collected base fees.
    pub fn total_fees(&self, store: &dyn KvStore) -> Result<TotalFees> {
        Ok(get_record(store, keys::TOTAL_FEES_KEY)?.unwrap_or_default())
    }

    pub(crate) fn set_total_fees(&self, store: &mut dyn KvStore, total: &TotalFees) -> Result<()> {
        set_record(store, keys::TOTAL_FEES_KEY, total)
    }

    // =========================================================================
    // Invariants
    // =========================================================================

    /// Check deposit conservation, sequence contiguity and active-set
    /// consistency for every tunnel.
    pub fn check_invariants(&self, store: &dyn KvStore) -> Result<()> {
        let active_ids = self.active_tunnel_ids(store)?;

        for tunnel in self.tunnels(store, TunnelFilter::All)? {
            invariant_deposit_conservation(&tunnel, &self.deposits(store, tunnel.id)?)?;
            invariant_contiguous_sequences(&tunnel, &self.packets(store, tunnel.id)?)?;

            if tunnel.is_active != active_ids.contains(&tunnel.id) {
                return Err(TunnelError::CorruptedState(format!(
                    "tunnel {} active flag disagrees with the active set",
                    tunnel.id
                )));
            }
        }

        for id in active_ids {
            self.get_tunnel(store, id).map_err(|_| {
                TunnelError::CorruptedState(format!("active set references missing tunnel {id}"))
            })?;
        }
        Ok(())
    }
}
