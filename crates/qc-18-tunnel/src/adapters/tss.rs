//! # In-Memory Signing Coordinator
//!
//! Accepts signing requests, charges the signing fee to the fee payer and
//! records each request in the store under a sequential correlation ID.

use crate::adapters::bank::InMemoryBank;
use crate::domain::{Address, Coins, Result, TunnelError};
use crate::ports::{BankKeeper, KvStore, SigningRequest, TssCoordinator};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// Signing request counter.
pub const SIGNING_COUNT_KEY: &[u8] = &[0xE2];
/// Signing records, keyed by big-endian signing ID.
pub const SIGNING_PREFIX: u8 = 0xE3;

/// A stored signing request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningRecord {
    /// Correlation ID.
    pub signing_id: u64,
    /// Originating tunnel.
    pub tunnel_id: u64,
    /// Destination chain ID.
    pub destination_chain_id: String,
    /// Destination contract address.
    pub destination_contract_address: String,
    /// Message to sign.
    pub payload: Vec<u8>,
    /// Fee charged.
    pub fee: Coins,
}

fn signing_key(signing_id: u64) -> Vec<u8> {
    let mut key = vec![SIGNING_PREFIX];
    key.extend_from_slice(&signing_id.to_be_bytes());
    key
}

/// Threshold-signing coordinator double.
#[derive(Debug)]
pub struct InMemoryTss {
    bank: InMemoryBank,
    fee: Coins,
    ready: AtomicBool,
    reject: AtomicBool,
}

impl InMemoryTss {
    /// Coordinator charging `fee` per request.
    pub fn new(fee: Coins) -> Self {
        Self {
            bank: InMemoryBank,
            fee,
            ready: AtomicBool::new(true),
            reject: AtomicBool::new(false),
        }
    }

    /// Account collecting signing fees.
    pub fn fee_collector() -> Address {
        Address::module("bandtss")
    }

    /// Toggle group readiness.
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    /// Make every following request fail.
    pub fn set_reject(&self, reject: bool) {
        self.reject.store(reject, Ordering::SeqCst);
    }

    /// Stored request by ID.
    pub fn signing(&self, store: &dyn KvStore, signing_id: u64) -> Result<Option<SigningRecord>> {
        store
            .get(&signing_key(signing_id))
            .map(|bytes| bincode::deserialize(&bytes))
            .transpose()
            .map_err(Into::into)
    }
}

impl TssCoordinator for InMemoryTss {
    fn is_ready(&self, _store: &dyn KvStore) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    fn signing_fee(&self, _store: &dyn KvStore) -> Result<Coins> {
        Ok(self.fee.clone())
    }

    fn request_signing(&self, store: &mut dyn KvStore, request: SigningRequest) -> Result<u64> {
        if !self.is_ready(store) {
            return Err(TunnelError::Signing("coordinator is not ready".into()));
        }
        if self.reject.load(Ordering::SeqCst) {
            return Err(TunnelError::Signing("signing request rejected".into()));
        }
        if !request.fee_limit.is_all_gte(&self.fee) {
            return Err(TunnelError::Signing(format!(
                "fee limit {} below signing fee {}",
                request.fee_limit, self.fee
            )));
        }

        self.bank
            .send_coins(store, &request.fee_payer, &Self::fee_collector(), &self.fee)?;

        let signing_id = match store.get(SIGNING_COUNT_KEY) {
            Some(bytes) => bincode::deserialize::<u64>(&bytes)? + 1,
            None => 1,
        };
        store.set(SIGNING_COUNT_KEY, bincode::serialize(&signing_id)?);

        let record = SigningRecord {
            signing_id,
            tunnel_id: request.tunnel_id,
            destination_chain_id: request.destination_chain_id,
            destination_contract_address: request.destination_contract_address,
            payload: request.payload,
            fee: self.fee.clone(),
        };
        store.set(&signing_key(signing_id), bincode::serialize(&record)?);

        debug!(signing_id, tunnel_id = record.tunnel_id, "[qc-18] Signing requested");
        Ok(signing_id)
    }
}
