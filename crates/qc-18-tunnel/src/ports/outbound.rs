//! # Outbound Ports (Driven Side)
//!
//! Contracts this subsystem requires from the rest of the node: the balance
//! ledger, the account registry, the price feed, the threshold-signing
//! coordinator and the cross-chain transport.
//!
//! Every call that mutates state receives the caller's store so the write
//! lands in the same staged buffer as the tunnel's own records.

use crate::domain::{Address, Coins, Price, Result};
use crate::ports::KvStore;

/// Balance ledger.
pub trait BankKeeper: Send + Sync {
    /// Spendable balance of `address`.
    fn spendable_coins(&self, store: &dyn KvStore, address: &Address) -> Result<Coins>;

    /// Move `amount` from `from` to `to`. Fails without side effects if
    /// `from` cannot cover every denom.
    fn send_coins(
        &self,
        store: &mut dyn KvStore,
        from: &Address,
        to: &Address,
        amount: &Coins,
    ) -> Result<()>;

    /// Create `amount` out of thin air and credit it to `to`.
    fn mint_coins(&self, store: &mut dyn KvStore, to: &Address, amount: &Coins) -> Result<()>;
}

/// Account registry.
pub trait AccountKeeper: Send + Sync {
    /// Whether an account exists at `address`.
    fn has_account(&self, store: &dyn KvStore, address: &Address) -> bool;

    /// Register a fresh zero-balance account.
    fn new_account(&self, store: &mut dyn KvStore, address: &Address) -> Result<()>;
}

/// Price feed oracle.
pub trait FeedsKeeper: Send + Sync {
    /// Current prices of every fed signal.
    fn all_prices(&self, store: &dyn KvStore) -> Vec<Price>;

    /// Current prices of the requested signals. Signals without a feed are
    /// omitted.
    fn current_prices(&self, store: &dyn KvStore, signal_ids: &[String]) -> Vec<Price> {
        self.all_prices(store)
            .into_iter()
            .filter(|p| signal_ids.contains(&p.signal_id))
            .collect()
    }
}

/// Signing request handed to the threshold-signing coordinator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SigningRequest {
    /// Originating tunnel.
    pub tunnel_id: u64,
    /// Destination chain ID.
    pub destination_chain_id: String,
    /// Destination contract address.
    pub destination_contract_address: String,
    /// Account paying the signing fee.
    pub fee_payer: Address,
    /// ABI-encoded packet.
    pub payload: Vec<u8>,
    /// Maximum fee the coordinator may charge.
    pub fee_limit: Coins,
}

/// Threshold-signing coordinator.
pub trait TssCoordinator: Send + Sync {
    /// Whether the coordinator accepts new signing requests.
    fn is_ready(&self, store: &dyn KvStore) -> bool;

    /// Fee charged per signing request.
    fn signing_fee(&self, store: &dyn KvStore) -> Result<Coins>;

    /// Submit a signing request, returning its correlation ID.
    fn request_signing(&self, store: &mut dyn KvStore, request: SigningRequest) -> Result<u64>;
}

/// Channel-level transport (native packet delivery).
pub trait ChannelKeeper: Send + Sync {
    /// Whether this module owns the capability for `(port_id, channel_id)`.
    fn has_capability(&self, store: &dyn KvStore, port_id: &str, channel_id: &str) -> bool;

    /// Whether the channel exists.
    fn has_channel(&self, store: &dyn KvStore, port_id: &str, channel_id: &str) -> bool;

    /// Send raw packet data, returning the channel sequence.
    fn send_packet(
        &self,
        store: &mut dyn KvStore,
        port_id: &str,
        channel_id: &str,
        timeout_timestamp: u64,
        data: Vec<u8>,
    ) -> Result<u64>;
}

/// Cross-chain token transfer with an attached memo.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferRequest {
    /// Source port (always `transfer`).
    pub source_port: String,
    /// Source channel.
    pub source_channel: String,
    /// Coins to transfer.
    pub token: Coins,
    /// Sending account.
    pub sender: Address,
    /// Receiver on the counterparty chain.
    pub receiver: String,
    /// Timeout, unix nanoseconds.
    pub timeout_timestamp: u64,
    /// JSON memo.
    pub memo: String,
}

/// Token transfer transport.
pub trait TransferKeeper: Send + Sync {
    /// Execute a transfer, returning its packet sequence.
    fn transfer(&self, store: &mut dyn KvStore, request: TransferRequest) -> Result<u64>;
}
