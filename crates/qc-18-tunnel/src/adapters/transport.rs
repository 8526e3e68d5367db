//! # In-Memory Cross-Chain Transport
//!
//! Channel registry, raw packet sends and token transfers. Sequences and
//! sent packets live in the caller's store; transferred tokens are escrowed
//! through [`InMemoryBank`].
//!
//! Channels can be told to fail or to panic on send, which is how tests
//! exercise the dispatcher's failure paths.

use crate::adapters::bank::InMemoryBank;
use crate::domain::{Address, Coins, Result, TunnelError};
use crate::ports::{BankKeeper, ChannelKeeper, KvStore, TransferKeeper, TransferRequest};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// Next-sequence records, keyed by `port/channel`.
pub const SEQUENCE_PREFIX: u8 = 0xE4;
/// Sent packets, keyed by `port/channel` + big-endian sequence.
pub const SENT_PREFIX: u8 = 0xE5;

/// A packet that left through the transport.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutboundPacket {
    /// Raw channel packet.
    Raw {
        /// Source port
        port_id: String,
        /// Source channel
        channel_id: String,
        /// Channel sequence
        sequence: u64,
        /// Timeout, unix nanoseconds
        timeout_timestamp: u64,
        /// Packet bytes
        data: Vec<u8>,
    },
    /// Token transfer with memo.
    Transfer {
        /// Source channel
        channel_id: String,
        /// Channel sequence
        sequence: u64,
        /// Transferred tokens
        token: Coins,
        /// Sending account
        sender: Address,
        /// Receiver on the counterparty chain
        receiver: String,
        /// Timeout, unix nanoseconds
        timeout_timestamp: u64,
        /// Transfer memo
        memo: String,
    },
}

impl OutboundPacket {
    /// Channel sequence of the packet.
    pub fn sequence(&self) -> u64 {
        match self {
            OutboundPacket::Raw { sequence, .. } | OutboundPacket::Transfer { sequence, .. } => {
                *sequence
            }
        }
    }
}

type ChannelSet = RwLock<BTreeSet<(String, String)>>;

/// Transport double.
#[derive(Debug, Default)]
pub struct InMemoryTransport {
    bank: InMemoryBank,
    channels: ChannelSet,
    capabilities: ChannelSet,
    failing: RwLock<BTreeSet<String>>,
    panicking: RwLock<BTreeSet<String>>,
}

fn channel_path(port_id: &str, channel_id: &str) -> Vec<u8> {
    format!("{port_id}/{channel_id}").into_bytes()
}

impl InMemoryTransport {
    /// Transport with no channels.
    pub fn new() -> Self {
        Self::default()
    }

    /// Escrow account of transferred tokens.
    pub fn escrow() -> Address {
        Address::module("transfer")
    }

    /// Open a channel.
    pub fn open_channel(&self, port_id: &str, channel_id: &str) {
        self.channels.write().insert((port_id.to_string(), channel_id.to_string()));
    }

    /// Open a channel and hand its capability to the tunnel module.
    pub fn open_owned_channel(&self, port_id: &str, channel_id: &str) {
        self.open_channel(port_id, channel_id);
        self.capabilities.write().insert((port_id.to_string(), channel_id.to_string()));
    }

    /// Reject every send on `channel_id`.
    pub fn fail_channel(&self, channel_id: &str) {
        self.failing.write().insert(channel_id.to_string());
    }

    /// Panic on every send on `channel_id`.
    pub fn panic_channel(&self, channel_id: &str) {
        self.panicking.write().insert(channel_id.to_string());
    }

    /// Restore normal sends on `channel_id`.
    pub fn heal_channel(&self, channel_id: &str) {
        self.failing.write().remove(channel_id);
        self.panicking.write().remove(channel_id);
    }

    /// Every packet sent so far, in key order.
    pub fn sent_packets(&self, store: &dyn KvStore) -> Result<Vec<OutboundPacket>> {
        store
            .prefix_scan(&[SENT_PREFIX])
            .into_iter()
            .map(|(_, bytes)| bincode::deserialize(&bytes).map_err(Into::into))
            .collect()
    }

    fn check_send(&self, store: &dyn KvStore, port_id: &str, channel_id: &str) -> Result<()> {
        if self.panicking.read().contains(channel_id) {
            panic!("transport fault on {port_id}/{channel_id}");
        }
        if self.failing.read().contains(channel_id) {
            return Err(TunnelError::Transport(format!(
                "channel {port_id}/{channel_id} rejected the packet"
            )));
        }
        if !self.has_channel(store, port_id, channel_id) {
            return Err(TunnelError::Transport(format!(
                "channel {port_id}/{channel_id} not found"
            )));
        }
        Ok(())
    }

    fn next_sequence(&self, store: &mut dyn KvStore, port_id: &str, channel_id: &str) -> Result<u64> {
        let mut key = vec![SEQUENCE_PREFIX];
        key.extend_from_slice(&channel_path(port_id, channel_id));

        let sequence = match store.get(&key) {
            Some(bytes) => bincode::deserialize::<u64>(&bytes)?,
            None => 1,
        };
        store.set(&key, bincode::serialize(&(sequence + 1))?);
        Ok(sequence)
    }

    fn record(
        &self,
        store: &mut dyn KvStore,
        port_id: &str,
        channel_id: &str,
        packet: &OutboundPacket,
    ) -> Result<()> {
        let mut key = vec![SENT_PREFIX];
        key.extend_from_slice(&channel_path(port_id, channel_id));
        key.extend_from_slice(&packet.sequence().to_be_bytes());
        store.set(&key, bincode::serialize(packet)?);
        Ok(())
    }
}

impl ChannelKeeper for InMemoryTransport {
    fn has_capability(&self, _store: &dyn KvStore, port_id: &str, channel_id: &str) -> bool {
        self.capabilities.read().contains(&(port_id.to_string(), channel_id.to_string()))
    }

    fn has_channel(&self, _store: &dyn KvStore, port_id: &str, channel_id: &str) -> bool {
        self.channels.read().contains(&(port_id.to_string(), channel_id.to_string()))
    }

    fn send_packet(
        &self,
        store: &mut dyn KvStore,
        port_id: &str,
        channel_id: &str,
        timeout_timestamp: u64,
        data: Vec<u8>,
    ) -> Result<u64> {
        self.check_send(store, port_id, channel_id)?;
        if !self.has_capability(store, port_id, channel_id) {
            return Err(TunnelError::Transport(format!(
                "no capability for {port_id}/{channel_id}"
            )));
        }

        let sequence = self.next_sequence(store, port_id, channel_id)?;
        let packet = OutboundPacket::Raw {
            port_id: port_id.to_string(),
            channel_id: channel_id.to_string(),
            sequence,
            timeout_timestamp,
            data,
        };
        self.record(store, port_id, channel_id, &packet)?;

        debug!(port_id, channel_id, sequence, "[qc-18] Packet sent");
        Ok(sequence)
    }
}

impl TransferKeeper for InMemoryTransport {
    fn transfer(&self, store: &mut dyn KvStore, request: TransferRequest) -> Result<u64> {
        self.check_send(store, &request.source_port, &request.source_channel)?;

        self.bank
            .send_coins(store, &request.sender, &Self::escrow(), &request.token)?;

        let sequence = self.next_sequence(store, &request.source_port, &request.source_channel)?;
        let packet = OutboundPacket::Transfer {
            channel_id: request.source_channel.clone(),
            sequence,
            token: request.token,
            sender: request.sender,
            receiver: request.receiver,
            timeout_timestamp: request.timeout_timestamp,
            memo: request.memo,
        };
        self.record(store, &request.source_port, &request.source_channel, &packet)?;

        debug!(
            channel_id = %request.source_channel,
            sequence,
            "[qc-18] Transfer sent"
        );
        Ok(sequence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryStore;
    use crate::domain::TRANSFER_PORT;

    #[test]
    fn test_send_packet_assigns_sequences() {
        let mut store = MemoryStore::new();
        let transport = InMemoryTransport::new();
        transport.open_owned_channel("tunnel.1", "channel-0");

        let first = transport
            .send_packet(&mut store, "tunnel.1", "channel-0", 10, vec![1])
            .unwrap();
        let second = transport
            .send_packet(&mut store, "tunnel.1", "channel-0", 10, vec![2])
            .unwrap();

        assert_eq!((first, second), (1, 2));
        assert_eq!(transport.sent_packets(&store).unwrap().len(), 2);
    }

    #[test]
    fn test_send_requires_capability() {
        let mut store = MemoryStore::new();
        let transport = InMemoryTransport::new();
        transport.open_channel("tunnel.1", "channel-0");

        assert!(transport
            .send_packet(&mut store, "tunnel.1", "channel-0", 10, vec![])
            .is_err());
    }

    #[test]
    fn test_transfer_escrows_tokens() {
        let mut store = MemoryStore::new();
        let transport = InMemoryTransport::new();
        let bank = InMemoryBank;
        let sender = Address([5; 20]);
        transport.open_channel(TRANSFER_PORT, "channel-3");
        bank.mint_coins(&mut store, &sender, &Coins::single("uband", 50)).unwrap();

        let request = TransferRequest {
            source_port: TRANSFER_PORT.into(),
            source_channel: "channel-3".into(),
            token: Coins::single("uband", 20),
            sender,
            receiver: "axelar1gmp".into(),
            timeout_timestamp: 1,
            memo: "{}".into(),
        };
        assert_eq!(transport.transfer(&mut store, request).unwrap(), 1);
        assert_eq!(bank.balance(&store, &sender).unwrap(), Coins::single("uband", 30));
        assert_eq!(
            bank.balance(&store, &InMemoryTransport::escrow()).unwrap(),
            Coins::single("uband", 20)
        );
    }

    #[test]
    fn test_failing_channel() {
        let mut store = MemoryStore::new();
        let transport = InMemoryTransport::new();
        transport.open_owned_channel("tunnel.1", "channel-0");
        transport.fail_channel("channel-0");

        assert!(matches!(
            transport.send_packet(&mut store, "tunnel.1", "channel-0", 10, vec![]),
            Err(TunnelError::Transport(_))
        ));
        assert!(store.is_empty());

        transport.heal_channel("channel-0");
        assert!(transport
            .send_packet(&mut store, "tunnel.1", "channel-0", 10, vec![])
            .is_ok());
    }
}
