//! # Packet ABI Encoding
//!
//! Solidity ABI encoding of a packet, shared by the TSS and IBC routes:
//!
//! ```text
//! (uint64 tunnelID, uint64 sequence, (bytes32 signalID, uint64 price)[] prices, int64 createdAt)
//! ```
//!
//! The tuple is dynamic, so the encoding starts with its `0x20` offset.

use crate::domain::Packet;
use alloy_primitives::B256;
use alloy_sol_types::{sol, SolValue};

sol! {
    /// One relayed price.
    struct RelayPrice {
        bytes32 signalId;
        uint64 price;
    }

    /// Packet as seen by destination contracts.
    struct TunnelPacket {
        uint64 tunnelId;
        uint64 sequence;
        RelayPrice[] prices;
        int64 createdAt;
    }
}

/// Pack a signal ID into 32 bytes: UTF-8 bytes first, zero padded on the
/// right, truncated beyond 32 bytes.
pub fn signal_id_to_bytes32(signal_id: &str) -> B256 {
    let bytes = signal_id.as_bytes();
    let len = bytes.len().min(32);

    let mut word = [0u8; 32];
    word[..len].copy_from_slice(&bytes[..len]);
    B256::from(word)
}

impl From<&Packet> for TunnelPacket {
    fn from(packet: &Packet) -> Self {
        TunnelPacket {
            tunnelId: packet.tunnel_id,
            sequence: packet.sequence,
            prices: packet
                .prices
                .iter()
                .map(|p| RelayPrice {
                    signalId: signal_id_to_bytes32(&p.signal_id),
                    price: p.price,
                })
                .collect(),
            createdAt: packet.created_at,
        }
    }
}

/// ABI-encode a packet.
pub fn encode_packet(packet: &Packet) -> Vec<u8> {
    TunnelPacket::from(packet).abi_encode()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Coins, Price, PriceStatus};

    fn packet(prices: Vec<Price>) -> Packet {
        Packet {
            tunnel_id: 1,
            sequence: 1,
            prices,
            base_fee: Coins::new(),
            route_fee: Coins::new(),
            created_at: 1_730_358_471,
            receipt: None,
        }
    }

    #[test]
    fn test_encode_packet_exact_bytes() {
        let packet = packet(vec![Price::new(PriceStatus::Available, "BTC", 72_163, 0)]);

        let expected = concat!(
            "0000000000000000000000000000000000000000000000000000000000000020",
            "0000000000000000000000000000000000000000000000000000000000000001",
            "0000000000000000000000000000000000000000000000000000000000000001",
            "0000000000000000000000000000000000000000000000000000000000000080",
            "0000000000000000000000000000000000000000000000000000000067232cc7",
            "0000000000000000000000000000000000000000000000000000000000000001",
            "4254430000000000000000000000000000000000000000000000000000000000",
            "00000000000000000000000000000000000000000000000000000000000119e3",
        );
        assert_eq!(hex::encode(encode_packet(&packet)), expected);
    }

    #[test]
    fn test_encode_empty_prices() {
        let encoded = encode_packet(&packet(vec![]));
        // offset, 4 head words, zero length
        assert_eq!(encoded.len(), 6 * 32);
        assert_eq!(encoded[6 * 32 - 1], 0);
    }

    #[test]
    fn test_signal_id_truncated() {
        let long = "CS:A-VERY-LONG-SIGNAL-IDENTIFIER-THAT-OVERFLOWS";
        let word = signal_id_to_bytes32(long);
        assert_eq!(word.as_slice(), &long.as_bytes()[..32]);
    }

    #[test]
    fn test_negative_created_at() {
        let mut p = packet(vec![]);
        p.created_at = -1;
        let encoded = encode_packet(&p);
        assert!(encoded[4 * 32..5 * 32].iter().all(|b| *b == 0xff));
    }
}
