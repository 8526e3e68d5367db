//! # Store Key Layout
//!
//! | Prefix | Suffix                   | Value         |
//! |--------|--------------------------|---------------|
//! | 0x00   | -                        | tunnel count  |
//! | 0x01   | -                        | TotalFees     |
//! | 0x02   | -                        | TunnelParams  |
//! | 0x10   | tunnel id                | Tunnel        |
//! | 0x11   | tunnel id                | 0x01 sentinel |
//! | 0x12   | tunnel id + depositor    | Deposit       |
//! | 0x13   | tunnel id                | LatestPrices  |
//! | 0x14   | tunnel id + sequence     | Packet        |
//!
//! All integers are big-endian so prefix scans return ascending ids.

use super::value_objects::Address;

/// Tunnel count key.
pub const TUNNEL_COUNT_KEY: &[u8] = &[0x00];
/// Total fees key.
pub const TOTAL_FEES_KEY: &[u8] = &[0x01];
/// Params key.
pub const PARAMS_KEY: &[u8] = &[0x02];

/// Tunnel record prefix.
pub const TUNNEL_PREFIX: u8 = 0x10;
/// Active-set prefix.
pub const ACTIVE_TUNNEL_PREFIX: u8 = 0x11;
/// Deposit prefix.
pub const DEPOSIT_PREFIX: u8 = 0x12;
/// Latest prices prefix.
pub const LATEST_PRICES_PREFIX: u8 = 0x13;
/// Packet prefix.
pub const PACKET_PREFIX: u8 = 0x14;

/// Active-set sentinel value.
pub const ACTIVE_SENTINEL: &[u8] = &[0x01];

fn with_id(prefix: u8, id: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(9);
    key.push(prefix);
    key.extend_from_slice(&id.to_be_bytes());
    key
}

/// Key of a tunnel record.
pub fn tunnel_key(tunnel_id: u64) -> Vec<u8> {
    with_id(TUNNEL_PREFIX, tunnel_id)
}

/// Key of an active-set entry.
pub fn active_tunnel_key(tunnel_id: u64) -> Vec<u8> {
    with_id(ACTIVE_TUNNEL_PREFIX, tunnel_id)
}

/// Prefix of all deposits of a tunnel.
pub fn deposits_prefix(tunnel_id: u64) -> Vec<u8> {
    with_id(DEPOSIT_PREFIX, tunnel_id)
}

/// Key of one deposit.
pub fn deposit_key(tunnel_id: u64, depositor: &Address) -> Vec<u8> {
    let mut key = deposits_prefix(tunnel_id);
    key.extend_from_slice(depositor.as_bytes());
    key
}

/// Key of a tunnel's latest prices.
pub fn latest_prices_key(tunnel_id: u64) -> Vec<u8> {
    with_id(LATEST_PRICES_PREFIX, tunnel_id)
}

/// Prefix of all packets of a tunnel.
pub fn packets_prefix(tunnel_id: u64) -> Vec<u8> {
    with_id(PACKET_PREFIX, tunnel_id)
}

/// Key of one packet.
pub fn packet_key(tunnel_id: u64, sequence: u64) -> Vec<u8> {
    let mut key = packets_prefix(tunnel_id);
    key.extend_from_slice(&sequence.to_be_bytes());
    key
}

/// Decode the tunnel id suffix of an id-keyed record.
pub fn tunnel_id_from_key(key: &[u8]) -> Option<u64> {
    let bytes: [u8; 8] = key.get(1..9)?.try_into().ok()?;
    Some(u64::from_be_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_sort_by_id() {
        assert!(tunnel_key(2) < tunnel_key(10));
        assert!(packet_key(1, 255) < packet_key(1, 256));
        assert!(packet_key(1, u64::MAX) < packet_key(2, 0));
    }

    #[test]
    fn test_tunnel_id_roundtrip() {
        assert_eq!(tunnel_id_from_key(&active_tunnel_key(42)), Some(42));
        assert_eq!(tunnel_id_from_key(&[ACTIVE_TUNNEL_PREFIX, 1]), None);
    }

    #[test]
    fn test_deposit_key_extends_prefix() {
        let depositor = Address([7u8; 20]);
        let key = deposit_key(3, &depositor);
        assert!(key.starts_with(&deposits_prefix(3)));
        assert_eq!(key.len(), 29);
    }
}
