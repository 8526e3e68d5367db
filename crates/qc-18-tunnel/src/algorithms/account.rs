//! Fee-payer address derivation.

use crate::domain::Address;
use sha2::{Digest, Sha256};

/// Module name mixed into every derived address.
pub const MODULE_NAME: &str = "tunnel";

/// Derivation key for tunnel fee-payer accounts.
pub const TUNNEL_ACCOUNTS_KEY: &str = "tunnel_accounts";

/// Derive the fee-payer address of a new tunnel.
///
/// `sha256(module || 0x00 || derivation key || 0x00 || id || app_hash || data_hash)`,
/// truncated to 20 bytes. The id is hashed as its decimal string.
pub fn derive_fee_payer(tunnel_id: u64, app_hash: &[u8], data_hash: &[u8]) -> Address {
    let mut hasher = Sha256::new();
    hasher.update(MODULE_NAME.as_bytes());
    hasher.update([0u8]);
    hasher.update(TUNNEL_ACCOUNTS_KEY.as_bytes());
    hasher.update([0u8]);
    hasher.update(tunnel_id.to_string().as_bytes());
    hasher.update(app_hash);
    hasher.update(data_hash);
    let digest = hasher.finalize();

    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&digest[..20]);
    Address(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derivation_is_deterministic() {
        let a = derive_fee_payer(1, &[1; 32], &[2; 32]);
        let b = derive_fee_payer(1, &[1; 32], &[2; 32]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_derivation_depends_on_every_input() {
        let base = derive_fee_payer(1, &[1; 32], &[2; 32]);
        assert_ne!(base, derive_fee_payer(2, &[1; 32], &[2; 32]));
        assert_ne!(base, derive_fee_payer(1, &[9; 32], &[2; 32]));
        assert_ne!(base, derive_fee_payer(1, &[1; 32], &[9; 32]));
    }

    #[test]
    fn test_derived_address_differs_from_module_account() {
        assert_ne!(derive_fee_payer(1, &[], &[]), Address::module(MODULE_NAME));
    }
}
