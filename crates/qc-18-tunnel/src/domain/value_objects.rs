//! # Domain Value Objects
//!
//! Addresses, coins and coin sets.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

/// Account address (20-byte).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// Address of a named module account.
    pub fn module(name: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"module");
        hasher.update(name.as_bytes());
        let digest = hasher.finalize();

        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest[..20]);
        Address(bytes)
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Address(bytes)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// A single denomination and amount.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    /// Denomination.
    pub denom: String,
    /// Amount in base units.
    pub amount: u128,
}

impl Coin {
    /// Create a new coin.
    pub fn new(denom: impl Into<String>, amount: u128) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }

    /// Check the denom follows `[a-zA-Z][a-zA-Z0-9/:._-]{2,127}`.
    pub fn is_valid_denom(denom: &str) -> bool {
        let mut chars = denom.chars();
        let Some(first) = chars.next() else {
            return false;
        };
        (3..=128).contains(&denom.len())
            && first.is_ascii_alphabetic()
            && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | ':' | '.' | '_' | '-'))
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// Sorted set of coins, at most one entry per denom, no zero entries.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coins(BTreeMap<String, u128>);

impl Coins {
    /// Empty coin set.
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Build from a list of coins, merging duplicate denoms. `None` if a
    /// merged amount overflows.
    pub fn from_coins(coins: impl IntoIterator<Item = Coin>) -> Option<Self> {
        let mut set = Self::new();
        for coin in coins {
            set.add_coin(coin)?;
        }
        Some(set)
    }

    /// Single-denom coin set.
    pub fn single(denom: impl Into<String>, amount: u128) -> Self {
        let mut set = Self::new();
        if amount > 0 {
            set.0.insert(denom.into(), amount);
        }
        set
    }

    fn add_coin(&mut self, coin: Coin) -> Option<()> {
        if coin.amount == 0 {
            return Some(());
        }
        let entry = self.0.entry(coin.denom).or_insert(0);
        *entry = entry.checked_add(coin.amount)?;
        Some(())
    }

    /// Sum of two coin sets, or `None` if any denom overflows.
    pub fn checked_add(&self, other: &Coins) -> Option<Coins> {
        let mut sum = self.clone();
        for (denom, amount) in &other.0 {
            sum.add_coin(Coin::new(denom.clone(), *amount))?;
        }
        Some(sum)
    }

    /// Difference, or `None` if any denom would go negative.
    pub fn checked_sub(&self, other: &Coins) -> Option<Coins> {
        let mut diff = self.0.clone();
        for (denom, amount) in &other.0 {
            let have = diff.get(denom).copied().unwrap_or(0);
            let left = have.checked_sub(*amount)?;
            if left == 0 {
                diff.remove(denom);
            } else {
                diff.insert(denom.clone(), left);
            }
        }
        Some(Coins(diff))
    }

    /// True if for every denom in `other` this set holds at least as much.
    pub fn is_all_gte(&self, other: &Coins) -> bool {
        other
            .0
            .iter()
            .all(|(denom, amount)| self.amount_of(denom) >= *amount)
    }

    /// Amount held of `denom`.
    pub fn amount_of(&self, denom: &str) -> u128 {
        self.0.get(denom).copied().unwrap_or(0)
    }

    /// True if no coins are held.
    pub fn is_zero(&self) -> bool {
        self.0.is_empty()
    }

    /// Denominations in sorted order.
    pub fn denoms(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Coins in denom order.
    pub fn iter(&self) -> impl Iterator<Item = Coin> + '_ {
        self.0
            .iter()
            .map(|(denom, amount)| Coin::new(denom.clone(), *amount))
    }

    /// First invalid denom, if any.
    pub fn invalid_denom(&self) -> Option<&str> {
        self.denoms().find(|d| !Coin::is_valid_denom(d))
    }
}

impl From<Coin> for Coins {
    fn from(coin: Coin) -> Self {
        Coins::single(coin.denom, coin.amount)
    }
}

impl fmt::Display for Coins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.iter().map(|c| c.to_string()).collect();
        write!(f, "{}", parts.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_address_is_stable() {
        assert_eq!(Address::module("tunnel"), Address::module("tunnel"));
        assert_ne!(Address::module("tunnel"), Address::module("bank"));
    }

    #[test]
    fn test_valid_denom() {
        assert!(Coin::is_valid_denom("uband"));
        assert!(Coin::is_valid_denom("hook/tunnel-1"));
        assert!(!Coin::is_valid_denom("1band"));
        assert!(!Coin::is_valid_denom("ub"));
        assert!(!Coin::is_valid_denom("u band"));
    }

    #[test]
    fn test_coins_merge_and_drop_zero() {
        let coins = Coins::from_coins([
            Coin::new("uband", 10),
            Coin::new("uband", 5),
            Coin::new("uatom", 0),
        ])
        .unwrap();
        assert_eq!(coins.amount_of("uband"), 15);
        assert_eq!(coins.denoms().count(), 1);
    }

    #[test]
    fn test_checked_add_overflow() {
        let max = Coins::single("uband", u128::MAX);
        assert_eq!(max.checked_add(&Coins::single("uband", 1)), None);
        let mixed = max.checked_add(&Coins::single("uatom", 1)).unwrap();
        assert_eq!(mixed.amount_of("uatom"), 1);
        assert_eq!(mixed.amount_of("uband"), u128::MAX);
        let merged = Coins::from_coins([Coin::new("uband", u128::MAX), Coin::new("uband", 1)]);
        assert!(merged.is_none());
    }

    #[test]
    fn test_checked_sub() {
        let a = Coins::single("uband", 100);
        let b = Coins::single("uband", 40);
        assert_eq!(a.checked_sub(&b), Some(Coins::single("uband", 60)));
        assert_eq!(b.checked_sub(&a), None);
        assert!(a.checked_sub(&a).unwrap().is_zero());
    }

    #[test]
    fn test_is_all_gte() {
        let held = Coins::single("uband", 100)
            .checked_add(&Coins::single("uatom", 5))
            .unwrap();
        assert!(held.is_all_gte(&Coins::single("uband", 100)));
        assert!(!held.is_all_gte(&Coins::single("uband", 101)));
        assert!(!held.is_all_gte(&Coins::single("uosmo", 1)));
        assert!(held.is_all_gte(&Coins::new()));
    }

    #[test]
    fn test_display() {
        let coins = Coins::single("uband", 100)
            .checked_add(&Coins::single("uatom", 5))
            .unwrap();
        assert_eq!(coins.to_string(), "5uatom,100uband");
    }
}
