//! # In-Memory Ledger Adapters
//!
//! Balance ledger and account registry that keep their records in the
//! caller's store, so a rolled-back operation also rolls back its transfers.

use crate::domain::{Address, Coins, Result, TunnelError};
use crate::ports::{AccountKeeper, BankKeeper, KvStore};
use tracing::debug;

/// Balance records, keyed by address.
pub const BALANCE_PREFIX: u8 = 0xE0;
/// Account records, keyed by address.
pub const ACCOUNT_PREFIX: u8 = 0xE1;

fn balance_key(address: &Address) -> Vec<u8> {
    let mut key = Vec::with_capacity(21);
    key.push(BALANCE_PREFIX);
    key.extend_from_slice(address.as_bytes());
    key
}

fn balance_overflow(address: &Address, balance: &Coins, amount: &Coins) -> TunnelError {
    TunnelError::InvalidAmount(format!("balance of {address} overflows: {balance} + {amount}"))
}

fn account_key(address: &Address) -> Vec<u8> {
    let mut key = Vec::with_capacity(21);
    key.push(ACCOUNT_PREFIX);
    key.extend_from_slice(address.as_bytes());
    key
}

/// Store-backed balance ledger.
#[derive(Clone, Copy, Debug, Default)]
pub struct InMemoryBank;

impl InMemoryBank {
    /// Balance of `address`.
    pub fn balance(&self, store: &dyn KvStore, address: &Address) -> Result<Coins> {
        match store.get(&balance_key(address)) {
            Some(bytes) => Ok(bincode::deserialize(&bytes)?),
            None => Ok(Coins::new()),
        }
    }

    fn set_balance(&self, store: &mut dyn KvStore, address: &Address, coins: &Coins) -> Result<()> {
        if coins.is_zero() {
            store.delete(&balance_key(address));
        } else {
            store.set(&balance_key(address), bincode::serialize(coins)?);
        }
        Ok(())
    }
}

impl BankKeeper for InMemoryBank {
    fn spendable_coins(&self, store: &dyn KvStore, address: &Address) -> Result<Coins> {
        self.balance(store, address)
    }

    fn send_coins(
        &self,
        store: &mut dyn KvStore,
        from: &Address,
        to: &Address,
        amount: &Coins,
    ) -> Result<()> {
        let from_balance = self.balance(store, from)?;
        let remaining = from_balance
            .checked_sub(amount)
            .ok_or_else(|| TunnelError::InsufficientFunds {
                address: from.to_string(),
                required: amount.to_string(),
                available: from_balance.to_string(),
            })?;
        let to_balance = if from == to {
            remaining.clone()
        } else {
            self.balance(store, to)?
        };
        let credited = to_balance
            .checked_add(amount)
            .ok_or_else(|| balance_overflow(to, &to_balance, amount))?;

        self.set_balance(store, from, &remaining)?;
        self.set_balance(store, to, &credited)?;

        debug!(from = %from, to = %to, amount = %amount, "[qc-18] Coins sent");
        Ok(())
    }

    fn mint_coins(&self, store: &mut dyn KvStore, to: &Address, amount: &Coins) -> Result<()> {
        let balance = self.balance(store, to)?;
        let minted = balance
            .checked_add(amount)
            .ok_or_else(|| balance_overflow(to, &balance, amount))?;
        self.set_balance(store, to, &minted)
    }
}

/// Store-backed account registry.
#[derive(Clone, Copy, Debug, Default)]
pub struct InMemoryAccounts;

impl AccountKeeper for InMemoryAccounts {
    fn has_account(&self, store: &dyn KvStore, address: &Address) -> bool {
        store.has(&account_key(address))
    }

    fn new_account(&self, store: &mut dyn KvStore, address: &Address) -> Result<()> {
        if self.has_account(store, address) {
            return Err(TunnelError::AccountAlreadyExists(address.to_string()));
        }
        store.set(&account_key(address), vec![1]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryStore;

    #[test]
    fn test_send_moves_funds() {
        let mut store = MemoryStore::new();
        let bank = InMemoryBank;
        let alice = Address([1; 20]);
        let bob = Address([2; 20]);

        bank.mint_coins(&mut store, &alice, &Coins::single("uband", 100)).unwrap();
        bank.send_coins(&mut store, &alice, &bob, &Coins::single("uband", 30))
            .unwrap();

        assert_eq!(bank.balance(&store, &alice).unwrap(), Coins::single("uband", 70));
        assert_eq!(bank.balance(&store, &bob).unwrap(), Coins::single("uband", 30));
    }

    #[test]
    fn test_send_insufficient_funds_changes_nothing() {
        let mut store = MemoryStore::new();
        let bank = InMemoryBank;
        let alice = Address([1; 20]);
        let bob = Address([2; 20]);

        bank.mint_coins(&mut store, &alice, &Coins::single("uband", 10)).unwrap();
        let err = bank
            .send_coins(&mut store, &alice, &bob, &Coins::single("uband", 11))
            .unwrap_err();

        assert!(matches!(err, TunnelError::InsufficientFunds { .. }));
        assert_eq!(bank.balance(&store, &alice).unwrap(), Coins::single("uband", 10));
        assert!(bank.balance(&store, &bob).unwrap().is_zero());
    }

    #[test]
    fn test_overflowing_credit_is_rejected() {
        let mut store = MemoryStore::new();
        let bank = InMemoryBank;
        let alice = Address([1; 20]);
        let bob = Address([2; 20]);

        bank.mint_coins(&mut store, &alice, &Coins::single("uband", 5)).unwrap();
        bank.mint_coins(&mut store, &bob, &Coins::single("uband", u128::MAX)).unwrap();

        assert!(matches!(
            bank.mint_coins(&mut store, &bob, &Coins::single("uband", 1)),
            Err(TunnelError::InvalidAmount(_))
        ));
        assert!(matches!(
            bank.send_coins(&mut store, &alice, &bob, &Coins::single("uband", 5)),
            Err(TunnelError::InvalidAmount(_))
        ));
        assert_eq!(bank.balance(&store, &alice).unwrap(), Coins::single("uband", 5));
        assert_eq!(
            bank.balance(&store, &bob).unwrap(),
            Coins::single("uband", u128::MAX)
        );
    }

    #[test]
    fn test_account_registration_rejects_duplicates() {
        let mut store = MemoryStore::new();
        let accounts = InMemoryAccounts;
        let addr = Address([9; 20]);

        assert!(!accounts.has_account(&store, &addr));
        accounts.new_account(&mut store, &addr).unwrap();
        assert!(accounts.has_account(&store, &addr));
        assert!(matches!(
            accounts.new_account(&mut store, &addr),
            Err(TunnelError::AccountAlreadyExists(_))
        ));
    }
}
