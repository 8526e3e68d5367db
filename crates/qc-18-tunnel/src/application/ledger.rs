//! # Fee & Deposit Ledger
//!
//! Moves funds between depositors, the module escrow and tunnel fee payers,
//! and keeps `Deposit` records and `Tunnel::total_deposit` in step.

use super::context::Context;
use super::keeper::TunnelKeeper;
use crate::config::TunnelParams;
use crate::domain::{Address, Coins, Deposit, Result, Route, Tunnel, TunnelError};
use crate::events::{DeactivationReason, TunnelEvent};
use crate::ports::KvStore;
use tracing::{debug, info};

fn amount_overflow(what: &str, held: &Coins, added: &Coins) -> TunnelError {
    TunnelError::InvalidAmount(format!("{what} overflows: {held} + {added}"))
}

impl TunnelKeeper {
    /// Deposit `amount` from `depositor` into a tunnel.
    pub fn add_deposit(
        &self,
        ctx: &mut Context<'_>,
        params: &TunnelParams,
        tunnel_id: u64,
        depositor: Address,
        amount: Coins,
    ) -> Result<()> {
        if amount.is_zero() {
            return Err(TunnelError::InvalidAmount("deposit amount is empty".into()));
        }
        params.validate_deposit_denom(&amount)?;

        let mut tunnel = self.get_tunnel(ctx.store(), tunnel_id)?;
        let store = ctx.store_mut();

        self.deps
            .bank
            .send_coins(store, &depositor, &Self::module_address(), &amount)?;

        let deposit = match self.get_deposit(store, tunnel_id, &depositor) {
            Ok(mut existing) => {
                existing.amount = existing
                    .amount
                    .checked_add(&amount)
                    .ok_or_else(|| amount_overflow("deposit", &existing.amount, &amount))?;
                existing
            }
            Err(TunnelError::DepositNotFound { .. }) => Deposit {
                tunnel_id,
                depositor,
                amount: amount.clone(),
            },
            Err(err) => return Err(err),
        };
        self.set_deposit(store, &deposit)?;

        tunnel.total_deposit = tunnel
            .total_deposit
            .checked_add(&amount)
            .ok_or_else(|| amount_overflow("total deposit", &tunnel.total_deposit, &amount))?;
        self.set_tunnel(store, &tunnel)?;

        info!(
            tunnel_id,
            depositor = %depositor,
            amount = %amount,
            total_deposit = %tunnel.total_deposit,
            "[qc-18] Deposit added"
        );
        ctx.emit(TunnelEvent::DepositAdded {
            tunnel_id,
            depositor,
            amount,
        });
        Ok(())
    }

    /// Withdraw `amount` of `withdrawer`'s deposit.
    ///
    /// An active tunnel whose total deposit drops below `min_deposit` is
    /// deactivated as part of the withdrawal.
    pub fn withdraw_deposit(
        &self,
        ctx: &mut Context<'_>,
        params: &TunnelParams,
        tunnel_id: u64,
        amount: Coins,
        withdrawer: Address,
    ) -> Result<()> {
        if amount.is_zero() {
            return Err(TunnelError::InvalidAmount("withdraw amount is empty".into()));
        }

        let mut tunnel = self.get_tunnel(ctx.store(), tunnel_id)?;
        let mut deposit = self.get_deposit(ctx.store(), tunnel_id, &withdrawer)?;

        deposit.amount = deposit
            .amount
            .checked_sub(&amount)
            .ok_or_else(|| TunnelError::InsufficientDeposit {
                required: amount.to_string(),
                available: deposit.amount.to_string(),
            })?;

        tunnel.total_deposit = tunnel.total_deposit.checked_sub(&amount).ok_or_else(|| {
            TunnelError::CorruptedState(format!(
                "tunnel {tunnel_id} total deposit {} below a single deposit",
                tunnel.total_deposit
            ))
        })?;

        let store = ctx.store_mut();
        self.deps
            .bank
            .send_coins(store, &Self::module_address(), &withdrawer, &amount)?;

        if deposit.amount.is_zero() {
            self.delete_deposit(store, tunnel_id, &withdrawer);
        } else {
            self.set_deposit(store, &deposit)?;
        }
        self.set_tunnel(store, &tunnel)?;

        info!(
            tunnel_id,
            withdrawer = %withdrawer,
            amount = %amount,
            total_deposit = %tunnel.total_deposit,
            "[qc-18] Deposit withdrawn"
        );
        ctx.emit(TunnelEvent::DepositWithdrawn {
            tunnel_id,
            withdrawer,
            amount,
        });

        if tunnel.is_active && !tunnel.total_deposit.is_all_gte(&params.min_deposit) {
            self.deactivate_tunnel(ctx, tunnel_id, DeactivationReason::DepositBelowMinimum)?;
        }
        Ok(())
    }

    /// Charge the base packet fee to `fee_payer` and add it to the fee total.
    pub fn deduct_base_packet_fee(
        &self,
        ctx: &mut Context<'_>,
        params: &TunnelParams,
        fee_payer: &Address,
    ) -> Result<()> {
        let store = ctx.store_mut();
        self.deps
            .bank
            .send_coins(store, fee_payer, &Self::module_address(), &params.base_packet_fee)?;

        let mut total = self.total_fees(store)?;
        total.total_base_packet_fee = total
            .total_base_packet_fee
            .checked_add(&params.base_packet_fee)
            .ok_or_else(|| {
                amount_overflow(
                    "total base packet fee",
                    &total.total_base_packet_fee,
                    &params.base_packet_fee,
                )
            })?;
        self.set_total_fees(store, &total)?;

        debug!(
            fee_payer = %fee_payer,
            fee = %params.base_packet_fee,
            "[qc-18] Base packet fee charged"
        );
        Ok(())
    }

    /// Transport fee of a route. TSS fees come from the signing coordinator.
    pub fn route_fee(&self, store: &dyn KvStore, route: &Route) -> Result<Coins> {
        match route {
            Route::Tss(_) => self.deps.tss.signing_fee(store),
            _ => Ok(route.fee()),
        }
    }

    /// Base fee plus route fee of the next packet.
    pub fn packet_fee(
        &self,
        store: &dyn KvStore,
        params: &TunnelParams,
        tunnel: &Tunnel,
    ) -> Result<Coins> {
        let route_fee = self.route_fee(store, &tunnel.route)?;
        params
            .base_packet_fee
            .checked_add(&route_fee)
            .ok_or_else(|| amount_overflow("packet fee", &params.base_packet_fee, &route_fee))
    }

    /// Whether the fee payer can cover the next packet. Read-only.
    pub fn has_enough_fund_to_create_packet(
        &self,
        store: &dyn KvStore,
        params: &TunnelParams,
        tunnel: &Tunnel,
    ) -> Result<bool> {
        let required = self.packet_fee(store, params, tunnel)?;
        let balance = self.deps.bank.spendable_coins(store, &tunnel.fee_payer)?;
        Ok(balance.is_all_gte(&required))
    }
}
