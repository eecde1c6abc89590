//! Staging funds for an order's next pre-hook.

use alloy_primitives::{Address, B256, U256};
use tracing::info;

use super::{require_active, OrderManager};
use crate::chain::ChainState;
use crate::domain::{order_hash, Event, StagedFunds};
use crate::error::{OrderError, Result};

impl OrderManager {
    /// Pull `amount` of `token` from `sender` and stage it for the order.
    ///
    /// Only allow-listed funders (and the hooks trampoline) may fund. The
    /// sender must have approved the manager.
    ///
    /// # Errors
    ///
    /// - [`OrderError::Unauthorized`] for any other sender
    /// - [`OrderError::PreHookAlreadyExecuted`] mid-settlement
    /// - [`OrderError::InvalidOrderParams`] when a different token is staged
    /// - ledger errors when the transfer fails
    pub fn fund_order_by_salt(
        &self,
        state: &mut ChainState,
        sender: Address,
        user: Address,
        salt: B256,
        token: Address,
        amount: U256,
    ) -> Result<()> {
        self.require_funder(sender)?;
        self.require_fundable(state, user, salt)?;
        state.transact(|state| -> Result<()> {
            state
                .tokens
                .transfer_from(token, self.address, sender, self.address, amount)?;
            self.stage(state, user, salt, token, amount)
        })
    }

    /// Stage whatever `token` balance the manager holds that no other order
    /// has claimed. Used when funds were pushed to the manager directly.
    ///
    /// # Errors
    ///
    /// Same as [`Self::fund_order_by_salt`], plus
    /// [`OrderError::InvalidOrderParams`] when there is nothing to stage.
    pub fn fund_order_with_balance(
        &self,
        state: &mut ChainState,
        sender: Address,
        user: Address,
        salt: B256,
        token: Address,
    ) -> Result<U256> {
        self.require_funder(sender)?;
        self.require_fundable(state, user, salt)?;
        let amount = self.unstaged_balance(state, token);
        if amount.is_zero() {
            return Err(OrderError::InvalidOrderParams(format!("no unstaged {token} to fund")).into());
        }
        state.transact(|state| -> Result<()> { self.stage(state, user, salt, token, amount) })?;
        Ok(amount)
    }

    /// Manager balance of `token` not staged for any order.
    #[must_use]
    pub fn unstaged_balance(&self, state: &ChainState, token: Address) -> U256 {
        let staged = state
            .orders
            .for_manager(self.address)
            .filter_map(|record| record.staged)
            .filter(|staged| staged.token == token)
            .fold(U256::ZERO, |acc, staged| acc.saturating_add(staged.amount));
        state
            .tokens
            .balance_of(token, self.address)
            .saturating_sub(staged)
    }

    fn require_funder(&self, sender: Address) -> Result<()> {
        if sender == self.hooks_trampoline || self.funders.contains(&sender) {
            return Ok(());
        }
        Err(OrderError::Unauthorized { caller: sender }.into())
    }

    fn require_fundable(&self, state: &ChainState, user: Address, salt: B256) -> Result<()> {
        let record = self.record(state, user, salt)?;
        require_active(record)?;
        if record.pending.is_some() {
            return Err(OrderError::PreHookAlreadyExecuted.into());
        }
        Ok(())
    }

    fn stage(
        &self,
        state: &mut ChainState,
        user: Address,
        salt: B256,
        token: Address,
        amount: U256,
    ) -> Result<()> {
        let hash = order_hash(user, salt);
        let record = state
            .orders
            .get_mut(self.address, hash)
            .ok_or(OrderError::OrderNotFound(hash.as_b256()))?;
        let staged = match record.staged {
            None => StagedFunds { token, amount },
            Some(existing) if existing.token == token => StagedFunds {
                token,
                amount: existing.amount.saturating_add(amount),
            },
            Some(existing) => {
                return Err(OrderError::InvalidOrderParams(format!(
                    "order already staged {}, cannot stage {token}",
                    existing.token
                ))
                .into());
            }
        };
        record.staged = Some(staged);
        state.emit(Event::OrderFunded {
            manager: self.address,
            hash,
            token,
            amount,
        });
        info!(
            manager = %self.address,
            order = %hash,
            %token,
            %amount,
            staged = %staged.amount,
            "Order funded"
        );
        Ok(())
    }
}
