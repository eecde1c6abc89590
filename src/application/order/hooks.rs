//! Pre- and post-settlement hooks.

use alloy_primitives::{Address, B256, U256};
use tracing::info;

use super::{require_active, OrderManager};
use crate::application::router::Seed;
use crate::chain::ChainState;
use crate::domain::{order_hash, Event, OrderStatus, Output};
use crate::error::{OrderError, Result};

impl OrderManager {
    /// Freeze the current trade and run `pre_instructions` so the manager
    /// holds the sell amount, then approve the settlement for it.
    ///
    /// The router sees two seeds: `[0]` the virtual sell amount and `[1]`
    /// the staged funds (a zero buy-token output when nothing was staged).
    ///
    /// # Errors
    ///
    /// - [`OrderError::Unauthorized`] unless called by the hooks trampoline
    /// - [`OrderError::PreHookAlreadyExecuted`] while a trade is pending
    /// - [`OrderError::TriggerNotMet`] when the trigger refuses
    /// - [`OrderError::InsufficientSellBalance`] when the instructions did not
    ///   deliver the sell amount
    /// - any router error raised by the instructions
    pub fn execute_pre_hook_by_salt(
        &self,
        state: &mut ChainState,
        sender: Address,
        user: Address,
        salt: B256,
    ) -> Result<()> {
        self.require_trampoline(sender)?;
        state.transact(|state| -> Result<()> {
            let hash = order_hash(user, salt);
            let record = self.record(state, user, salt)?.clone();
            require_active(&record)?;
            if record.pending.is_some() {
                return Err(OrderError::PreHookAlreadyExecuted.into());
            }
            let trade = self.quote(state, &record)?;
            let params = &record.params;

            // the signature check reads this snapshot until the post-hook
            let stored = state
                .orders
                .get_mut(self.address, hash)
                .ok_or(OrderError::OrderNotFound(hash.as_b256()))?;
            stored.pending = Some(trade);
            stored.staged = None;

            let funded = record.staged.map_or_else(
                || Output::placeholder(params.buy_token, user),
                |staged| Output::new(staged.amount, staged.token, user),
            );
            let seeds = [
                Seed::Virtual(Output::new(trade.sell_amount, params.sell_token, user)),
                Seed::Funded(funded),
            ];
            self.router.execute_with_inputs(
                state,
                self.address,
                &params.pre_instructions,
                user,
                &seeds,
            )?;

            let available = self.unstaged_balance(state, params.sell_token);
            if available < trade.sell_amount {
                return Err(OrderError::InsufficientSellBalance {
                    token: params.sell_token,
                    needed: trade.sell_amount,
                    available,
                }
                .into());
            }
            state.tokens.approve(
                params.sell_token,
                self.address,
                self.settlement,
                trade.sell_amount,
            );

            state.emit(Event::PreHookExecuted {
                manager: self.address,
                hash,
                iteration: record.iteration_count,
                sell_amount: trade.sell_amount,
                buy_amount: trade.buy_amount,
            });
            info!(
                manager = %self.address,
                order = %hash,
                iteration = record.iteration_count,
                sell_amount = %trade.sell_amount,
                buy_amount = %trade.buy_amount,
                valid_to = trade.valid_to,
                "Pre-hook executed"
            );
            Ok(())
        })
    }

    /// Settle the books after a fill: refund leftover sell tokens, run
    /// `post_instructions` over the proceeds, check the manager kept nothing,
    /// and advance or complete the order.
    ///
    /// The router sees one seed: `[0]` the buy-token proceeds.
    ///
    /// # Errors
    ///
    /// - [`OrderError::Unauthorized`] unless called by the hooks trampoline
    /// - [`OrderError::PreHookNotExecuted`] without a pending trade
    /// - [`OrderError::ResidualBalance`] when tokens are left in the manager
    /// - any router error raised by the instructions
    pub fn execute_post_hook_by_salt(
        &self,
        state: &mut ChainState,
        sender: Address,
        user: Address,
        salt: B256,
    ) -> Result<()> {
        self.require_trampoline(sender)?;
        state.transact(|state| -> Result<()> {
            let hash = order_hash(user, salt);
            let record = self.record(state, user, salt)?.clone();
            require_active(&record)?;
            if record.pending.is_none() {
                return Err(OrderError::PreHookNotExecuted.into());
            }
            let params = &record.params;

            let leftover = self.unstaged_balance(state, params.sell_token);
            if !leftover.is_zero() {
                state.tokens.transfer(
                    params.sell_token,
                    self.address,
                    params.refund_address(),
                    leftover,
                )?;
            }

            let proceeds = self.unstaged_balance(state, params.buy_token);
            let seeds = [Seed::Funded(Output::new(proceeds, params.buy_token, user))];
            self.router.execute_with_inputs(
                state,
                self.address,
                &params.post_instructions,
                user,
                &seeds,
            )?;

            for token in [params.sell_token, params.buy_token] {
                let amount = self.unstaged_balance(state, token);
                if !amount.is_zero() {
                    return Err(OrderError::ResidualBalance { token, amount }.into());
                }
            }
            state
                .tokens
                .approve(params.sell_token, self.address, self.settlement, U256::ZERO);

            let iteration = record.iteration_count + 1;
            let complete = iteration >= params.max_iterations
                || self.trigger(&record)?.is_complete(
                    state,
                    user,
                    &params.trigger_static_data,
                    iteration,
                )?;

            let stored = state
                .orders
                .get_mut(self.address, hash)
                .ok_or(OrderError::OrderNotFound(hash.as_b256()))?;
            stored.pending = None;
            stored.iteration_count = iteration;
            if complete {
                stored.status = OrderStatus::Completed;
            }

            state.emit(Event::PostHookExecuted {
                manager: self.address,
                hash,
                iteration,
                proceeds,
            });
            info!(
                manager = %self.address,
                order = %hash,
                iteration,
                %proceeds,
                "Post-hook executed"
            );
            if complete {
                state.emit(Event::OrderCompleted {
                    manager: self.address,
                    hash,
                    iterations: iteration,
                });
                info!(manager = %self.address, order = %hash, iterations = iteration, "Order completed");
            }
            Ok(())
        })
    }
}
