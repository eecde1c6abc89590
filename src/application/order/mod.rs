//! Conditional order manager.
//!
//! Users register standing orders that a trigger policy gates. The external
//! settlement network discovers them through `OrderCreated`, asks for the
//! current trade, and fills it between a pre-hook and a post-hook that both
//! drive the router. The manager proves order validity to the settlement
//! through an ERC-1271 check that recomputes the trade from chain state.
//!
//! Lifecycle: `None -> Active -> Completed`, `Active -> Cancelled`.

mod funding;
mod hooks;
mod signature;

use std::collections::HashSet;
use std::sync::Arc;

use alloy_primitives::{Address, Bytes, B256};
use alloy_sol_types::Eip712Domain;
use tracing::info;

use super::hooks::Hook;
use super::router::Router;
use super::trigger::TriggerRegistry;
use crate::chain::ChainState;
use crate::domain::trade::settlement_domain;
use crate::domain::{
    order_hash, AppData, Event, OrderHash, OrderKind, OrderParams, OrderRecord, OrderStatus,
    PendingTrade, TradeDescriptor, POST_HOOK_SEEDS, PRE_HOOK_SEEDS,
};
use crate::error::{OrderError, Result};
use crate::port::Trigger;

/// Default length of a trade validity window in seconds.
pub const DEFAULT_VALIDITY_WINDOW: u64 = 1_800;

/// The order manager contract.
pub struct OrderManager {
    address: Address,
    router: Arc<Router>,
    triggers: TriggerRegistry,
    hooks_trampoline: Address,
    settlement: Address,
    funders: HashSet<Address>,
    validity_window: u64,
}

impl OrderManager {
    #[must_use]
    pub fn builder(address: Address, router: Arc<Router>) -> OrderManagerBuilder {
        OrderManagerBuilder::new(address, router)
    }

    #[must_use]
    pub const fn address(&self) -> Address {
        self.address
    }

    #[must_use]
    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    #[must_use]
    pub const fn hooks_trampoline(&self) -> Address {
        self.hooks_trampoline
    }

    #[must_use]
    pub const fn settlement(&self) -> Address {
        self.settlement
    }

    #[must_use]
    pub const fn validity_window(&self) -> u64 {
        self.validity_window
    }

    /// EIP-712 domain of the settlement on this chain.
    #[must_use]
    pub fn domain(&self, state: &ChainState) -> Eip712Domain {
        settlement_domain(state.chain_id(), self.settlement)
    }

    /// Stored record of an order.
    #[must_use]
    pub fn get_order<'a>(
        &self,
        state: &'a ChainState,
        user: Address,
        salt: B256,
    ) -> Option<&'a OrderRecord> {
        state.orders.get(self.address, order_hash(user, salt))
    }

    /// Register a conditional order for `params.user`.
    ///
    /// # Errors
    ///
    /// - [`OrderError::Unauthorized`] when `sender` is not the order's user
    /// - [`OrderError::InstructionUserMismatch`] when an embedded instruction
    ///   acts for someone else
    /// - [`OrderError::InvalidTrigger`] for a zero or unknown trigger
    /// - [`OrderError::InvalidOrderParams`] for inconsistent tokens or iterations
    /// - [`OrderError::OrderAlreadyExists`] for a reused `(user, salt)`
    /// - trigger or router errors for bad static data or instruction layouts
    pub fn create_order(
        &self,
        state: &mut ChainState,
        sender: Address,
        params: OrderParams,
        salt: B256,
    ) -> Result<OrderHash> {
        if sender != params.user {
            return Err(OrderError::Unauthorized { caller: sender }.into());
        }
        check_instruction_users(&params)?;

        let trigger = self.triggers.get(params.trigger)?;
        trigger.validate(&params.trigger_static_data)?;

        if params.sell_token.is_zero() || params.buy_token.is_zero() {
            return Err(OrderError::InvalidOrderParams("zero token address".into()).into());
        }
        if params.sell_token == params.buy_token {
            return Err(
                OrderError::InvalidOrderParams("sell and buy token must differ".into()).into(),
            );
        }
        if params.max_iterations == 0 {
            return Err(
                OrderError::InvalidOrderParams("max_iterations must be at least 1".into()).into(),
            );
        }
        self.router
            .validate_layout(&params.pre_instructions, PRE_HOOK_SEEDS)?;
        self.router
            .validate_layout(&params.post_instructions, POST_HOOK_SEEDS)?;

        let hash = order_hash(params.user, salt);
        if state.orders.contains(self.address, hash) {
            return Err(OrderError::OrderAlreadyExists(hash.as_b256()).into());
        }

        state.transact(|state| -> Result<OrderHash> {
            let user = params.user;
            let trigger_address = params.trigger;
            let now = state.timestamp();
            state
                .orders
                .insert(self.address, OrderRecord::new(params, salt, now));
            state.emit(Event::OrderCreated {
                manager: self.address,
                hash,
                user,
                salt,
                trigger: trigger_address,
            });
            info!(
                manager = %self.address,
                order = %hash,
                %user,
                trigger = trigger.name(),
                "Order created"
            );
            Ok(hash)
        })
    }

    /// Cancel an active order with no trade in flight and no staged funds.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::Unauthorized`] for anyone but the order's user,
    /// [`OrderError::PreHookAlreadyExecuted`] mid-settlement and
    /// [`OrderError::InvalidOrderState`] otherwise.
    pub fn cancel_order(
        &self,
        state: &mut ChainState,
        sender: Address,
        user: Address,
        salt: B256,
    ) -> Result<()> {
        let record = self.record(state, user, salt)?;
        if sender != record.params.user {
            return Err(OrderError::Unauthorized { caller: sender }.into());
        }
        require_active(record)?;
        if record.pending.is_some() {
            return Err(OrderError::PreHookAlreadyExecuted.into());
        }
        if record.staged.is_some() {
            return Err(OrderError::InvalidOrderState {
                status: "funded",
                expected: "active without staged funds",
            }
            .into());
        }

        let hash = order_hash(user, salt);
        state.transact(|state| -> Result<()> {
            let record = state
                .orders
                .get_mut(self.address, hash)
                .ok_or(OrderError::OrderNotFound(hash.as_b256()))?;
            record.status = OrderStatus::Cancelled;
            state.emit(Event::OrderCancelled {
                manager: self.address,
                hash,
            });
            info!(manager = %self.address, order = %hash, %user, "Order cancelled");
            Ok(())
        })
    }

    /// The trade the settlement may fill right now.
    ///
    /// While a pre-hook's trade is pending the frozen snapshot is returned;
    /// otherwise the trigger is consulted.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::TriggerNotMet`] when the trigger refuses, and
    /// lookup or state errors for unknown or inactive orders.
    pub fn get_tradeable_order(
        &self,
        state: &ChainState,
        user: Address,
        salt: B256,
    ) -> Result<TradeDescriptor> {
        let record = self.record(state, user, salt)?;
        require_active(record)?;
        let trade = match record.pending {
            Some(pending) => pending,
            None => self.quote(state, record)?,
        };
        Ok(self.descriptor(record, trade))
    }

    /// [`Self::get_tradeable_order`] plus the ERC-1271 signature payload.
    ///
    /// # Errors
    ///
    /// Same as [`Self::get_tradeable_order`].
    pub fn get_tradeable_order_with_signature(
        &self,
        state: &ChainState,
        user: Address,
        salt: B256,
    ) -> Result<(TradeDescriptor, Bytes)> {
        let trade = self.get_tradeable_order(state, user, salt)?;
        Ok((trade, self.encode_signature(user, salt)))
    }

    /// appData wiring the manager's pre- and post-hook for an order.
    #[must_use]
    pub fn hooks_app_data(
        &self,
        user: Address,
        salt: B256,
        app_code: &str,
        gas_limit: u64,
    ) -> AppData {
        let pre = Hook::pre_hook(self.address, user, salt, gas_limit);
        let post = Hook::post_hook(self.address, user, salt, gas_limit);
        AppData::new(app_code)
            .with_pre_hook(pre.target, pre.call_data, gas_limit)
            .with_post_hook(post.target, post.call_data, gas_limit)
    }

    fn record<'a>(
        &self,
        state: &'a ChainState,
        user: Address,
        salt: B256,
    ) -> Result<&'a OrderRecord> {
        let hash = order_hash(user, salt);
        state
            .orders
            .get(self.address, hash)
            .ok_or_else(|| OrderError::OrderNotFound(hash.as_b256()).into())
    }

    fn trigger(&self, record: &OrderRecord) -> Result<&Arc<dyn Trigger>> {
        Ok(self.triggers.get(record.params.trigger)?)
    }

    /// Ask the trigger for the current trade.
    fn quote(&self, state: &ChainState, record: &OrderRecord) -> Result<PendingTrade> {
        let params = &record.params;
        let trigger = self.trigger(record)?;
        let decision = trigger.should_execute(state, params.user, &params.trigger_static_data)?;
        if !decision.execute {
            return Err(OrderError::TriggerNotMet {
                reason: decision.reason,
            }
            .into());
        }
        let amounts = trigger.calculate_execution(
            state,
            params.user,
            &params.trigger_static_data,
            record.iteration_count,
        )?;
        if amounts.sell_amount.is_zero() {
            return Err(OrderError::TriggerNotMet {
                reason: "Nothing to sell".into(),
            }
            .into());
        }
        Ok(PendingTrade {
            sell_amount: amounts.sell_amount,
            buy_amount: amounts.buy_amount,
            valid_to: self.valid_to(state.timestamp()),
        })
    }

    /// End of the validity window containing `timestamp`.
    fn valid_to(&self, timestamp: u64) -> u32 {
        let window = self.validity_window.max(1);
        let end = (timestamp / window + 1).saturating_mul(window);
        u32::try_from(end).unwrap_or(u32::MAX)
    }

    fn descriptor(&self, record: &OrderRecord, trade: PendingTrade) -> TradeDescriptor {
        let params = &record.params;
        TradeDescriptor {
            sell_token: params.sell_token,
            buy_token: params.buy_token,
            receiver: self.address,
            sell_amount: trade.sell_amount,
            buy_amount: trade.buy_amount,
            valid_to: trade.valid_to,
            app_data: params.app_data_hash,
            fee_amount: alloy_primitives::U256::ZERO,
            kind: if params.is_kind_buy {
                OrderKind::Buy
            } else {
                OrderKind::Sell
            },
            partially_fillable: false,
        }
    }

    fn require_trampoline(&self, sender: Address) -> Result<()> {
        if sender != self.hooks_trampoline {
            return Err(OrderError::Unauthorized { caller: sender }.into());
        }
        Ok(())
    }
}

fn require_active(record: &OrderRecord) -> std::result::Result<(), OrderError> {
    if record.status != OrderStatus::Active {
        return Err(OrderError::InvalidOrderState {
            status: record.status.as_str(),
            expected: OrderStatus::Active.as_str(),
        });
    }
    Ok(())
}

fn check_instruction_users(params: &OrderParams) -> std::result::Result<(), OrderError> {
    let lists = [
        ("pre", &params.pre_instructions),
        ("post", &params.post_instructions),
    ];
    for (list, instructions) in lists {
        for (index, instruction) in instructions.iter().enumerate() {
            if let Some(found) = instruction.user() {
                if found != params.user {
                    return Err(OrderError::InstructionUserMismatch {
                        list,
                        index,
                        expected: params.user,
                        found,
                    });
                }
            }
        }
    }
    Ok(())
}

/// Builder for [`OrderManager`].
pub struct OrderManagerBuilder {
    address: Address,
    router: Arc<Router>,
    triggers: TriggerRegistry,
    hooks_trampoline: Address,
    settlement: Address,
    funders: HashSet<Address>,
    validity_window: u64,
}

impl OrderManagerBuilder {
    #[must_use]
    pub fn new(address: Address, router: Arc<Router>) -> Self {
        Self {
            address,
            router,
            triggers: TriggerRegistry::new(),
            hooks_trampoline: Address::ZERO,
            settlement: Address::ZERO,
            funders: HashSet::new(),
            validity_window: DEFAULT_VALIDITY_WINDOW,
        }
    }

    #[must_use]
    pub fn hooks_trampoline(mut self, address: Address) -> Self {
        self.hooks_trampoline = address;
        self
    }

    #[must_use]
    pub fn settlement(mut self, address: Address) -> Self {
        self.settlement = address;
        self
    }

    #[must_use]
    pub fn trigger(mut self, address: Address, trigger: Arc<dyn Trigger>) -> Self {
        self.triggers.register(address, trigger);
        self
    }

    #[must_use]
    pub fn triggers(mut self, triggers: TriggerRegistry) -> Self {
        self.triggers = triggers;
        self
    }

    /// Allow `funder` to deliver funds to orders.
    #[must_use]
    pub fn funder(mut self, funder: Address) -> Self {
        self.funders.insert(funder);
        self
    }

    #[must_use]
    pub fn validity_window(mut self, secs: u64) -> Self {
        self.validity_window = secs;
        self
    }

    #[must_use]
    pub fn build(self) -> OrderManager {
        OrderManager {
            address: self.address,
            router: self.router,
            triggers: self.triggers,
            hooks_trampoline: self.hooks_trampoline,
            settlement: self.settlement,
            funders: self.funders,
            validity_window: self.validity_window,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(window: u64) -> OrderManager {
        let router = Arc::new(Router::builder(Address::repeat_byte(1)).build());
        OrderManager::builder(Address::repeat_byte(2), router)
            .validity_window(window)
            .build()
    }

    #[test]
    fn valid_to_is_end_of_window() {
        let m = manager(1_800);
        assert_eq!(m.valid_to(0), 1_800);
        assert_eq!(m.valid_to(1_799), 1_800);
        assert_eq!(m.valid_to(1_800), 3_600);
        assert_eq!(m.valid_to(u64::MAX - 1), u32::MAX);
    }
}
