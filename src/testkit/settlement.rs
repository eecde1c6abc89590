//! Mock settlement contract.
//!
//! Fills one order per call at oracle prices: verifies appData, optionally
//! takes the appData flash loan, runs pre-hooks through the trampoline,
//! checks the owner's ERC-1271 proof, moves the sell tokens, pays the
//! receiver and runs post-hooks.

use std::sync::Arc;

use alloy_primitives::{Address, Bytes, FixedBytes, U256};
use alloy_sol_types::{SolCall, SolValue};
use tracing::info;

use super::oracle::MockOracle;
use crate::application::hooks::{Hook, HooksTrampoline};
use crate::chain::abi::IOrderManager;
use crate::chain::{ChainState, ContractRegistry};
use crate::domain::math;
use crate::domain::trade::{settlement_domain, ERC1271_MAGIC_VALUE};
use crate::domain::{AppData, HookMetadata, TradeDescriptor};
use crate::error::{Error, Result};
use crate::port::{FlashLender, FlashLoanCallback};

/// What a settlement did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fill {
    pub sell_amount: U256,
    /// Amount paid to the receiver; at least the order's buy amount.
    pub buy_amount: U256,
    /// Number of pre-hooks run.
    pub pre_hooks: usize,
    pub post_hooks: usize,
}

pub struct MockSettlement {
    address: Address,
    trampoline: Arc<HooksTrampoline>,
    contracts: Arc<ContractRegistry>,
    oracle: MockOracle,
    lenders: Vec<Arc<dyn FlashLender>>,
}

impl MockSettlement {
    #[must_use]
    pub fn new(
        address: Address,
        trampoline: Arc<HooksTrampoline>,
        contracts: Arc<ContractRegistry>,
        oracle: MockOracle,
    ) -> Self {
        Self {
            address,
            trampoline,
            contracts,
            oracle,
            lenders: Vec::new(),
        }
    }

    /// Lender available to appData flash loans.
    #[must_use]
    pub fn with_lender(mut self, lender: Arc<dyn FlashLender>) -> Self {
        self.lenders.push(lender);
        self
    }

    #[must_use]
    pub const fn address(&self) -> Address {
        self.address
    }

    /// Settle `trade` for `owner` atomically.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Settlement`] for a rejected proof, an expired order or
    /// a price below the limit and [`Error::Hook`] when a hook reverts;
    /// appData mismatches and ledger failures are passed through. Nothing is
    /// kept on failure.
    pub fn settle(
        &self,
        state: &mut ChainState,
        trade: &TradeDescriptor,
        owner: Address,
        signature: &[u8],
        app_data: &AppData,
    ) -> Result<Fill> {
        state.transact(|state| -> Result<Fill> {
            app_data.verify(trade.app_data)?;
            let Some(loan) = &app_data.metadata.flashloan else {
                return self.fill(state, trade, owner, signature, app_data);
            };

            let lender = self
                .lenders
                .iter()
                .find(|l| l.address() == loan.lender)
                .ok_or_else(|| Error::Settlement(format!("unknown flash lender {}", loan.lender)))?;
            let mut fill = None;
            lender.flash_loan(
                state,
                loan.receiver,
                loan.token,
                loan.amount,
                &mut |state: &mut ChainState, _callback: FlashLoanCallback| -> Result<()> {
                    fill = Some(self.fill(state, trade, owner, signature, app_data)?);
                    Ok(())
                },
            )?;
            fill.ok_or_else(|| Error::Settlement("flash lender never called back".into()))
        })
    }

    fn fill(
        &self,
        state: &mut ChainState,
        trade: &TradeDescriptor,
        owner: Address,
        signature: &[u8],
        app_data: &AppData,
    ) -> Result<Fill> {
        let pre_hooks = self
            .trampoline
            .execute(state, self.address, &hooks(app_data.pre_hooks())?)?;

        if u64::from(trade.valid_to) < state.timestamp() {
            return Err(Error::Settlement(format!("order expired at {}", trade.valid_to)));
        }
        let digest = trade.digest(&settlement_domain(state.chain_id(), self.address));
        let call = IOrderManager::isValidSignatureCall {
            hash: digest,
            signature: Bytes::copy_from_slice(signature),
        };
        let ret = self
            .contracts
            .call(state, self.address, owner, &call.abi_encode())?;
        if FixedBytes::<4>::abi_decode(&ret)? != ERC1271_MAGIC_VALUE {
            return Err(Error::Settlement("signature rejected".into()));
        }

        state.tokens.transfer_from(
            trade.sell_token,
            self.address,
            owner,
            self.address,
            trade.sell_amount,
        )?;
        let paid = self.quote(state, trade)?;
        if paid < trade.buy_amount {
            return Err(Error::Settlement(format!(
                "limit price not met: {paid} < {}",
                trade.buy_amount
            )));
        }
        state.tokens.mint(trade.buy_token, trade.receiver, paid)?;

        let post_hooks = self
            .trampoline
            .execute(state, self.address, &hooks(app_data.post_hooks())?)?;

        info!(
            %owner,
            sell_amount = %trade.sell_amount,
            buy_amount = %paid,
            "Trade settled"
        );
        Ok(Fill {
            sell_amount: trade.sell_amount,
            buy_amount: paid,
            pre_hooks,
            post_hooks,
        })
    }

    fn quote(&self, state: &ChainState, trade: &TradeDescriptor) -> Result<U256> {
        let usd = math::usd_value(
            trade.sell_amount,
            self.oracle.price(state, trade.sell_token)?,
            state.tokens.decimals(trade.sell_token)?,
        );
        Ok(math::token_amount(
            usd,
            self.oracle.price(state, trade.buy_token)?,
            state.tokens.decimals(trade.buy_token)?,
        ))
    }
}

fn hooks(metadata: &[HookMetadata]) -> Result<Vec<Hook>> {
    metadata.iter().map(Hook::from_metadata).collect()
}
