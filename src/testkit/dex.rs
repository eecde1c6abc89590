//! Mock DEX gateway swapping at oracle prices.

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolValue;

use super::oracle::MockOracle;
use crate::chain::ChainState;
use crate::domain::math;
use crate::domain::{LendingAction, LendingOp, Output, ProtocolName};
use crate::error::{Error, Result, RouterError};
use crate::port::{Authorization, Gateway, GatewayCall};

/// Swaps `op.token` into the token named by the op's context, minting the
/// proceeds at the oracle rate less `fee_bps`.
pub struct MockDex {
    name: ProtocolName,
    address: Address,
    oracle: MockOracle,
    fee_bps: u16,
}

impl MockDex {
    #[must_use]
    pub fn new(name: &str, address: Address, oracle: MockOracle) -> Self {
        Self {
            name: ProtocolName::new(name),
            address,
            oracle,
            fee_bps: 0,
        }
    }

    #[must_use]
    pub fn fee_bps(mut self, bps: u16) -> Self {
        self.fee_bps = bps;
        self
    }

    #[must_use]
    pub const fn address(&self) -> Address {
        self.address
    }

    /// Swap context selecting the output token.
    #[must_use]
    pub fn route(token_out: Address) -> Bytes {
        token_out.abi_encode().into()
    }

    /// Output amount for swapping `amount` of `token_in`.
    ///
    /// # Errors
    ///
    /// Returns an error for unpriced or unregistered tokens.
    pub fn quote(
        &self,
        state: &ChainState,
        token_in: Address,
        token_out: Address,
        amount: U256,
    ) -> Result<U256> {
        let usd = math::usd_value(
            amount,
            self.oracle.price(state, token_in)?,
            state.tokens.decimals(token_in)?,
        );
        let out = math::token_amount(
            usd,
            self.oracle.price(state, token_out)?,
            state.tokens.decimals(token_out)?,
        );
        Ok(math::apply_haircut(out, self.fee_bps))
    }

    fn fail(&self, reason: String) -> Error {
        RouterError::Gateway {
            protocol: self.name.to_string(),
            reason,
        }
        .into()
    }
}

impl Gateway for MockDex {
    fn name(&self) -> &str {
        self.name.as_str()
    }

    fn spender(&self) -> Address {
        self.address
    }

    fn authorize(
        &self,
        _state: &ChainState,
        _ops: &[LendingOp],
        _user: Address,
        _operator: Address,
    ) -> Result<Vec<Authorization>> {
        Ok(Vec::new())
    }

    fn execute(&self, state: &mut ChainState, call: GatewayCall<'_>) -> Result<Vec<Output>> {
        let op = call.op;
        if op.action != LendingAction::Swap {
            return Err(self.fail(format!("{} is not supported", op.action.as_str())));
        }
        let token_out = Address::abi_decode(&op.context)
            .map_err(|e| self.fail(format!("bad swap context: {e}")))?;
        let out = self.quote(state, op.token, token_out, op.amount)?;

        state
            .tokens
            .transfer_from(op.token, self.address, call.router, self.address, op.amount)?;
        state.tokens.mint(token_out, call.router, out)?;
        Ok(vec![Output::new(out, token_out, op.user)])
    }
}
