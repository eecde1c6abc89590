//! Mock lending venue: gateway, view aggregator and delegation contract in one.
//!
//! Positions live in the venue's storage slots so they roll back with the
//! chain. Debt accrues linearly at a fixed APR.

use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use alloy_sol_types::{SolCall, SolValue};

use super::oracle::MockOracle;
use crate::chain::ChainState;
use crate::domain::math::{self, BPS};
use crate::domain::{LendingAction, LendingOp, Output, ProtocolId, ProtocolName};
use crate::error::{Error, Result, RouterError};
use crate::port::{Authorization, Contract, Gateway, GatewayCall, PositionValue, ViewAggregator};

alloy_sol_types::sol! {
    interface IMockVenue {
        function setDelegate(address delegate, bool allowed) external;
    }
}

const YEAR_SECS: u64 = 365 * 24 * 60 * 60;

const COLLATERAL: u8 = 1;
const DEBT: u8 = 2;
const ACCRUED_AT: u8 = 3;
const DELEGATE: u8 = 4;

/// A single-market lending venue.
pub struct MockLendingVenue {
    name: ProtocolName,
    id: ProtocolId,
    address: Address,
    oracle: MockOracle,
    tokens: Vec<Address>,
    apr_bps: u64,
    max_ltv_bps: u64,
}

impl MockLendingVenue {
    #[must_use]
    pub fn new(name: &str, id: u8, address: Address, oracle: MockOracle) -> Self {
        Self {
            name: ProtocolName::new(name),
            id: ProtocolId::new(id),
            address,
            oracle,
            tokens: Vec::new(),
            apr_bps: 0,
            max_ltv_bps: 8_000,
        }
    }

    /// List `token` as collateral and borrowable asset.
    #[must_use]
    pub fn with_token(mut self, token: Address) -> Self {
        self.tokens.push(token);
        self
    }

    #[must_use]
    pub fn apr_bps(mut self, bps: u64) -> Self {
        self.apr_bps = bps;
        self
    }

    #[must_use]
    pub fn max_ltv_bps(mut self, bps: u64) -> Self {
        self.max_ltv_bps = bps;
        self
    }

    #[must_use]
    pub const fn address(&self) -> Address {
        self.address
    }

    #[must_use]
    pub fn protocol_name(&self) -> &ProtocolName {
        &self.name
    }

    #[must_use]
    pub fn collateral(&self, state: &ChainState, user: Address, token: Address) -> U256 {
        state.sload(self.address, slot(COLLATERAL, user, token))
    }

    /// Debt including interest accrued up to the current block.
    #[must_use]
    pub fn debt(&self, state: &ChainState, user: Address, token: Address) -> U256 {
        let principal = state.sload(self.address, slot(DEBT, user, token));
        if principal.is_zero() || self.apr_bps == 0 {
            return principal;
        }
        let since = state.sload(self.address, slot(ACCRUED_AT, user, token));
        let elapsed = U256::from(state.timestamp()).saturating_sub(since);
        let interest = math::mul_div(
            principal,
            U256::from(self.apr_bps) * elapsed,
            U256::from(BPS) * U256::from(YEAR_SECS),
        );
        principal + interest
    }

    #[must_use]
    pub fn is_delegate(&self, state: &ChainState, user: Address, delegate: Address) -> bool {
        !state
            .sload(self.address, slot(DELEGATE, user, delegate))
            .is_zero()
    }

    /// Seed a position directly: collateral held by the venue, borrowed
    /// funds minted to the user.
    ///
    /// # Errors
    ///
    /// Returns a ledger error for unregistered tokens.
    pub fn open_position(
        &self,
        state: &mut ChainState,
        user: Address,
        collateral: (Address, U256),
        debt: (Address, U256),
    ) -> Result<()> {
        state.tokens.mint(collateral.0, self.address, collateral.1)?;
        self.add_collateral(state, user, collateral.0, collateral.1);
        let owed = self.debt(state, user, debt.0);
        self.set_debt(state, user, debt.0, owed + debt.1);
        state.tokens.mint(debt.0, user, debt.1)?;
        Ok(())
    }

    /// Calldata a user sends to let `delegate` act on their position.
    #[must_use]
    pub fn delegation_call(delegate: Address, allowed: bool) -> Bytes {
        IMockVenue::setDelegateCall { delegate, allowed }
            .abi_encode()
            .into()
    }

    fn add_collateral(&self, state: &mut ChainState, user: Address, token: Address, amount: U256) {
        let key = slot(COLLATERAL, user, token);
        let current = state.sload(self.address, key);
        state.sstore(self.address, key, current + amount);
    }

    /// Store `amount` as principal and restart accrual from now.
    fn set_debt(&self, state: &mut ChainState, user: Address, token: Address, amount: U256) {
        state.sstore(self.address, slot(DEBT, user, token), amount);
        let now = U256::from(state.timestamp());
        state.sstore(self.address, slot(ACCRUED_AT, user, token), now);
    }

    fn position(&self, state: &ChainState, owner: Address) -> Result<PositionValue> {
        let mut value = PositionValue::default();
        for &token in &self.tokens {
            let collateral = self.collateral(state, owner, token);
            let debt = self.debt(state, owner, token);
            if collateral.is_zero() && debt.is_zero() {
                continue;
            }
            let price = self.oracle.price(state, token)?;
            let decimals = state.tokens.decimals(token)?;
            value.collateral_usd += math::usd_value(collateral, price, decimals);
            value.debt_usd += math::usd_value(debt, price, decimals);
        }
        Ok(value)
    }

    fn check_health(&self, state: &ChainState, user: Address) -> Result<()> {
        let position = self.position(state, user)?;
        let ltv = math::ltv_bps(position.collateral_usd, position.debt_usd);
        if !position.debt_usd.is_zero()
            && (position.collateral_usd.is_zero() || ltv > U256::from(self.max_ltv_bps))
        {
            return Err(self.fail(format!("position of {user} above max LTV ({ltv} bps)")));
        }
        Ok(())
    }

    fn require_delegate(&self, state: &ChainState, user: Address, caller: Address) -> Result<()> {
        if user != caller && !self.is_delegate(state, user, caller) {
            return Err(self.fail(format!("{caller} is not a delegate of {user}")));
        }
        Ok(())
    }

    fn fail(&self, reason: String) -> Error {
        RouterError::Gateway {
            protocol: self.name.to_string(),
            reason,
        }
        .into()
    }
}

fn slot(kind: u8, a: Address, b: Address) -> B256 {
    keccak256((U256::from(kind), a, b).abi_encode())
}

const fn needs_delegation(action: LendingAction) -> bool {
    matches!(
        action,
        LendingAction::Borrow | LendingAction::WithdrawCollateral | LendingAction::Withdraw
    )
}

impl Gateway for MockLendingVenue {
    fn name(&self) -> &str {
        self.name.as_str()
    }

    fn spender(&self) -> Address {
        self.address
    }

    fn authorize(
        &self,
        state: &ChainState,
        ops: &[LendingOp],
        user: Address,
        operator: Address,
    ) -> Result<Vec<Authorization>> {
        let needed = ops.iter().any(|op| needs_delegation(op.action));
        if needed && !self.is_delegate(state, user, operator) {
            return Ok(vec![Authorization::new(
                self.address,
                Self::delegation_call(operator, true),
            )]);
        }
        Ok(Vec::new())
    }

    fn execute(&self, state: &mut ChainState, call: GatewayCall<'_>) -> Result<Vec<Output>> {
        let op = call.op;
        if !self.tokens.contains(&op.token) {
            return Err(self.fail(format!("token {} not listed", op.token)));
        }
        match op.action {
            LendingAction::Deposit | LendingAction::DepositCollateral => {
                state
                    .tokens
                    .transfer_from(op.token, self.address, call.router, self.address, op.amount)?;
                self.add_collateral(state, op.user, op.token, op.amount);
                Ok(Vec::new())
            }
            LendingAction::Repay => {
                let owed = self.debt(state, op.user, op.token);
                let paid = op.amount.min(owed);
                state
                    .tokens
                    .transfer_from(op.token, self.address, call.router, self.address, paid)?;
                self.set_debt(state, op.user, op.token, owed - paid);
                Ok(Vec::new())
            }
            LendingAction::Borrow => {
                self.require_delegate(state, op.user, call.router)?;
                let owed = self.debt(state, op.user, op.token);
                self.set_debt(state, op.user, op.token, owed + op.amount);
                state
                    .tokens
                    .transfer(op.token, self.address, call.router, op.amount)?;
                self.check_health(state, op.user)?;
                Ok(vec![Output::new(op.amount, op.token, op.user)])
            }
            LendingAction::WithdrawCollateral | LendingAction::Withdraw => {
                self.require_delegate(state, op.user, call.router)?;
                let key = slot(COLLATERAL, op.user, op.token);
                let held = state.sload(self.address, key);
                if held < op.amount {
                    return Err(self.fail(format!(
                        "withdraw {} exceeds collateral {held}",
                        op.amount
                    )));
                }
                state.sstore(self.address, key, held - op.amount);
                state
                    .tokens
                    .transfer(op.token, self.address, call.router, op.amount)?;
                self.check_health(state, op.user)?;
                Ok(vec![Output::new(op.amount, op.token, op.user)])
            }
            LendingAction::Swap => Err(self.fail("swaps are not supported".into())),
        }
    }
}

impl ViewAggregator for MockLendingVenue {
    fn protocol_id(&self) -> ProtocolId {
        self.id
    }

    fn position_value(
        &self,
        state: &ChainState,
        owner: Address,
        _context: &[u8],
    ) -> Result<PositionValue> {
        self.position(state, owner)
    }

    fn asset_price(&self, state: &ChainState, token: Address) -> Result<U256> {
        self.oracle.price(state, token)
    }
}

impl Contract for MockLendingVenue {
    fn address(&self) -> Address {
        self.address
    }

    fn call(&self, state: &mut ChainState, sender: Address, data: &[u8]) -> Result<Bytes> {
        let call = IMockVenue::setDelegateCall::abi_decode(data)?;
        let value = if call.allowed { U256::from(1) } else { U256::ZERO };
        state.sstore(self.address, slot(DELEGATE, sender, call.delegate), value);
        Ok(Bytes::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::tokens::{self, eth, usd, usdc, ALICE, USDC, WETH};

    fn venue() -> (ChainState, MockLendingVenue) {
        let mut state = ChainState::new(1);
        tokens::install(&mut state);
        let oracle = MockOracle::new(Address::repeat_byte(0x0c));
        oracle.set_price(&mut state, WETH, usd(3_000));
        oracle.set_price(&mut state, USDC, usd(1));
        let venue = MockLendingVenue::new("venue", 1, Address::repeat_byte(0xee), oracle)
            .with_token(WETH)
            .with_token(USDC)
            .apr_bps(500);
        (state, venue)
    }

    #[test]
    fn debt_accrues_linearly() {
        let (mut state, venue) = venue();
        venue
            .open_position(&mut state, ALICE, (WETH, eth(10)), (USDC, usdc(16_000)))
            .unwrap();
        state.advance(YEAR_SECS);
        assert_eq!(venue.debt(&state, ALICE, USDC), usdc(16_800));
    }

    #[test]
    fn position_is_valued_at_oracle_prices() {
        let (mut state, venue) = venue();
        venue
            .open_position(&mut state, ALICE, (WETH, eth(1)), (USDC, usdc(1_000)))
            .unwrap();
        let value = venue.position_value(&state, ALICE, &[]).unwrap();
        assert_eq!(value.collateral_usd, usd(3_000));
        assert_eq!(value.debt_usd, usd(1_000));
    }
}
