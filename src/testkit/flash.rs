//! Mock flash lender.

use alloy_primitives::{Address, U256};

use crate::chain::ChainState;
use crate::domain::math::{self, BPS};
use crate::domain::LenderId;
use crate::error::{Result, RouterError};
use crate::port::{FlashLender, FlashLoanCallback, FlashLoanHandler};

/// How the lender behaves around the callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LenderBehavior {
    Honest,
    /// Reports another address as the lender in the callback.
    Spoofed(Address),
    /// Invokes the callback twice.
    DoubleCallback,
    /// Returns without lending or calling back.
    NoCallback,
}

/// Lends from its own balance and expects `amount + fee` back by the time
/// the callback returns.
pub struct MockFlashLender {
    id: LenderId,
    address: Address,
    fee_bps: u16,
    behavior: LenderBehavior,
}

impl MockFlashLender {
    #[must_use]
    pub fn new(id: &str, address: Address) -> Self {
        Self {
            id: LenderId::new(id),
            address,
            fee_bps: 0,
            behavior: LenderBehavior::Honest,
        }
    }

    #[must_use]
    pub fn fee_bps(mut self, bps: u16) -> Self {
        self.fee_bps = bps;
        self
    }

    #[must_use]
    pub fn behavior(mut self, behavior: LenderBehavior) -> Self {
        self.behavior = behavior;
        self
    }
}

impl FlashLender for MockFlashLender {
    fn id(&self) -> &LenderId {
        &self.id
    }

    fn address(&self) -> Address {
        self.address
    }

    fn flash_loan(
        &self,
        state: &mut ChainState,
        receiver: Address,
        token: Address,
        amount: U256,
        handler: &mut FlashLoanHandler<'_>,
    ) -> Result<()> {
        if self.behavior == LenderBehavior::NoCallback {
            return Ok(());
        }
        let fee = math::mul_div(amount, U256::from(self.fee_bps), U256::from(BPS));
        let before = state.tokens.balance_of(token, self.address);
        state.tokens.transfer(token, self.address, receiver, amount)?;

        let callback = FlashLoanCallback {
            lender: self.address,
            token,
            amount,
            fee,
        };
        match self.behavior {
            LenderBehavior::Honest => handler(state, callback)?,
            LenderBehavior::Spoofed(lender) => handler(state, FlashLoanCallback { lender, ..callback })?,
            LenderBehavior::DoubleCallback => {
                handler(state, callback)?;
                handler(state, callback)?;
            }
            LenderBehavior::NoCallback => {}
        }

        let after = state.tokens.balance_of(token, self.address);
        if after < before.saturating_add(fee) {
            return Err(RouterError::FlashLoanNotRepaid {
                lender: self.address,
                token,
                amount: amount + fee,
            }
            .into());
        }
        Ok(())
    }
}
