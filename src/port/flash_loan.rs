//! Flash-loan liquidity providers.

use alloy_primitives::{Address, U256};

use crate::chain::ChainState;
use crate::domain::LenderId;
use crate::error::Result;

/// What the lender reports when calling the receiver back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlashLoanCallback {
    /// The lender making the callback.
    pub lender: Address,
    pub token: Address,
    pub amount: U256,
    pub fee: U256,
}

/// Receiver logic run while the borrowed funds are out.
pub type FlashLoanHandler<'a> =
    dyn FnMut(&mut ChainState, FlashLoanCallback) -> Result<()> + 'a;

/// Lender of uncollateralized, same-transaction loans.
pub trait FlashLender: Send + Sync {
    fn id(&self) -> &LenderId;

    fn address(&self) -> Address;

    /// Send `amount` of `token` to `receiver`, invoke `handler`, then verify
    /// repayment.
    ///
    /// # Errors
    ///
    /// Returns the handler's error, or
    /// [`RouterError::FlashLoanNotRepaid`](crate::error::RouterError::FlashLoanNotRepaid)
    /// when the loan was not returned.
    fn flash_loan(
        &self,
        state: &mut ChainState,
        receiver: Address,
        token: Address,
        amount: U256,
        handler: &mut FlashLoanHandler<'_>,
    ) -> Result<()>;
}
