//! Price oracle backed by contract storage.

use alloy_primitives::{keccak256, Address, B256, U256};
use alloy_sol_types::SolValue;

use crate::chain::ChainState;
use crate::error::{Result, TriggerError};

/// USD prices (8 decimals) keyed by token, stored in the oracle's slots so
/// they roll back with the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockOracle {
    address: Address,
}

impl MockOracle {
    #[must_use]
    pub const fn new(address: Address) -> Self {
        Self { address }
    }

    #[must_use]
    pub const fn address(&self) -> Address {
        self.address
    }

    pub fn set_price(&self, state: &mut ChainState, token: Address, price: U256) {
        state.sstore(self.address, slot(token), price);
    }

    /// # Errors
    ///
    /// Returns [`TriggerError::MissingPrice`] when no price was set.
    pub fn price(&self, state: &ChainState, token: Address) -> Result<U256> {
        let price = state.sload(self.address, slot(token));
        if price.is_zero() {
            return Err(TriggerError::MissingPrice(token).into());
        }
        Ok(price)
    }
}

fn slot(token: Address) -> B256 {
    keccak256(token.abi_encode())
}
