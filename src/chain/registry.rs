//! Dispatch of raw calldata to contracts living on the simulated chain.

use std::collections::HashMap;
use std::sync::Arc;

use alloy_primitives::{Address, Bytes};
use tracing::debug;

use super::state::ChainState;
use crate::error::Result;
use crate::port::Contract;

/// Contracts addressable by calldata.
///
/// Calls to addresses without a registered contract are treated as ERC-20
/// calls and applied to the token ledger.
#[derive(Default, Clone)]
pub struct ContractRegistry {
    contracts: HashMap<Address, Arc<dyn Contract>>,
}

impl ContractRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a contract at its own address, replacing any previous one.
    pub fn register(&mut self, contract: Arc<dyn Contract>) {
        self.contracts.insert(contract.address(), contract);
    }

    #[must_use]
    pub fn get(&self, address: Address) -> Option<&Arc<dyn Contract>> {
        self.contracts.get(&address)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }

    /// Send `data` from `sender` to `target`.
    ///
    /// # Errors
    ///
    /// Returns the contract's error, or a ledger error for token calls.
    pub fn call(
        &self,
        state: &mut ChainState,
        sender: Address,
        target: Address,
        data: &[u8],
    ) -> Result<Bytes> {
        if let Some(contract) = self.contracts.get(&target) {
            debug!(%sender, %target, selector = %selector(data), "contract call");
            return contract.call(state, sender, data);
        }
        Ok(state.tokens.apply_call(target, sender, data)?)
    }
}

fn selector(data: &[u8]) -> String {
    data.get(..4)
        .map_or_else(|| "none".to_string(), alloy_primitives::hex::encode_prefixed)
}
