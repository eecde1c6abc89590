//! Hooks trampoline: the only caller order managers accept hook calls from.
//!
//! The settlement hands its pre- or post-settlement hooks to the trampoline,
//! which calls each target with its own address as sender. Every hook runs
//! in order; the first failing hook aborts the batch and, through the
//! settlement's snapshot, the whole settlement.

use std::sync::Arc;

use alloy_primitives::{Address, Bytes, B256};
use alloy_sol_types::SolCall;
use serde::Serialize;
use tracing::{debug, warn};

use crate::chain::abi::IOrderManager;
use crate::chain::{ChainState, ContractRegistry};
use crate::domain::HookMetadata;
use crate::error::{Error, OrderError, Result};

/// One call scheduled around a settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hook {
    pub target: Address,
    pub call_data: Bytes,
    pub gas_limit: u64,
}

impl Hook {
    #[must_use]
    pub fn new(target: Address, call_data: impl Into<Bytes>, gas_limit: u64) -> Self {
        Self {
            target,
            call_data: call_data.into(),
            gas_limit,
        }
    }

    /// Build a hook from its appData entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] when the gas limit is not a decimal integer.
    pub fn from_metadata(meta: &HookMetadata) -> Result<Self> {
        let gas_limit = meta
            .gas_limit
            .parse::<u64>()
            .map_err(|e| Error::Parse(format!("hook gas limit '{}': {e}", meta.gas_limit)))?;
        Ok(Self::new(meta.target, meta.call_data.clone(), gas_limit))
    }

    /// Call `executePreHookBySalt(user, salt)` on `manager`.
    #[must_use]
    pub fn pre_hook(manager: Address, user: Address, salt: B256, gas_limit: u64) -> Self {
        let call = IOrderManager::executePreHookBySaltCall { user, salt };
        Self::new(manager, call.abi_encode(), gas_limit)
    }

    /// Call `executePostHookBySalt(user, salt)` on `manager`.
    #[must_use]
    pub fn post_hook(manager: Address, user: Address, salt: B256, gas_limit: u64) -> Self {
        let call = IOrderManager::executePostHookBySaltCall { user, salt };
        Self::new(manager, call.abi_encode(), gas_limit)
    }
}

/// The trampoline contract.
pub struct HooksTrampoline {
    address: Address,
    settlement: Address,
    contracts: Arc<ContractRegistry>,
}

impl HooksTrampoline {
    #[must_use]
    pub fn new(address: Address, settlement: Address, contracts: Arc<ContractRegistry>) -> Self {
        Self {
            address,
            settlement,
            contracts,
        }
    }

    #[must_use]
    pub const fn address(&self) -> Address {
        self.address
    }

    #[must_use]
    pub const fn settlement(&self) -> Address {
        self.settlement
    }

    /// Run `hooks` in order on behalf of the settlement. Returns how many ran.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::Unauthorized`] when `sender` is not the
    /// settlement and [`Error::Hook`] for the first hook that fails. State
    /// changes of earlier hooks are left to the caller's snapshot.
    pub fn execute(
        &self,
        state: &mut ChainState,
        sender: Address,
        hooks: &[Hook],
    ) -> Result<usize> {
        if sender != self.settlement {
            return Err(OrderError::Unauthorized { caller: sender }.into());
        }

        for (index, hook) in hooks.iter().enumerate() {
            let target = hook.target;
            let result = if hook.gas_limit == 0 {
                Err(Error::Parse("hook gas limit is zero".into()))
            } else {
                self.contracts
                    .call(state, self.address, target, &hook.call_data)
            };
            if let Err(e) = result {
                warn!(hook = index, %target, error = %e, "Hook failed");
                return Err(Error::Hook {
                    index,
                    target,
                    source: Box::new(e),
                });
            }
            debug!(hook = index, %target, "Hook executed");
        }
        Ok(hooks.len())
    }
}
