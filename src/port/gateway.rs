//! Gateway port: one lending venue executing primitive operations.
//!
//! The router owns data flow between steps; a gateway only performs the
//! operation it is handed and reports the outputs it produced.

use alloy_primitives::{Address, Bytes};
use serde::Serialize;

use crate::chain::ChainState;
use crate::domain::{LendingOp, Output};
use crate::error::Result;

/// One call the user must submit before an atomic execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Authorization {
    pub target: Address,
    pub call_data: Bytes,
}

impl Authorization {
    #[must_use]
    pub fn new(target: Address, call_data: impl Into<Bytes>) -> Self {
        Self {
            target,
            call_data: call_data.into(),
        }
    }

    /// Split into parallel `(targets, calldata)` arrays.
    #[must_use]
    pub fn split(list: &[Self]) -> (Vec<Address>, Vec<Bytes>) {
        list.iter()
            .map(|auth| (auth.target, auth.call_data.clone()))
            .unzip()
    }
}

/// Arguments of one gateway invocation.
#[derive(Debug, Clone)]
pub struct GatewayCall<'a> {
    /// The router acting as custodian; tokens are pulled from and paid to it.
    pub router: Address,
    /// Operation with its amount already resolved against the input.
    pub op: &'a LendingOp,
    /// The referenced output, if the instruction reads one.
    pub input: Option<Output>,
}

/// Adapter for one lending venue.
///
/// Implementations must be thread-safe (`Send + Sync`).
pub trait Gateway: Send + Sync {
    /// Name the gateway is registered under.
    fn name(&self) -> &str;

    /// Account that pulls tokens from the router; the `Approve` instruction
    /// grants allowances to it.
    fn spender(&self) -> Address;

    /// Calls `user` must make before `operator` can run `ops` on their behalf
    /// (credit delegation, manager approval).
    ///
    /// # Errors
    ///
    /// Returns an error when the venue cannot be queried.
    fn authorize(
        &self,
        state: &ChainState,
        ops: &[LendingOp],
        user: Address,
        operator: Address,
    ) -> Result<Vec<Authorization>>;

    /// Perform the operation and return the outputs it produced.
    ///
    /// Token-consuming operations pull what they use from the router through
    /// the allowance granted to [`Gateway::spender`]; produced tokens are
    /// paid to the router.
    ///
    /// # Errors
    ///
    /// Returns an error if the venue rejects the operation.
    fn execute(&self, state: &mut ChainState, call: GatewayCall<'_>) -> Result<Vec<Output>>;
}
