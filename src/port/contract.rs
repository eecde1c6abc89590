//! Calldata-addressable contracts.

use alloy_primitives::{Address, Bytes};

use crate::chain::ChainState;
use crate::error::Result;

/// A component reachable through raw ABI calldata (hooks, ERC-1271 checks,
/// authorization payloads).
pub trait Contract: Send + Sync {
    fn address(&self) -> Address;

    /// Handle `data` sent by `sender`, returning ABI-encoded return data.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown selectors or when the call reverts.
    fn call(&self, state: &mut ChainState, sender: Address, data: &[u8]) -> Result<Bytes>;
}
