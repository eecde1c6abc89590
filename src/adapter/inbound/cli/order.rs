use alloy_primitives::{Address, B256};

use crate::adapter::inbound::cli::output;
use crate::domain::order_hash;
use crate::error::Result;

/// Print `keccak256(abi.encode(user, salt))`.
pub fn execute_hash(user: Address, salt: B256) -> Result<()> {
    output::field("Order hash", order_hash(user, salt));
    Ok(())
}
