//! Indexed intermediate balances threaded through one router execution.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

/// A UTXO-style balance slot: `amount` of `token` attributed to `owner`.
///
/// Outputs are appended to an arena during one execution and referenced
/// by index only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    pub amount: U256,
    pub token: Address,
    pub owner: Address,
}

impl Output {
    /// Create a new output.
    #[must_use]
    pub const fn new(amount: U256, token: Address, owner: Address) -> Self {
        Self {
            amount,
            token,
            owner,
        }
    }

    /// A zero-value output that only keeps index continuity.
    #[must_use]
    pub const fn placeholder(token: Address, owner: Address) -> Self {
        Self::new(U256::ZERO, token, owner)
    }

    /// True when the output carries no amount.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.amount.is_zero()
    }
}

/// Whether an output's amount is held in router custody or only declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backing {
    /// Tokens are held by the router.
    Custody,
    /// Amount is declared; a flash loan (or nothing) backs it later.
    Virtual,
}
